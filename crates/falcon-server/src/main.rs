//! Server binary for the Falcon campus chat assistant.
//!
//! Hosts the chat orchestrator behind an HTTP interface the single-page web
//! client talks to. The gateway credential is read from the environment; all
//! other knobs are CLI flags.

use anyhow::Result;
use clap::Parser;
use falcon_core::config::{GatewaySettings, DEFAULT_API_KEY_ENV};
use falcon_core::llm::gateway::{DEFAULT_API_BASE, DEFAULT_MODEL};
use falcon_core::orchestrator::OrchestratorConfig;
use falcon_server::{shutdown_signal, ChatServer, FalconChatHandler, ServerConfig};
use log::LevelFilter;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Falcon server - campus chat orchestrator")]
struct Cli {
    #[clap(long, default_value = "127.0.0.1:3001")]
    bind_addr: String,

    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, default_value = DEFAULT_MODEL, help = "Model identifier sent to the completion gateway")]
    model: String,

    #[clap(long, default_value = DEFAULT_API_BASE, help = "Base URL of the OpenAI-compatible completion gateway")]
    api_base: String,

    #[clap(long, default_value = DEFAULT_API_KEY_ENV, help = "Environment variable holding the gateway API key")]
    api_key_env: String,

    #[clap(long, default_value_t = 5, help = "Maximum gateway round-trips per chat turn")]
    max_iterations: usize,

    #[clap(long, help = "Restrict CORS to these origins (default: any origin)")]
    cors_origin: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let bind_socket_addr: SocketAddr = cli
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cli.bind_addr, e))?;

    let settings = GatewaySettings {
        api_key_env: cli.api_key_env.clone(),
        api_base: cli.api_base,
        model: cli.model,
        ..Default::default()
    };

    if std::env::var(&cli.api_key_env).is_err() {
        log::warn!(
            "{} is not set; chat requests will fail until it is provided",
            cli.api_key_env
        );
    }

    let orchestrator_config = OrchestratorConfig {
        max_iterations: cli.max_iterations,
        ..Default::default()
    };
    let handler = FalconChatHandler::new(settings, orchestrator_config);

    let mut server_config = ServerConfig::default()
        .with_bind_addr(bind_socket_addr)
        .with_logging(true);
    if !cli.cors_origin.is_empty() {
        server_config = server_config.with_cors_origins(cli.cors_origin);
    }

    log::info!("Starting Falcon server on {}...", bind_socket_addr);

    let server = ChatServer::with_config(handler, server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e);
    }

    log::info!("Falcon server shut down gracefully.");
    Ok(())
}
