//! Core library for the Falcon campus chat assistant.
//!
//! This crate provides the orchestration layer that sits between a chat
//! client and a hosted chat-completions gateway. A single invocation takes a
//! conversation's message history, prepends the fixed campus system prompt,
//! and drives a bounded request loop against the gateway, executing any tool
//! calls the model issues along the way.
//!
//! # Architecture Overview
//!
//! - **Orchestration**: bounded tool-call loop and final-answer extraction
//! - **Gateway integration**: OpenAI-compatible chat-completions client
//! - **Tool ecosystem**: registry of named tools the model may invoke
//! - **Search capability**: injectable `SearchProvider` behind the
//!   `web_search` tool

pub mod config;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod tools;

pub use config::GatewaySettings;
pub use core_types::{GatewayResponse, Message, Role, ToolCall};
pub use errors::OrchestratorError;
pub use llm::{CompletionGateway, ToolMetadata};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use tools::{SearchProvider, Tool, ToolRegistry};
