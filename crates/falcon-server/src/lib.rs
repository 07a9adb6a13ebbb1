//! HTTP surface for the Falcon chat orchestrator.
//!
//! Exposes a single `/chat` endpoint the web client posts a conversation's
//! history to, plus a health probe. All responses, success and failure alike,
//! carry permissive cross-origin headers so the browser client can call the
//! service directly; preflight requests are answered with an empty success
//! response. Failures map onto the status codes the chat client expects:
//! 429 for rate limiting, 402 for quota exhaustion, 500 for everything else.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, options, post};
use axum::{middleware, Router};
use falcon_core::config::GatewaySettings;
use falcon_core::llm::create_gateway;
use falcon_core::orchestrator::{Orchestrator, OrchestratorConfig};
use falcon_core::tools::ToolFactory;
use falcon_core::{Message, OrchestratorError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Seam between the router and the orchestration pipeline, so the HTTP layer
/// can be exercised against a double in tests.
#[async_trait]
pub trait ChatHandler: Send + Sync {
    async fn handle_chat(
        &self,
        messages: Vec<Message>,
        conversation_id: &str,
    ) -> Result<String, OrchestratorError>;
}

/// Production handler. The gateway credential is resolved from the process
/// environment on every invocation, mirroring the per-request configuration
/// model of the hosting platform; absence fails before any network call.
#[derive(Clone)]
pub struct FalconChatHandler {
    settings: GatewaySettings,
    orchestrator_config: OrchestratorConfig,
}

impl FalconChatHandler {
    pub fn new(settings: GatewaySettings, orchestrator_config: OrchestratorConfig) -> Self {
        Self {
            settings,
            orchestrator_config,
        }
    }
}

#[async_trait]
impl ChatHandler for FalconChatHandler {
    async fn handle_chat(
        &self,
        messages: Vec<Message>,
        conversation_id: &str,
    ) -> Result<String, OrchestratorError> {
        let gateway = create_gateway(&self.settings)?;
        let orchestrator = Orchestrator::with_config(
            gateway,
            ToolFactory::create_default_registry(),
            self.orchestrator_config.clone(),
        );
        orchestrator.handle(messages, conversation_id).await
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Configuration for the chat server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Enable request logging
    pub enable_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".parse().expect("static addr"),
            enable_cors: true,
            cors_origins: None,
            enable_logging: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}

#[derive(Clone)]
struct AppState<T: ChatHandler + Clone> {
    handler: T,
}

/// Handler for the /chat POST endpoint. The body is parsed manually so that
/// malformed input produces the same `{error}` shape as every other failure.
async fn chat_handler<T: ChatHandler + Clone>(
    State(app_state): State<AppState<T>>,
    body: Bytes,
) -> std::result::Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    let request: ChatRequest = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("Malformed chat request: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Invalid request body: {}", e) })),
        )
    })?;

    log::info!(
        "Chat request for conversation {} ({} messages)",
        request.conversation_id,
        request.messages.len()
    );

    match app_state
        .handler
        .handle_chat(request.messages, &request.conversation_id)
        .await
    {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e) => {
            log::error!("Chat error for conversation {}: {}", request.conversation_id, e);
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err((status, Json(json!({ "error": e.to_string() }))))
        }
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// The chat HTTP server.
pub struct ChatServer<T: ChatHandler + Clone> {
    handler: T,
    config: ServerConfig,
}

impl<T: ChatHandler + Clone + Send + Sync + 'static> ChatServer<T> {
    pub fn new(handler: T) -> Self {
        Self {
            handler,
            config: ServerConfig::default(),
        }
    }

    pub fn with_config(handler: T, config: ServerConfig) -> Self {
        Self { handler, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            handler: self.handler.clone(),
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/chat", post(chat_handler::<T>))
            // CORS preflight answers with an empty success response
            .route("/chat", options(|| async { StatusCode::OK }))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    log::info!("Request {} {} {}", request_id, method, uri);

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    let duration = start.elapsed();

                    log::info!("Response {} completed in {:?}", request_id, duration);

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = if let Some(ref origins) = self.config.cors_origins {
                let origins: std::result::Result<Vec<_>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => CorsLayer::permissive(),
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    /// Start the server and listen for connections.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.build_router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        log::info!("Chat server starting on {}", self.config.bind_addr);
        log::info!("Health check: http://{}/health", self.config.bind_addr);
        log::info!("Chat endpoint: http://{}/chat", self.config.bind_addr);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the server with graceful shutdown support.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        log::info!(
            "Chat server starting on {} with graceful shutdown",
            self.config.bind_addr
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        log::info!("Chat server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use falcon_core::core_types::{GatewayResponse, ToolCall};
    use falcon_core::llm::{CompletionGateway, ToolMetadata};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    #[derive(Clone)]
    struct MockHandler {
        result: Result<String, OrchestratorError>,
    }

    #[async_trait]
    impl ChatHandler for MockHandler {
        async fn handle_chat(
            &self,
            _messages: Vec<Message>,
            _conversation_id: &str,
        ) -> Result<String, OrchestratorError> {
            self.result.clone()
        }
    }

    fn router_with(result: Result<String, OrchestratorError>) -> Router {
        let config = ServerConfig::default().with_logging(false);
        ChatServer::with_config(MockHandler { result }, config).build_router()
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .header("origin", "http://localhost:5173")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const VALID_BODY: &str =
        r#"{"messages":[{"role":"user","content":"hi"}],"conversationId":"conv-1"}"#;

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = router_with(Ok("unused".to_string()))
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chat_success() {
        let response = router_with(Ok("Hello!".to_string()))
            .oneshot(chat_request(VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
        let body = body_json(response).await;
        assert_eq!(body["response"], "Hello!");
    }

    #[tokio::test]
    async fn test_rate_limited_maps_to_429() {
        let response = router_with(Err(OrchestratorError::RateLimited("upstream".to_string())))
            .oneshot(chat_request(VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn test_quota_exhausted_maps_to_402() {
        let response = router_with(Err(OrchestratorError::QuotaExhausted("upstream".to_string())))
            .oneshot(chat_request(VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "AI credits depleted. Please add credits to continue."
        );
    }

    #[tokio::test]
    async fn test_iteration_limit_maps_to_500() {
        let response = router_with(Err(OrchestratorError::IterationLimitExceeded(5)))
            .oneshot(chat_request(VALID_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("iterations"));
    }

    #[tokio::test]
    async fn test_missing_credential_maps_to_500() {
        let response = router_with(Err(OrchestratorError::ConfigError(
            "No gateway API key found".to_string(),
        )))
        .oneshot(chat_request(VALID_BODY))
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_500() {
        let response = router_with(Ok("unused".to_string()))
            .oneshot(chat_request(r#"{"messages":"not an array"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid request body"));
    }

    #[tokio::test]
    async fn test_invalid_json_syntax_maps_to_500() {
        let response = router_with(Ok("unused".to_string()))
            .oneshot(chat_request("this is not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid request body"));
    }

    #[tokio::test]
    async fn test_preflight_returns_empty_success() {
        let response = router_with(Ok("unused".to_string()))
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/chat")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(bytes.is_empty());
    }

    /// Full-path test: router -> orchestrator -> scripted gateway.
    #[tokio::test]
    async fn test_chat_through_orchestrator() {
        struct SingleAnswerGateway;

        #[async_trait]
        impl CompletionGateway for SingleAnswerGateway {
            async fn complete(
                &self,
                messages: Vec<Message>,
                _tools: Option<Vec<ToolMetadata>>,
            ) -> Result<GatewayResponse, OrchestratorError> {
                // System prompt plus the single user turn from the request
                assert_eq!(messages.len(), 2);
                Ok(GatewayResponse {
                    content: Some("Registration opens March 1.".to_string()),
                    tool_calls: None::<Vec<ToolCall>>,
                    finish_reason: Some("stop".to_string()),
                    usage: None,
                })
            }
        }

        #[derive(Clone)]
        struct OrchestratingHandler;

        #[async_trait]
        impl ChatHandler for OrchestratingHandler {
            async fn handle_chat(
                &self,
                messages: Vec<Message>,
                conversation_id: &str,
            ) -> Result<String, OrchestratorError> {
                let orchestrator = Orchestrator::new(
                    Arc::new(SingleAnswerGateway),
                    ToolFactory::create_default_registry(),
                );
                orchestrator.handle(messages, conversation_id).await
            }
        }

        let config = ServerConfig::default().with_logging(false);
        let router = ChatServer::with_config(OrchestratingHandler, config).build_router();
        let response = router.oneshot(chat_request(VALID_BODY)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Registration opens March 1.");
    }
}
