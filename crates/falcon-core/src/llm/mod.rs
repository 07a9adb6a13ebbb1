//! Completion gateway abstractions.
//!
//! Defines the trait the orchestrator speaks to a hosted chat-completions
//! endpoint through, plus the tool-declaration metadata sent alongside the
//! message sequence. The concrete OpenAI-compatible HTTP client lives in
//! [`gateway`].

pub use crate::core_types::{GatewayResponse, Message};
use crate::errors::OrchestratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod gateway;

pub use gateway::{create_gateway, HttpCompletionGateway};

/// Declaration of a tool the model may invoke, in the shape the gateway's
/// function-calling API expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<GatewayResponse, OrchestratorError>;
}
