//! Error types for failure handling across the orchestration pipeline
//!
//! This module provides a unified error hierarchy covering every failure mode
//! of one chat invocation, from configuration resolution through the gateway
//! round-trips and tool execution. Errors are categorized by source so the
//! HTTP boundary can map each kind to the status code the chat client
//! expects. Nothing here is retried internally; retry policy belongs to the
//! caller.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Gateway returned 429. The field keeps the upstream body for logs; the
    /// display string is what the chat client sees.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited(String),
    /// Gateway returned 402.
    #[error("AI credits depleted. Please add credits to continue.")]
    QuotaExhausted(String),
    #[error("Completion gateway request failed with status {status}: {body}")]
    GatewayError { status: u16, body: String },
    #[error("Completion gateway unreachable: {0}")]
    GatewayUnreachable(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("Malformed arguments for tool '{tool_name}': {message}")]
    MalformedToolArguments { tool_name: String, message: String },
    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    ToolError { tool_name: String, message: String },
    #[error("Maximum tool iterations ({0}) reached without a final answer")]
    IterationLimitExceeded(usize),
}

impl OrchestratorError {
    /// HTTP status the chat client receives for this failure. Rate-limit and
    /// quota conditions pass through their upstream codes; everything else,
    /// iteration exhaustion and malformed input included, is a 500.
    pub fn status_code(&self) -> u16 {
        match self {
            OrchestratorError::RateLimited(_) => 429,
            OrchestratorError::QuotaExhausted(_) => 402,
            _ => 500,
        }
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        OrchestratorError::GatewayUnreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(OrchestratorError::RateLimited("slow down".into()).status_code(), 429);
        assert_eq!(OrchestratorError::QuotaExhausted("no credits".into()).status_code(), 402);
        assert_eq!(
            OrchestratorError::GatewayError { status: 503, body: "unavailable".into() }.status_code(),
            500
        );
        assert_eq!(OrchestratorError::IterationLimitExceeded(5).status_code(), 500);
        assert_eq!(OrchestratorError::ConfigError("missing key".into()).status_code(), 500);
        assert_eq!(
            OrchestratorError::UnknownTool("telepathy".into()).status_code(),
            500
        );
    }
}
