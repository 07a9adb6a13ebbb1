//! Campus web-search tool.
//!
//! The model requests searches through this tool when it needs current
//! university facts instead of its training data. Retrieval itself is an
//! injected [`SearchProvider`] capability: the orchestration loop only knows
//! the trait, so a real search backend can replace the stub without touching
//! the loop.

use crate::errors::OrchestratorError;
use crate::llm::ToolMetadata;
use crate::tools::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, OrchestratorError>;
}

/// Placeholder provider that performs no retrieval. It synthesizes an
/// informational string referencing the query and directs the model to fall
/// back on its own knowledge; it cannot fail.
pub struct StubSearchProvider;

#[async_trait]
impl SearchProvider for StubSearchProvider {
    async fn search(&self, query: &str) -> Result<String, OrchestratorError> {
        Ok(format!(
            "Searching BGSU websites for: \"{}\".\n\n\
             Note: In production, this would perform an actual web search of BGSU websites. \
             For now, please provide the most relevant information you have about BGSU, and \
             remind students to verify current information on official BGSU websites at bgsu.edu.",
            query
        ))
    }
}

pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: "web_search".to_string(),
            description: "Search the web for current information, particularly from BGSU websites. \
                          Use this when you need specific, current information about BGSU courses, \
                          policies, events, deadlines, or campus resources."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query. Include 'site:bgsu.edu' to search BGSU websites specifically."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, OrchestratorError> {
        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OrchestratorError::MalformedToolArguments {
                tool_name: "web_search".to_string(),
                message: "Missing or invalid 'query' parameter".to_string(),
            })?;

        log::info!("Executing web search with query: {}", query);

        self.provider.search(query).await
    }
}
