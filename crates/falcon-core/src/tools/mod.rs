//! Tool system for capabilities the model may invoke mid-conversation
//!
//! Tools are registered by name and dispatched when the gateway reports a
//! tool-call finish reason. Dispatch is explicit: a request for a name with
//! no registered handler is an error, never a silent skip, so a
//! misconfigured tool set surfaces immediately instead of confusing the
//! model with missing results.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::OrchestratorError;
use crate::llm::ToolMetadata;

// Core Tool trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;
    async fn execute(&self, arguments: Value) -> Result<String, OrchestratorError>;
}

// Tool registry for managing multiple tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        self.tools.values().map(|tool| tool.metadata()).collect()
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Tool factory for creating the standard tool set
pub struct ToolFactory;

impl ToolFactory {
    pub fn create_web_search(provider: Arc<dyn SearchProvider>) -> Arc<dyn Tool> {
        Arc::new(web_search::WebSearchTool::new(provider))
    }

    /// The registry every chat invocation gets: the campus web-search tool
    /// backed by the stub provider.
    pub fn create_default_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Self::create_web_search(Arc::new(
            web_search::StubSearchProvider,
        )));
        registry
    }
}

pub mod web_search;

pub use web_search::{SearchProvider, StubSearchProvider, WebSearchTool};
