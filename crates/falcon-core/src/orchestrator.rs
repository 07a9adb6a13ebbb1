//! Chat orchestration loop.
//!
//! One invocation takes the caller-supplied message history, prepends the
//! fixed campus system prompt, and drives a bounded loop against the
//! completion gateway: send the working sequence plus the tool declarations,
//! execute any tool calls the model issues, feed the results back, and repeat
//! until the model answers directly or the iteration cap is hit.
//!
//! The working sequence lives only for the duration of one call to
//! [`Orchestrator::handle`]; persistence of the conversation is the caller's
//! concern. Gateway failures are never retried here.

use std::sync::Arc;

use crate::core_types::{Message, ToolCall};
use crate::errors::OrchestratorError;
use crate::llm::CompletionGateway;
use crate::prompt::SYSTEM_PROMPT;
use crate::tools::ToolRegistry;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum gateway round-trips per invocation.
    pub max_iterations: usize,
    pub system_prompt: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

pub struct Orchestrator {
    gateway: Arc<dyn CompletionGateway>,
    tools: ToolRegistry,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn CompletionGateway>, tools: ToolRegistry) -> Self {
        Self::with_config(gateway, tools, OrchestratorConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn CompletionGateway>,
        tools: ToolRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            tools,
            config,
        }
    }

    /// Run one chat turn to completion. `conversation_id` is opaque and used
    /// only for log correlation.
    pub async fn handle(
        &self,
        history: Vec<Message>,
        conversation_id: &str,
    ) -> Result<String, OrchestratorError> {
        log::info!("Processing chat request for conversation: {}", conversation_id);

        let mut working = Vec::with_capacity(history.len() + 1);
        working.push(Message::system(self.config.system_prompt.clone()));
        working.extend(history);

        let tool_metadata = self.tools.list_tools();

        for iteration in 1..=self.config.max_iterations {
            log::info!(
                "Conversation {}: gateway round-trip {}/{}",
                conversation_id,
                iteration,
                self.config.max_iterations
            );

            let response = self
                .gateway
                .complete(working.clone(), Some(tool_metadata.clone()))
                .await?;

            if let Some(usage) = &response.usage {
                log::debug!(
                    "Conversation {}: {} prompt / {} completion tokens",
                    conversation_id,
                    usage.prompt_tokens,
                    usage.completion_tokens
                );
            }

            working.push(Message::assistant(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            if response.wants_tool_calls() {
                if let Some(tool_calls) = &response.tool_calls {
                    log::info!(
                        "Conversation {}: model requested {} tool call(s)",
                        conversation_id,
                        tool_calls.len()
                    );
                    for tool_call in tool_calls {
                        let result = self.execute_tool_call(tool_call, conversation_id).await?;
                        working.push(result);
                    }
                }
                continue;
            }

            log::info!("Conversation {}: final response generated", conversation_id);
            return response.content.ok_or_else(|| {
                OrchestratorError::ParsingError(
                    "Final assistant message had no content".to_string(),
                )
            });
        }

        log::warn!(
            "Conversation {}: no final answer within {} iterations",
            conversation_id,
            self.config.max_iterations
        );
        Err(OrchestratorError::IterationLimitExceeded(
            self.config.max_iterations,
        ))
    }

    async fn execute_tool_call(
        &self,
        tool_call: &ToolCall,
        conversation_id: &str,
    ) -> Result<Message, OrchestratorError> {
        let tool = self
            .tools
            .get_tool(&tool_call.name)
            .ok_or_else(|| OrchestratorError::UnknownTool(tool_call.name.clone()))?;

        log::info!(
            "Conversation {}: executing tool '{}' with args {:?}",
            conversation_id,
            tool_call.name,
            tool_call.arguments
        );

        let content = tool.execute(tool_call.arguments.clone()).await?;

        Ok(Message::tool(
            tool_call.id.clone(),
            tool_call.name.clone(),
            content,
        ))
    }
}
