//! OpenAI-compatible chat-completions client.
//!
//! Speaks the `{model, messages, tools}` request shape and parses the
//! `{choices: [{message, finish_reason}]}` response shape. Rate-limit (429)
//! and quota (402) statuses are mapped to their own error kinds so the HTTP
//! boundary can pass them through to the chat client unchanged; every other
//! non-success status becomes a gateway error carrying the status and body
//! for diagnostics.

use crate::config::GatewaySettings;
use crate::core_types::{GatewayResponse, Message, Role, ToolCall, Usage};
use crate::errors::OrchestratorError;
use crate::llm::{CompletionGateway, ToolMetadata};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpCompletionGateway {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl HttpCompletionGateway {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    fn build_request_body(&self, messages: &[Message], tools: Option<&[ToolMetadata]>) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.format_messages(messages),
        });

        if let Some(temp) = self.temperature {
            body["temperature"] = temp.into();
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                let formatted_tools: Vec<Value> = tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.input_schema
                            }
                        })
                    })
                    .collect();
                body["tools"] = formatted_tools.into();
                body["tool_choice"] = "auto".into();
            }
        }

        body
    }

    fn format_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| {
                let mut message = json!({
                    "role": self.format_role(&msg.role),
                    "content": msg.content
                });

                // Tool results must echo their correlation id and tool name
                if let Role::Tool = msg.role {
                    if let Some(tool_call_id) = &msg.tool_call_id {
                        message["tool_call_id"] = json!(tool_call_id);
                    }
                    if let Some(name) = &msg.name {
                        message["name"] = json!(name);
                    }
                }

                // Assistant messages echo the tool calls they issued, with
                // arguments re-encoded as a JSON string per the wire format
                if let Role::Assistant = msg.role {
                    if let Some(tool_calls) = &msg.tool_calls {
                        if !tool_calls.is_empty() {
                            let formatted_tool_calls: Vec<Value> = tool_calls
                                .iter()
                                .map(|tc| {
                                    json!({
                                        "id": tc.id.clone().unwrap_or_else(|| {
                                            format!("call_{}", uuid::Uuid::new_v4().simple())
                                        }),
                                        "type": "function",
                                        "function": {
                                            "name": tc.name,
                                            "arguments": tc.arguments.to_string()
                                        }
                                    })
                                })
                                .collect();
                            message["tool_calls"] = json!(formatted_tool_calls);
                        }
                    }
                }

                message
            })
            .collect()
    }

    fn format_role(&self, role: &Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn parse_response(&self, response: Value) -> Result<GatewayResponse, OrchestratorError> {
        let choices = response["choices"]
            .as_array()
            .ok_or_else(|| OrchestratorError::ParsingError("No choices in response".to_string()))?;

        if choices.is_empty() {
            return Err(OrchestratorError::ParsingError(
                "Empty choices array".to_string(),
            ));
        }

        let choice = &choices[0];
        let message = &choice["message"];

        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"].as_str().map(|s| s.to_string());

        let tool_calls = if let Some(calls) = message["tool_calls"].as_array() {
            let mut parsed_calls = Vec::new();
            for call in calls {
                if let (Some(id), Some(function)) =
                    (call["id"].as_str(), call["function"].as_object())
                {
                    if let (Some(name), Some(arguments_str)) =
                        (function["name"].as_str(), function["arguments"].as_str())
                    {
                        let arguments: Value =
                            serde_json::from_str(arguments_str).map_err(|e| {
                                OrchestratorError::MalformedToolArguments {
                                    tool_name: name.to_string(),
                                    message: format!("arguments are not valid JSON: {}", e),
                                }
                            })?;

                        parsed_calls.push(ToolCall {
                            id: Some(id.to_string()),
                            name: name.to_string(),
                            arguments,
                        });
                    }
                }
            }
            if parsed_calls.is_empty() {
                None
            } else {
                Some(parsed_calls)
            }
        } else {
            None
        };

        if content.is_none() && tool_calls.is_none() {
            return Err(OrchestratorError::ParsingError(
                "Response has neither content nor tool calls".to_string(),
            ));
        }

        let usage = serde_json::from_value::<Usage>(response["usage"].clone()).ok();

        Ok(GatewayResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl CompletionGateway for HttpCompletionGateway {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Option<Vec<ToolMetadata>>,
    ) -> Result<GatewayResponse, OrchestratorError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&messages, tools.as_deref());

        log::debug!("Gateway request to {} ({} messages)", url, messages.len());

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        log::debug!("Gateway response ({}): {}", status, response_text);

        if !status.is_success() {
            log::error!("Gateway error: {} {}", status, response_text);
            return Err(match status.as_u16() {
                429 => OrchestratorError::RateLimited(response_text),
                402 => OrchestratorError::QuotaExhausted(response_text),
                code => OrchestratorError::GatewayError {
                    status: code,
                    body: response_text,
                },
            });
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| OrchestratorError::ParsingError(format!("Invalid JSON response: {}", e)))?;

        self.parse_response(response_json)
    }
}

/// Build a gateway client from settings, resolving the credential from the
/// process environment. Fails before any network call when no key is found.
pub fn create_gateway(
    settings: &GatewaySettings,
) -> Result<Arc<dyn CompletionGateway>, OrchestratorError> {
    let api_key = settings.resolve_api_key()?;

    let mut gateway = HttpCompletionGateway::new(api_key, settings.model.clone())
        .with_api_base(settings.api_base.clone())
        .with_timeout(Duration::from_secs(settings.timeout_secs));

    if let Some(temperature) = settings.temperature {
        gateway = gateway.with_temperature(temperature);
    }
    if let Some(max_tokens) = settings.max_tokens {
        gateway = gateway.with_max_tokens(max_tokens);
    }

    Ok(Arc::new(gateway))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gateway() -> HttpCompletionGateway {
        HttpCompletionGateway::new("test-key".to_string(), DEFAULT_MODEL.to_string())
    }

    #[test]
    fn test_gateway_builder() {
        let gateway = test_gateway()
            .with_api_base("https://gateway.example.edu/v1/".to_string())
            .with_temperature(0.7)
            .with_max_tokens(1000);

        assert_eq!(gateway.api_base, "https://gateway.example.edu/v1");
        assert_eq!(gateway.temperature, Some(0.7));
        assert_eq!(gateway.max_tokens, Some(1000));
    }

    #[test]
    fn test_message_formatting() {
        let gateway = test_gateway();
        let messages = vec![
            Message::system("You are a campus assistant."),
            Message::user("Hello!"),
        ];

        let formatted = gateway.format_messages(&messages);
        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted[0]["role"], "system");
        assert_eq!(formatted[0]["content"], "You are a campus assistant.");
        assert_eq!(formatted[1]["role"], "user");
        assert_eq!(formatted[1]["content"], "Hello!");
    }

    #[test]
    fn test_tool_message_formatting_carries_correlation() {
        let gateway = test_gateway();
        let messages = vec![Message::tool(
            Some("call_abc".to_string()),
            "web_search",
            "results here",
        )];

        let formatted = gateway.format_messages(&messages);
        assert_eq!(formatted[0]["role"], "tool");
        assert_eq!(formatted[0]["tool_call_id"], "call_abc");
        assert_eq!(formatted[0]["name"], "web_search");
    }

    #[test]
    fn test_assistant_tool_calls_encode_arguments_as_string() {
        let gateway = test_gateway();
        let messages = vec![Message::assistant(
            "",
            Some(vec![ToolCall {
                id: Some("call_abc".to_string()),
                name: "web_search".to_string(),
                arguments: json!({"query": "library hours"}),
            }]),
        )];

        let formatted = gateway.format_messages(&messages);
        let call = &formatted[0]["tool_calls"][0];
        assert_eq!(call["id"], "call_abc");
        assert_eq!(call["function"]["name"], "web_search");
        let arguments: Value =
            serde_json::from_str(call["function"]["arguments"].as_str().unwrap()).unwrap();
        assert_eq!(arguments["query"], "library hours");
    }

    #[test]
    fn test_request_body_declares_tools() {
        let gateway = test_gateway();
        let tools = vec![ToolMetadata {
            name: "web_search".to_string(),
            description: "Search the web".to_string(),
            input_schema: json!({"type": "object"}),
        }];

        let body = gateway.build_request_body(&[Message::user("hi")], Some(&tools));
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "web_search");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn test_parse_final_response() {
        let gateway = test_gateway();
        let response = gateway
            .parse_response(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "Hello!"},
                    "finish_reason": "stop"
                }]
            }))
            .unwrap();

        assert_eq!(response.content.as_deref(), Some("Hello!"));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert!(response.tool_calls.is_none());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let gateway = test_gateway();
        let response = gateway
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "web_search",
                                "arguments": "{\"query\":\"site:bgsu.edu registration dates\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }))
            .unwrap();

        assert!(response.wants_tool_calls());
        let calls = response.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(calls[0].name, "web_search");
        assert_eq!(calls[0].arguments["query"], "site:bgsu.edu registration dates");
    }

    #[test]
    fn test_parse_rejects_malformed_tool_arguments() {
        let gateway = test_gateway();
        let result = gateway.parse_response(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "web_search", "arguments": "{not json"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }));

        assert!(matches!(
            result,
            Err(OrchestratorError::MalformedToolArguments { ref tool_name, .. })
                if tool_name == "web_search"
        ));
    }

    #[test]
    fn test_parse_rejects_empty_response() {
        let gateway = test_gateway();
        let result = gateway.parse_response(json!({
            "choices": [{"message": {"role": "assistant"}, "finish_reason": "stop"}]
        }));
        assert!(matches!(result, Err(OrchestratorError::ParsingError(_))));
    }
}
