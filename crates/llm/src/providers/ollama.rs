//! Ollama provider implementation.
//!
//! Talks to the `/api/chat` endpoint with tool support.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use std::time::Duration;

use lectern_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ChatRequest, ChatResponse, LlmClient, Usage};
use crate::types::{ContentBlock, MessageContent, Role, StopReason, ToolDefinition};

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    num_predict: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: Value,
}

/// Ollama chat response format.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> AppResult<Self> {
        Self::with_base_url("http://localhost:11434", Duration::from_secs(120))
    }

    /// Create a new Ollama client with a custom base URL and request timeout.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Convert a ChatRequest to Ollama format.
    ///
    /// Tool results become one `tool` message each, in block order.
    fn to_ollama_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
                tool_calls: Vec::new(),
            });
        }

        for message in &request.messages {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };

            let blocks = match &message.content {
                MessageContent::Text(text) => {
                    messages.push(OllamaMessage {
                        role: role.to_string(),
                        content: text.clone(),
                        tool_calls: Vec::new(),
                    });
                    continue;
                }
                MessageContent::Blocks(blocks) => blocks,
            };

            let mut text = String::new();
            let mut tool_calls = Vec::new();
            let mut tool_results = Vec::new();

            for block in blocks {
                match block {
                    ContentBlock::Text { text: t } => {
                        if !text.is_empty() {
                            text.push('\n');
                        }
                        text.push_str(t);
                    }
                    ContentBlock::ToolUse { name, input, .. } => tool_calls.push(OllamaToolCall {
                        function: OllamaFunctionCall {
                            name: name.clone(),
                            arguments: input.clone(),
                        },
                    }),
                    ContentBlock::ToolResult { content, .. } => tool_results.push(OllamaMessage {
                        role: "tool".to_string(),
                        content: content.clone(),
                        tool_calls: Vec::new(),
                    }),
                }
            }

            if !text.is_empty() || !tool_calls.is_empty() {
                messages.push(OllamaMessage {
                    role: role.to_string(),
                    content: text,
                    tool_calls,
                });
            }
            messages.extend(tool_results);
        }

        OllamaChatRequest {
            model: request.model.clone(),
            messages,
            tools: request.tools.iter().map(to_ollama_tool).collect(),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }

    /// Convert an Ollama reply to a ChatResponse.
    ///
    /// Ollama does not assign call ids, so ids are derived from the
    /// conversation length and the call position.
    fn convert_response(&self, response: OllamaChatResponse, turn: usize) -> ChatResponse {
        let mut content = Vec::new();
        if !response.message.content.is_empty() {
            content.push(ContentBlock::text(response.message.content));
        }

        let has_tool_calls = !response.message.tool_calls.is_empty();
        for (i, call) in response.message.tool_calls.into_iter().enumerate() {
            content.push(ContentBlock::ToolUse {
                id: format!("call_{}_{}", turn, i),
                name: call.function.name,
                input: call.function.arguments,
            });
        }

        let stop_reason = if has_tool_calls {
            StopReason::ToolUse
        } else {
            match response.done_reason.as_deref() {
                Some("length") => StopReason::MaxTokens,
                _ => StopReason::EndTurn,
            }
        };

        ChatResponse {
            content,
            stop_reason: Some(stop_reason),
            model: response.model,
            usage: Usage {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            },
        }
    }
}

fn to_ollama_tool(tool: &ToolDefinition) -> OllamaTool {
    OllamaTool {
        kind: "function",
        function: OllamaFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat request to Ollama"
        );

        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::debug!(
            tool_calls = ollama_response.message.tool_calls.len(),
            "Received reply from Ollama"
        );

        Ok(self.convert_response(ollama_response, request.messages.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use serde_json::json;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_conversion_with_tool_round() {
        let client = OllamaClient::new().unwrap();
        let request = ChatRequest::new(
            "llama3.2",
            vec![
                Message::user("What is MCP?"),
                Message::assistant_blocks(vec![ContentBlock::ToolUse {
                    id: "call_1_0".to_string(),
                    name: "search_course_content".to_string(),
                    input: json!({"query": "MCP"}),
                }]),
                Message::user_blocks(vec![ContentBlock::tool_result(
                    "call_1_0",
                    "[Introduction to MCP, Lesson 0]\nMCP is a protocol",
                    false,
                )]),
            ],
        )
        .with_system("sys")
        .with_temperature(0.0)
        .with_max_tokens(800)
        .with_tools(vec![ToolDefinition {
            name: "search_course_content".to_string(),
            description: "search".to_string(),
            input_schema: json!({"type": "object"}),
        }]);

        let converted = client.to_ollama_request(&request);
        let roles: Vec<&str> = converted.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);
        assert_eq!(
            converted.messages[2].tool_calls[0].function.name,
            "search_course_content"
        );
        assert!(converted.messages[3].content.contains("MCP is a protocol"));
        assert_eq!(converted.tools[0].function.name, "search_course_content");
        assert_eq!(converted.options.num_predict, 800);
        assert!(!converted.stream);
    }

    #[test]
    fn test_response_with_tool_calls() {
        let client = OllamaClient::new().unwrap();
        let raw: OllamaChatResponse = serde_json::from_value(json!({
            "model": "llama3.2",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "get_course_outline", "arguments": {"course_name": "MCP"}}}
                ]
            },
            "done": true,
            "done_reason": "stop"
        }))
        .unwrap();

        let converted = client.convert_response(raw, 3);
        assert_eq!(converted.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(converted.content.len(), 1);
        match &converted.content[0] {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "call_3_0");
                assert_eq!(name, "get_course_outline");
                assert_eq!(input["course_name"], "MCP");
            }
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[test]
    fn test_response_plain_text() {
        let client = OllamaClient::new().unwrap();
        let raw: OllamaChatResponse = serde_json::from_value(json!({
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "Hello"},
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 3
        }))
        .unwrap();

        let converted = client.convert_response(raw, 1);
        assert_eq!(converted.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(converted.first_text(), Some("Hello"));
        assert_eq!(converted.usage.input_tokens, 12);
    }
}
