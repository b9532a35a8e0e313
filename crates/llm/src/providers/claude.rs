//! Anthropic Messages API provider.
//!
//! API: https://docs.anthropic.com/en/api/messages

use std::time::Duration;

use lectern_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::json;

use crate::client::{ChatRequest, ChatResponse, LlmClient};
use crate::types::{Message, ToolDefinition};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Messages API request body.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

/// Anthropic Claude client.
pub struct ClaudeClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    /// Create a client against the public Anthropic endpoint.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_ENDPOINT, api_key, Duration::from_secs(60))
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn to_messages_request<'a>(&self, request: &'a ChatRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: &request.messages,
            system: request.system.as_deref(),
            temperature: request.temperature,
            tools: (!request.tools.is_empty()).then_some(request.tools.as_slice()),
            tool_choice: (!request.tools.is_empty()).then(|| json!({"type": "auto"})),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ClaudeClient {
    fn provider_name(&self) -> &str {
        "claude"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending messages request to Anthropic"
        );

        let body = self.to_messages_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Anthropic: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Anthropic response: {}", e)))?;

        tracing::debug!(
            stop_reason = ?chat_response.stop_reason,
            input_tokens = chat_response.usage.input_tokens,
            output_tokens = chat_response.usage.output_tokens,
            "Received reply from Anthropic"
        );

        Ok(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claude_client_creation() {
        let client = ClaudeClient::new("key").unwrap();
        assert_eq!(client.provider_name(), "claude");
        assert_eq!(client.base_url, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            ClaudeClient::with_base_url("http://proxy/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://proxy");
    }

    #[test]
    fn test_request_body_with_tools() {
        let client = ClaudeClient::new("key").unwrap();
        let request = ChatRequest::new("claude-sonnet-4-20250514", vec![Message::user("hi")])
            .with_system("be brief")
            .with_temperature(0.0)
            .with_max_tokens(800)
            .with_tools(vec![ToolDefinition {
                name: "get_course_outline".to_string(),
                description: "outline".to_string(),
                input_schema: json!({"type": "object"}),
            }]);

        let body = serde_json::to_value(client.to_messages_request(&request)).unwrap();
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["tool_choice"]["type"], "auto");
        assert_eq!(body["tools"][0]["name"], "get_course_outline");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_request_body_without_tools() {
        let client = ClaudeClient::new("key").unwrap();
        let request = ChatRequest::new("m", vec![Message::user("hi")]);
        let body = serde_json::to_value(client.to_messages_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("system").is_none());
    }
}
