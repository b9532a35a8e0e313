//! Model client abstraction and request/response types.

use lectern_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::types::{ContentBlock, Message, ModelReply, StopReason, ToolDefinition, ToolInvocation};

/// One model call: system instructions, conversation and available tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "claude-sonnet-4-20250514", "llama3.2")
    pub model: String,

    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Conversation so far, oldest first
    pub messages: Vec<Message>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Create a request with required fields and a 1024-token output cap.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages,
            tools: Vec::new(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Advertise tools to the model.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Model reply as returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// First text segment of the reply, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Tool calls carried by the reply, in emission order.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Classify the reply by its stop reason.
    ///
    /// Only a `tool_use` stop reason yields `ToolCalls`; tool blocks attached to
    /// any other stop reason are ignored.
    pub fn reply(&self) -> ModelReply {
        match self.stop_reason {
            Some(StopReason::ToolUse) => ModelReply::ToolCalls(self.tool_invocations()),
            _ => ModelReply::Terminal(self.first_text().map(str::to_string)),
        }
    }
}

/// Trait for model providers.
///
/// Abstracts the underlying provider (Anthropic, Ollama) behind a single
/// tool-aware chat call.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "claude", "ollama").
    fn provider_name(&self) -> &str;

    /// Perform one non-streaming chat call.
    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}
