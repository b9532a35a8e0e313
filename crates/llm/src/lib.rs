//! Model integration crate for Lectern.
//!
//! A provider-agnostic, tool-aware chat abstraction. Requests carry a system
//! prompt, the conversation and the tools the model may call; replies are
//! classified into a terminal answer or a list of tool calls.
//!
//! # Providers
//! - **Claude**: Anthropic Messages API (default)
//! - **Ollama**: Local runtime via `/api/chat`
//!
//! # Example
//! ```no_run
//! use lectern_llm::{ChatRequest, LlmClient, Message, ModelReply, providers::ClaudeClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeClient::new("sk-ant-...")?;
//! let request = ChatRequest::new("claude-sonnet-4-20250514", vec![Message::user("Hello")]);
//! let response = client.chat(&request).await?;
//! if let ModelReply::Terminal(Some(text)) = response.reply() {
//!     println!("{}", text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatRequest, ChatResponse, LlmClient, Usage};
pub use factory::create_client;
pub use providers::{ClaudeClient, OllamaClient};
pub use types::{
    ContentBlock, Message, MessageContent, ModelReply, Role, StopReason, ToolDefinition,
    ToolInvocation,
};
