//! Multi-round tool-mediated answer generation.
//!
//! The model is called with the conversation and every registered tool. While
//! it keeps asking for tools, the requested tools run and their results are fed
//! back, for at most [`MAX_TOOL_ROUNDS`] rounds. After the last permitted round
//! one more call is made so the model can answer from what it gathered.

use std::sync::Arc;

use lectern_core::AppResult;
use lectern_llm::{
    ChatRequest, ChatResponse, ContentBlock, LlmClient, Message, ModelReply, ToolDefinition,
};

use crate::rag::prompt::build_system_prompt;
use crate::rag::registry::ToolRegistry;
use crate::rag::types::OrchestrationResult;

/// Maximum sequential tool rounds per query.
pub const MAX_TOOL_ROUNDS: usize = 2;

/// Answer returned when the final reply carries no text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "Error: No response generated";

pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Drives the model/tool conversation for one query at a time.
pub struct GenerationOrchestrator {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl GenerationOrchestrator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Answer `query`, letting the model call tools from `registry`.
    ///
    /// Without a registry the first reply is final. A tool fault or an
    /// error-flagged tool result stops the loop; the round in which it
    /// happened is not counted, but the requested tool names are.
    ///
    /// Model call failures propagate as `Err`.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        registry: Option<&ToolRegistry>,
    ) -> AppResult<OrchestrationResult> {
        let system = build_system_prompt(history);
        let tools = registry.map(ToolRegistry::definitions).unwrap_or_default();

        let mut messages = vec![Message::user(query)];
        let mut rounds_used = 0;
        let mut tools_used = Vec::new();

        let mut latest = self.call(&system, &messages, &tools).await?;

        loop {
            let invocations = match latest.reply() {
                ModelReply::Terminal(_) => break,
                ModelReply::ToolCalls(calls) if calls.is_empty() => {
                    tracing::debug!("Tool-use stop without tool blocks");
                    break;
                }
                ModelReply::ToolCalls(calls) => calls,
            };

            let Some(registry) = registry else {
                tracing::debug!("Model requested tools but no registry is available");
                break;
            };

            tracing::debug!(
                round = rounds_used + 1,
                tools = invocations.len(),
                "Executing tool round"
            );

            messages.push(Message::assistant_blocks(latest.content.clone()));

            let mut results = Vec::with_capacity(invocations.len());
            let mut halted = false;

            for invocation in &invocations {
                tools_used.push(invocation.name.clone());

                match registry.execute(&invocation.name, &invocation.input).await {
                    Ok(output) => {
                        if output.is_error {
                            tracing::warn!(tool = %invocation.name, "Tool reported an error");
                            halted = true;
                        }
                        results.push(ContentBlock::tool_result(
                            &invocation.id,
                            output.content,
                            output.is_error,
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(
                            tool = %invocation.name,
                            error = %e,
                            "Tool execution failed"
                        );
                        halted = true;
                        results.push(ContentBlock::tool_result(
                            &invocation.id,
                            format!("Error executing tool: {}", e),
                            true,
                        ));
                    }
                }
            }

            messages.push(Message::user_blocks(results));

            if halted {
                break;
            }

            rounds_used += 1;

            if rounds_used >= MAX_TOOL_ROUNDS {
                tracing::debug!("Tool round limit reached, requesting final answer");
                latest = self.call(&system, &messages, &tools).await?;
                break;
            }

            latest = self.call(&system, &messages, &tools).await?;
        }

        let answer = latest
            .first_text()
            .map(str::to_string)
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string());

        tracing::info!(
            rounds = rounds_used,
            tools = ?tools_used,
            "Generation complete"
        );

        Ok(OrchestrationResult {
            answer,
            rounds_used,
            tools_used,
        })
    }

    async fn call(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> AppResult<ChatResponse> {
        let request = ChatRequest::new(&self.model, messages.to_vec())
            .with_system(system)
            .with_tools(tools.to_vec())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        self.client.chat(&request).await
    }
}
