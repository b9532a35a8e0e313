//! Answering types shared by the tools, the orchestrator and the API layer.

use serde::{Deserialize, Serialize};

/// A pointer back to a passage used to answer a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Display text, e.g. "Introduction to MCP, Lesson 0"
    pub text: String,

    /// Lesson or course link, when known
    pub link: Option<String>,
}

impl SourceCitation {
    pub fn new(text: impl Into<String>, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            link,
        }
    }
}

/// What a tool run produced.
///
/// `is_error` marks a structured failure: the result is flagged to the model
/// and no further tool rounds run. Recoverable conditions (unknown course,
/// no matches) are plain output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<SourceCitation>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_sources(content: impl Into<String>, sources: Vec<SourceCitation>) -> Self {
        Self {
            content: content.into(),
            sources,
            is_error: false,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
            is_error: true,
        }
    }
}

/// Result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Final answer text
    pub answer: String,

    /// Tool rounds fully completed
    pub rounds_used: usize,

    /// Tool names requested, in request order across rounds
    pub tools_used: Vec<String>,
}

/// Answer returned to callers of [`RagSystem::query`](super::RagSystem::query).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub rounds_used: usize,
    pub tools_used: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_output_constructors() {
        assert!(!ToolOutput::text("ok").is_error);
        assert!(ToolOutput::failure("bad").is_error);

        let out = ToolOutput::with_sources("x", vec![SourceCitation::new("A", None)]);
        assert_eq!(out.sources.len(), 1);
        assert!(!out.is_error);
    }

    #[test]
    fn test_citation_serialization() {
        let citation = SourceCitation::new(
            "Introduction to MCP, Lesson 0",
            Some("https://example.com/mcp/lesson0".to_string()),
        );
        let json = serde_json::to_value(&citation).unwrap();
        assert_eq!(json["text"], "Introduction to MCP, Lesson 0");
        assert_eq!(json["link"], "https://example.com/mcp/lesson0");
    }
}
