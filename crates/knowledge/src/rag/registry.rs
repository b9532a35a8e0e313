//! Tool registry.
//!
//! Tools are kept in registration order; registering a name twice replaces
//! the earlier tool in place. Each entry owns a citation slot that is
//! overwritten whenever its tool returns citations, read by
//! [`ToolRegistry::collect_sources`] and emptied by
//! [`ToolRegistry::reset_sources`].

use std::sync::{Arc, Mutex, MutexGuard};

use lectern_core::AppResult;
use lectern_llm::ToolDefinition;
use serde_json::Value;

use crate::rag::tools::Tool;
use crate::rag::types::{SourceCitation, ToolOutput};

struct Entry {
    name: String,
    tool: Arc<dyn Tool>,
    sources: Mutex<Vec<SourceCitation>>,
}

impl Entry {
    fn sources(&self) -> MutexGuard<'_, Vec<SourceCitation>> {
        self.sources.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its declared name. Last registration wins.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool instance.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        let entry = Entry {
            name: name.clone(),
            tool,
            sources: Mutex::new(Vec::new()),
        };

        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => {
                tracing::debug!(tool = %name, "Replacing registered tool");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Schema descriptors of every tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.tool.definition()).collect()
    }

    /// Registered tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run a tool by name.
    ///
    /// An unknown name yields a "not found" output rather than an error.
    /// Tool faults propagate unchanged.
    pub async fn execute(&self, name: &str, input: &Value) -> AppResult<ToolOutput> {
        let Some(entry) = self.entries.iter().find(|e| e.name == name) else {
            tracing::warn!(tool = %name, "Model requested an unregistered tool");
            return Ok(ToolOutput::text(format!("Tool '{}' not found", name)));
        };

        let output = entry.tool.execute(input).await?;

        if !output.sources.is_empty() {
            *entry.sources() = output.sources.clone();
        }

        Ok(output)
    }

    /// Citations of every tool, concatenated in registration order.
    pub fn collect_sources(&self) -> Vec<SourceCitation> {
        self.entries
            .iter()
            .flat_map(|e| e.sources().clone())
            .collect()
    }

    /// Empty every tool's citation slot.
    pub fn reset_sources(&self) {
        for entry in &self.entries {
            entry.sources().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lectern_core::AppError;
    use serde_json::json;

    struct Echo {
        name: &'static str,
        label: &'static str,
    }

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: self.label.to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
            if input.get("fail").is_some() {
                return Err(AppError::Tool("echo failed".to_string()));
            }
            let sources = input["cite"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str())
                        .map(|t| SourceCitation::new(t, None))
                        .collect()
                })
                .unwrap_or_default();
            Ok(ToolOutput::with_sources(self.label, sources))
        }
    }

    fn echo(name: &'static str, label: &'static str) -> Echo {
        Echo { name, label }
    }

    #[test]
    fn test_definitions_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("b_tool", "B"));
        registry.register(echo("a_tool", "A"));

        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b_tool", "a_tool"]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_last_registration_wins_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("first", "old"));
        registry.register(echo("second", "2"));
        registry.register(echo("first", "new"));

        assert_eq!(registry.tool_names(), vec!["first", "second"]);
        let out = registry.execute("first", &json!({})).await.unwrap();
        assert_eq!(out.content, "new");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_a_fault() {
        let registry = ToolRegistry::new();
        let out = registry.execute("missing_tool", &json!({})).await.unwrap();
        assert!(out.content.contains("not found"));
        assert!(!out.is_error);
    }

    #[tokio::test]
    async fn test_fault_propagates() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("t", "x"));
        let err = registry.execute("t", &json!({"fail": true})).await.unwrap_err();
        assert!(matches!(err, AppError::Tool(_)));
    }

    #[tokio::test]
    async fn test_collect_and_reset_sources() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("one", "1"));
        registry.register(echo("two", "2"));

        registry
            .execute("two", &json!({"cite": ["B1"]}))
            .await
            .unwrap();
        registry
            .execute("one", &json!({"cite": ["A1", "A2"]}))
            .await
            .unwrap();

        let texts: Vec<String> = registry.collect_sources().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["A1", "A2", "B1"]);

        registry.reset_sources();
        assert!(registry.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_new_citations_replace_previous() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("one", "1"));

        registry.execute("one", &json!({"cite": ["old"]})).await.unwrap();
        registry.execute("one", &json!({"cite": ["new"]})).await.unwrap();

        let sources = registry.collect_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "new");

        // A run without citations leaves the slot untouched.
        registry.execute("one", &json!({})).await.unwrap();
        assert_eq!(registry.collect_sources().len(), 1);
    }
}
