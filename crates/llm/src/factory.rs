//! Model provider factory.
//!
//! Resolves a provider name from configuration into a ready client.

use std::sync::Arc;
use std::time::Duration;

use crate::client::LlmClient;
use crate::providers::{ClaudeClient, OllamaClient};

/// Create a model client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("claude"/"anthropic" or "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by Claude
/// * `timeout` - Transport timeout for a single call
///
/// # Errors
/// Returns an error if the provider is unknown, a required key is missing,
/// or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LlmClient>, String> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url, timeout).map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
        "claude" | "anthropic" => {
            let Some(key) = api_key else {
                return Err("Claude provider requires API key".to_string());
            };
            let base_url = endpoint.unwrap_or("https://api.anthropic.com");
            let client =
                ClaudeClient::with_base_url(base_url, key, timeout).map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None, TIMEOUT);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_claude_client() {
        let client = create_client("anthropic", None, Some("key"), TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "claude");
    }

    #[test]
    fn test_claude_requires_api_key() {
        match create_client("claude", None, None, TIMEOUT) {
            Err(err) => assert!(err.contains("Claude provider requires API key")),
            Ok(_) => panic!("Expected error for Claude without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, TIMEOUT) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
