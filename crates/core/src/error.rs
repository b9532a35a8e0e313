//! Error types for Lectern.
//!
//! One enum covers every failure category in the workspace: configuration,
//! I/O, model calls, the course store, tool execution and sessions.

use thiserror::Error;

/// Unified error type for Lectern.
///
/// Library functions return `Result<T, AppError>` and never panic on
/// recoverable conditions.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model provider errors (transport, HTTP status, malformed replies)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Course store, ingestion and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// A tool failed while executing
    #[error("Tool error: {0}")]
    Tool(String),

    /// Session bookkeeping errors
    #[error("Session error: {0}")]
    Session(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            AppError::Tool("boom".into()).to_string(),
            "Tool error: boom"
        );
        assert_eq!(AppError::Other("plain".into()).to_string(), "plain");
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Serialization(_)));
    }
}
