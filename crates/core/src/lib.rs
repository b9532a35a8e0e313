//! Lectern core library.
//!
//! Foundational pieces shared by every other crate in the workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, LogFormat};
pub use error::{AppError, AppResult};
