//! Tool-mediated question answering over the course catalog.
//!
//! [`RagSystem`] wires the [`CourseStore`](crate::store::CourseStore), the
//! course tools and the [`GenerationOrchestrator`] together. The orchestrator
//! lets the model call tools for up to [`MAX_TOOL_ROUNDS`] rounds before it
//! must answer.

pub mod generator;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod system;
pub mod tools;
pub mod types;

pub use generator::{GenerationOrchestrator, MAX_TOOL_ROUNDS, NO_RESPONSE_PLACEHOLDER};
pub use registry::ToolRegistry;
pub use session::SessionManager;
pub use system::RagSystem;
pub use tools::{CourseOutlineTool, CourseSearchTool, Tool, OUTLINE_TOOL_NAME, SEARCH_TOOL_NAME};
pub use types::{OrchestrationResult, QueryOutcome, SourceCitation, ToolOutput};
