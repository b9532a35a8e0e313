//! Course knowledge base and tool-mediated answering.
//!
//! Course documents are parsed into a catalog and embedded passages stored in
//! SQLite. Questions are answered by a model that can call a content search
//! tool and a course outline tool for up to two rounds before it must answer.

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod parser;
pub mod rag;
pub mod search;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use ingest::ChunkSettings;
pub use rag::{
    GenerationOrchestrator, OrchestrationResult, QueryOutcome, RagSystem, SessionManager,
    SourceCitation, ToolRegistry,
};
pub use search::{SearchCapability, SearchQuery, SearchResults};
pub use store::CourseStore;
pub use types::{Course, CourseAnalytics, CourseChunk, IngestStats, Lesson};
