//! Command handlers for the Lectern CLI.

pub mod ask;
pub mod chat;
pub mod clean;
pub mod courses;
pub mod ingest;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use clean::CleanCommand;
pub use courses::CoursesCommand;
pub use ingest::IngestCommand;
pub use serve::ServeCommand;

use lectern_core::{AppConfig, AppResult};
use lectern_knowledge::{ChunkSettings, CourseStore, SourceCitation};

/// Open the workspace course index without a model client.
pub(crate) fn open_store(config: &AppConfig) -> AppResult<CourseStore> {
    CourseStore::open(
        &config.index_path(),
        config.retrieval.embedding_dimensions,
        config.retrieval.max_results,
    )
}

pub(crate) fn chunk_settings(config: &AppConfig) -> ChunkSettings {
    ChunkSettings {
        size: config.retrieval.chunk_size,
        overlap: config.retrieval.chunk_overlap,
    }
}

/// Render citations as a numbered list.
pub(crate) fn format_sources(sources: &[SourceCitation]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| match &s.link {
            Some(link) => format!("  [{}] {} ({})", i + 1, s.text, link),
            None => format!("  [{}] {}", i + 1, s.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
