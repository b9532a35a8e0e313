//! Search capability consumed by the course tools.
//!
//! The SQLite [`CourseStore`](crate::store::CourseStore) is the production
//! implementation; tests substitute in-memory fakes.

use lectern_core::AppResult;
use serde::{Deserialize, Serialize};

use crate::types::Course;

/// A filtered content search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query
    pub text: String,

    /// Course name, possibly partial ("MCP" for "Introduction to MCP")
    pub course_name: Option<String>,

    /// Restrict to one lesson
    pub lesson_number: Option<u32>,

    /// Override the store's default result limit
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn in_course(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = Some(course_name.into());
        self
    }

    pub fn in_lesson(mut self, lesson_number: u32) -> Self {
        self.lesson_number = Some(lesson_number);
        self
    }
}

/// Where a passage came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitMetadata {
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
    /// Lesson link copied from the catalog, when known
    pub lesson_link: Option<String>,
}

/// One retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: String,
    pub metadata: HitMetadata,
    /// Cosine distance; lower is closer
    pub distance: f32,
}

/// Outcome of a search: ranked passages, or a message explaining why the
/// search could not run (e.g. an unknown course name).
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults {
    Hits(Vec<SearchHit>),
    Error(String),
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::Hits(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Hits(hits) if hits.is_empty())
    }
}

/// Message returned when a course name cannot be resolved.
pub fn no_course_message(name: &str) -> String {
    format!("No course found matching '{}'", name)
}

/// Retrieval contract required by the course tools.
///
/// `Err` is reserved for faults (storage unavailable, corrupt rows).
/// Unresolvable course names are reported through [`SearchResults::Error`]
/// or `Ok(None)`.
#[async_trait::async_trait]
pub trait SearchCapability: Send + Sync {
    /// Ranked passages for a query, honoring optional filters.
    async fn search(&self, query: &SearchQuery) -> AppResult<SearchResults>;

    /// Resolve a partial or fuzzy course name to a stored title.
    async fn resolve_course_name(&self, name: &str) -> AppResult<Option<String>>;

    /// Full course record by exact title.
    async fn course(&self, title: &str) -> AppResult<Option<Course>>;

    /// Link for one lesson of a course.
    async fn lesson_link(
        &self,
        course_title: &str,
        lesson_number: u32,
    ) -> AppResult<Option<String>>;

    /// Link for a course.
    async fn course_link(&self, course_title: &str) -> AppResult<Option<String>>;
}
