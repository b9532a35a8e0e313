//! Course tools exposed to the model.
//!
//! Each tool describes itself with a JSON-schema [`ToolDefinition`] and runs
//! against a shared [`SearchCapability`]. Tools keep no per-query state:
//! citations travel back in the [`ToolOutput`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lectern_core::{AppError, AppResult};
use lectern_llm::ToolDefinition;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::rag::types::{SourceCitation, ToolOutput};
use crate::search::{
    no_course_message, SearchCapability, SearchHit, SearchQuery, SearchResults,
};
use crate::types::Course;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// A named, schema-described capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema descriptor advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool.
    ///
    /// Returns `Err` only for faults (bad input, storage failure). Those
    /// end the tool loop for the current query.
    async fn execute(&self, input: &Value) -> AppResult<ToolOutput>;
}

fn parse_input<T: DeserializeOwned>(tool: &str, input: &Value) -> AppResult<T> {
    serde_json::from_value(input.clone())
        .map_err(|e| AppError::Tool(format!("Invalid input for {}: {}", tool, e)))
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Semantic search over course passages with optional course/lesson filters.
pub struct CourseSearchTool {
    search: Arc<dyn SearchCapability>,
}

impl CourseSearchTool {
    pub fn new(search: Arc<dyn SearchCapability>) -> Self {
        Self { search }
    }

    async fn format_hits(&self, hits: &[SearchHit]) -> AppResult<ToolOutput> {
        let mut passages = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());
        let mut course_links: HashMap<String, Option<String>> = HashMap::new();

        for hit in hits {
            let meta = &hit.metadata;
            let header = match meta.lesson_number {
                Some(n) => format!("{}, Lesson {}", meta.course_title, n),
                None => meta.course_title.clone(),
            };

            let mut link = meta.lesson_link.clone();
            if link.is_none() {
                if let Some(n) = meta.lesson_number {
                    link = self.search.lesson_link(&meta.course_title, n).await?;
                }
            }
            if link.is_none() {
                if !course_links.contains_key(&meta.course_title) {
                    let course_link = self.search.course_link(&meta.course_title).await?;
                    course_links.insert(meta.course_title.clone(), course_link);
                }
                link = course_links.get(&meta.course_title).cloned().flatten();
            }

            passages.push(format!("[{}]\n{}", header, hit.document));
            sources.push(SourceCitation::new(header, link));
        }

        Ok(ToolOutput::with_sources(passages.join("\n\n"), sources))
    }
}

fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: concat!(
                "Search course materials with smart course name matching ",
                "and lesson filtering"
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
        let input: SearchInput = parse_input(SEARCH_TOOL_NAME, input)?;
        // Models often fill optional strings with "".
        let course_name = input.course_name.filter(|s| !s.trim().is_empty());

        let mut query = SearchQuery::new(&input.query);
        query.course_name = course_name.clone();
        query.lesson_number = input.lesson_number;

        match self.search.search(&query).await? {
            SearchResults::Error(message) => Ok(ToolOutput::text(message)),
            SearchResults::Hits(hits) if hits.is_empty() => Ok(ToolOutput::text(
                no_results_message(course_name.as_deref(), input.lesson_number),
            )),
            SearchResults::Hits(hits) => self.format_hits(&hits).await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutlineInput {
    course_name: String,
}

/// Course structure lookup: title, link, instructor and lesson list.
pub struct CourseOutlineTool {
    search: Arc<dyn SearchCapability>,
}

impl CourseOutlineTool {
    pub fn new(search: Arc<dyn SearchCapability>) -> Self {
        Self { search }
    }
}

fn format_outline(course: &Course) -> String {
    let mut out = format!(
        "Course Title: {}\nCourse Link: {}\nCourse Instructor: {}\n\nLessons ({} total):",
        course.title,
        course.link.as_deref().unwrap_or("Not available"),
        course.instructor.as_deref().unwrap_or("Not specified"),
        course.lessons.len()
    );

    for lesson in &course.lessons {
        out.push_str(&format!("\nLesson {}: {}", lesson.number, lesson.title));
        if let Some(link) = &lesson.link {
            out.push_str(&format!(" ({})", link));
        }
    }

    out
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: concat!(
                "Get the complete outline of a course: title, link, instructor ",
                "and every lesson with its number and title"
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput> {
        let input: OutlineInput = parse_input(OUTLINE_TOOL_NAME, input)?;

        let Some(title) = self.search.resolve_course_name(&input.course_name).await? else {
            return Ok(ToolOutput::text(no_course_message(&input.course_name)));
        };

        // A resolved title without a catalog record means the store is inconsistent.
        match self.search.course(&title).await? {
            Some(course) => Ok(ToolOutput::text(format_outline(&course))),
            None => Ok(ToolOutput::failure(format!(
                "Course '{}' is listed but its outline could not be loaded",
                title
            ))),
        }
    }
}
