//! Test doubles for the model and the search capability.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use lectern_core::{AppError, AppResult};
use lectern_llm::{ChatRequest, ChatResponse, ContentBlock, LlmClient, StopReason, Usage};
use serde_json::Value;

use crate::search::{no_course_message, SearchCapability, SearchQuery, SearchResults};
use crate::types::{Course, Lesson};

pub fn mcp_course() -> Course {
    let lesson = |number: u32, title: &str| Lesson {
        number,
        title: title.to_string(),
        link: Some(format!("https://example.com/mcp/lesson{}", number)),
    };

    Course {
        title: "Introduction to MCP".to_string(),
        link: Some("https://example.com/mcp".to_string()),
        instructor: Some("Alex Smith".to_string()),
        lessons: vec![
            lesson(0, "Getting Started"),
            lesson(1, "Core Concepts"),
            lesson(2, "Advanced Topics"),
        ],
    }
}

/// In-memory search capability with canned results.
#[derive(Default)]
pub struct StubSearch {
    courses: Vec<Course>,
    results: Option<SearchResults>,
    fault: Option<String>,
    missing_records: bool,
    queries: Mutex<Vec<SearchQuery>>,
}

impl StubSearch {
    pub fn with_course(course: Course) -> Self {
        Self {
            courses: vec![course],
            ..Self::default()
        }
    }

    /// Return `results` from every search regardless of filters.
    pub fn returning(mut self, results: SearchResults) -> Self {
        self.results = Some(results);
        self
    }

    /// Fail every call with a knowledge error.
    pub fn failing(message: &str) -> Self {
        Self {
            fault: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Resolve names but return no course records.
    pub fn without_records(mut self) -> Self {
        self.missing_records = true;
        self
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn check(&self) -> AppResult<()> {
        match &self.fault {
            Some(message) => Err(AppError::Knowledge(message.clone())),
            None => Ok(()),
        }
    }

    fn find(&self, name: &str) -> Option<&Course> {
        let needle = name.to_lowercase();
        self.courses
            .iter()
            .find(|c| c.title.to_lowercase().contains(&needle))
    }

    fn exact(&self, title: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.title == title)
    }
}

#[async_trait]
impl SearchCapability for StubSearch {
    async fn search(&self, query: &SearchQuery) -> AppResult<SearchResults> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());

        if let Some(results) = &self.results {
            return Ok(results.clone());
        }

        match &query.course_name {
            Some(name) if self.find(name).is_none() => {
                Ok(SearchResults::Error(no_course_message(name)))
            }
            _ => Ok(SearchResults::empty()),
        }
    }

    async fn resolve_course_name(&self, name: &str) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self.find(name).map(|c| c.title.clone()))
    }

    async fn course(&self, title: &str) -> AppResult<Option<Course>> {
        self.check()?;
        if self.missing_records {
            return Ok(None);
        }
        Ok(self.exact(title).cloned())
    }

    async fn lesson_link(
        &self,
        course_title: &str,
        lesson_number: u32,
    ) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self
            .exact(course_title)
            .and_then(|c| c.lesson(lesson_number))
            .and_then(|l| l.link.clone()))
    }

    async fn course_link(&self, course_title: &str) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self.exact(course_title).and_then(|c| c.link.clone()))
    }
}

/// Model client that replays queued responses and records every request.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("connection refused".to_string()))
    }
}

fn response(content: Vec<ContentBlock>, stop_reason: StopReason) -> ChatResponse {
    ChatResponse {
        content,
        stop_reason: Some(stop_reason),
        model: "scripted-model".to_string(),
        usage: Usage::default(),
    }
}

/// A terminal reply with one text segment.
pub fn text_reply(text: &str) -> ChatResponse {
    response(vec![ContentBlock::text(text)], StopReason::EndTurn)
}

/// A terminal reply with no content at all.
pub fn empty_reply() -> ChatResponse {
    response(Vec::new(), StopReason::EndTurn)
}

/// A tool-use reply, optionally preceded by a text segment.
pub fn tool_reply(text: Option<&str>, calls: &[(&str, &str, Value)]) -> ChatResponse {
    let mut content = Vec::new();
    if let Some(text) = text {
        content.push(ContentBlock::text(text));
    }
    for (id, name, input) in calls {
        content.push(ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        });
    }
    response(content, StopReason::ToolUse)
}

/// Tool results carried by a request message, as `(id, content, is_error)`.
pub fn tool_results(request: &ChatRequest, message_index: usize) -> Vec<(String, String, bool)> {
    request.messages[message_index]
        .blocks()
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Some((tool_use_id, content, is_error)),
            _ => None,
        })
        .collect()
}
