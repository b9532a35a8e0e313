//! Course document parsing.
//!
//! A course document is plain text (or Markdown) with a small header:
//!
//! ```text
//! Course Title: Introduction to MCP
//! Course Link: https://example.com/mcp
//! Course Instructor: Alex Smith
//!
//! Lesson 0: Getting Started
//! Lesson Link: https://example.com/mcp/lesson0
//! ...lesson text...
//! ```
//!
//! Everything after a `Lesson N: Title` marker (and its optional link line)
//! up to the next marker is that lesson's body.

use lectern_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

use crate::types::{Course, Lesson};

/// Extensions accepted as course documents.
pub const COURSE_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// A parsed document: the course record plus raw lesson bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDocument {
    pub course: Course,

    /// Lesson number and body, in document order.
    pub lessons: Vec<(u32, String)>,

    /// Body text when the document has no lesson markers.
    pub body: Option<String>,
}

/// Whether a path looks like a course document.
pub fn is_course_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| COURSE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read and parse a course document from disk.
///
/// A missing `Course Title:` header falls back to the file stem.
pub fn parse_course_file(path: &Path) -> AppResult<CourseDocument> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled course".to_string());

    parse_course_text(&raw, &fallback)
}

/// Parse course document text.
pub fn parse_course_text(raw: &str, fallback_title: &str) -> AppResult<CourseDocument> {
    let mut title = None;
    let mut link = None;
    let mut instructor = None;

    let lines: Vec<&str> = raw.lines().collect();
    let mut idx = 0;

    // Header block: known keys in any order, blank lines allowed.
    while idx < lines.len() {
        let line = lines[idx].trim();
        if let Some(v) = header_value(line, "Course Title:") {
            title = Some(v);
        } else if let Some(v) = header_value(line, "Course Link:") {
            link = Some(v);
        } else if let Some(v) = header_value(line, "Course Instructor:") {
            instructor = Some(v);
        } else if !line.is_empty() && !is_blank_header(line) {
            break;
        }
        idx += 1;
    }

    let title = title.unwrap_or_else(|| fallback_title.to_string());
    if title.is_empty() {
        return Err(AppError::Knowledge(
            "Course document has an empty title".to_string(),
        ));
    }

    let mut lessons = Vec::new();
    let mut bodies: Vec<(u32, String)> = Vec::new();
    let mut preamble = Vec::new();
    let mut current: Option<(u32, Vec<&str>)> = None;

    while idx < lines.len() {
        let line = lines[idx];
        if let Some((number, lesson_title)) = lesson_marker(line) {
            if let Some((n, body)) = current.take() {
                bodies.push((n, body.join("\n").trim().to_string()));
            }

            let mut lesson_link = None;
            if let Some(next) = lines.get(idx + 1) {
                if let Some(v) = header_value(next.trim(), "Lesson Link:") {
                    lesson_link = Some(v);
                    idx += 1;
                }
            }

            lessons.push(Lesson {
                number,
                title: lesson_title,
                link: lesson_link,
            });
            current = Some((number, Vec::new()));
        } else {
            match current.as_mut() {
                Some((_, body)) => body.push(line),
                None => preamble.push(line),
            }
        }
        idx += 1;
    }

    if let Some((n, body)) = current.take() {
        bodies.push((n, body.join("\n").trim().to_string()));
    }

    let preamble = preamble.join("\n").trim().to_string();
    let body = (lessons.is_empty() && !preamble.is_empty()).then_some(preamble);

    Ok(CourseDocument {
        course: Course {
            title,
            link,
            instructor,
            lessons,
        },
        lessons: bodies,
        body,
    })
}

fn header_value(line: &str, key: &str) -> Option<String> {
    line.strip_prefix(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_blank_header(line: &str) -> bool {
    ["Course Title:", "Course Link:", "Course Instructor:"].contains(&line)
}

/// Match `Lesson <n>: <title>`.
fn lesson_marker(line: &str) -> Option<(u32, String)> {
    let rest = line.trim().strip_prefix("Lesson ")?;
    let (number, title) = rest.split_once(':')?;
    let number = number.trim().parse::<u32>().ok()?;
    Some((number, title.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "Course Title: Introduction to MCP
Course Link: https://example.com/mcp
Course Instructor: Alex Smith

Lesson 0: Getting Started
Lesson Link: https://example.com/mcp/lesson0
MCP is a protocol for connecting models to tools.

Lesson 1: Core Concepts
Lesson Link: https://example.com/mcp/lesson1
Servers expose resources and tools.

Lesson 2: Advanced Topics
Sampling and roots.
";

    #[test]
    fn test_parse_header_and_lessons() {
        let doc = parse_course_text(SAMPLE, "fallback").unwrap();
        assert_eq!(doc.course.title, "Introduction to MCP");
        assert_eq!(doc.course.link.as_deref(), Some("https://example.com/mcp"));
        assert_eq!(doc.course.instructor.as_deref(), Some("Alex Smith"));
        assert_eq!(doc.course.lessons.len(), 3);
        assert_eq!(doc.course.lessons[1].title, "Core Concepts");
        assert_eq!(
            doc.course.lessons[0].link.as_deref(),
            Some("https://example.com/mcp/lesson0")
        );
        assert_eq!(doc.course.lessons[2].link, None);
        assert_eq!(doc.lessons[0].0, 0);
        assert_eq!(
            doc.lessons[0].1,
            "MCP is a protocol for connecting models to tools."
        );
        assert_eq!(doc.lessons[2].1, "Sampling and roots.");
        assert!(doc.body.is_none());
    }

    #[test]
    fn test_missing_title_uses_fallback() {
        let doc = parse_course_text("Just some notes\nabout things.", "notes").unwrap();
        assert_eq!(doc.course.title, "notes");
        assert!(doc.course.lessons.is_empty());
        assert_eq!(doc.body.as_deref(), Some("Just some notes\nabout things."));
    }

    #[test]
    fn test_lesson_marker_requires_number() {
        assert_eq!(lesson_marker("Lesson 3: Wrap-up"), Some((3, "Wrap-up".to_string())));
        assert_eq!(lesson_marker("Lesson plan: none"), None);
        assert_eq!(lesson_marker("In Lesson 3: we"), None);
    }

    #[test]
    fn test_parse_course_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp.txt");
        std::fs::write(&path, SAMPLE).unwrap();

        assert!(is_course_file(&path));
        assert!(!is_course_file(&dir.path().join("slides.pdf")));

        let doc = parse_course_file(&path).unwrap();
        assert_eq!(doc.course.title, "Introduction to MCP");
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_course_file(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }
}
