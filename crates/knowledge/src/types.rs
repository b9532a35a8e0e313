//! Course catalog type definitions.

use serde::{Deserialize, Serialize};

/// A lesson inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as written in the document (usually starts at 0 or 1)
    pub number: u32,

    /// Lesson title
    pub title: String,

    /// Link to the lesson page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A course and its ordered lessons. The title is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Find a lesson by number.
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }
}

/// A passage of course text ready to be embedded and indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Passage text
    pub content: String,

    /// Title of the owning course
    pub course_title: String,

    /// Lesson the passage belongs to, if any
    pub lesson_number: Option<u32>,

    /// Position of the passage within the course, starting at 0
    pub chunk_index: u32,
}

/// Totals from an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Courses added
    pub courses: usize,

    /// Passages added
    pub chunks: usize,

    /// Documents skipped because their course already existed
    pub skipped: usize,
}

/// Catalog summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
