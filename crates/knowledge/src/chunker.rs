//! Course text chunking with configurable size and overlap.

use lectern_core::{AppError, AppResult};
use text_splitter::{Characters, ChunkConfig, TextSplitter};

use crate::parser::CourseDocument;
use crate::types::CourseChunk;

/// Split a parsed course document into indexed passages.
///
/// Lessons are chunked independently so no passage spans two lessons. The
/// first passage of each lesson is prefixed with `Lesson N content: `.
/// Chunk indices run across the whole course.
pub fn chunk_course(
    doc: &CourseDocument,
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<CourseChunk>> {
    let splitter = build_splitter(chunk_size, overlap)?;
    let title = &doc.course.title;
    let mut chunks = Vec::new();

    if let Some(body) = &doc.body {
        for text in split(&splitter, body) {
            chunks.push(CourseChunk {
                content: text,
                course_title: title.clone(),
                lesson_number: None,
                chunk_index: chunks.len() as u32,
            });
        }
    }

    for (number, body) in &doc.lessons {
        for (i, text) in split(&splitter, body).into_iter().enumerate() {
            let content = if i == 0 {
                format!("Lesson {} content: {}", number, text)
            } else {
                text
            };
            chunks.push(CourseChunk {
                content,
                course_title: title.clone(),
                lesson_number: Some(*number),
                chunk_index: chunks.len() as u32,
            });
        }
    }

    tracing::debug!(
        course = %title,
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "Chunked course document"
    );

    Ok(chunks)
}

fn build_splitter(chunk_size: usize, overlap: usize) -> AppResult<TextSplitter<Characters>> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Knowledge(format!("Invalid chunk configuration: {}", e)))?;
    Ok(TextSplitter::new(config))
}

fn split(splitter: &TextSplitter<Characters>, text: &str) -> Vec<String> {
    splitter
        .chunks(text)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
