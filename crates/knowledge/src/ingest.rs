//! Course document ingestion into a [`CourseStore`].

use std::path::Path;

use lectern_core::AppResult;
use walkdir::WalkDir;

use crate::chunker::chunk_course;
use crate::parser::{is_course_file, parse_course_file};
use crate::store::CourseStore;
use crate::types::{Course, IngestStats};

/// Passage sizing used when chunking course text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            size: 800,
            overlap: 100,
        }
    }
}

/// Parse, chunk and index one course document.
///
/// Returns the course record and the number of passages indexed.
pub async fn add_course_document(
    store: &CourseStore,
    path: &Path,
    chunking: ChunkSettings,
) -> AppResult<(Course, usize)> {
    let doc = parse_course_file(path)?;
    let chunks = chunk_course(&doc, chunking.size, chunking.overlap)?;

    store.add_course(&doc.course).await?;
    let added = store.add_chunks(&chunks).await?;

    tracing::debug!(course = %doc.course.title, chunks = added, "Indexed course document");
    Ok((doc.course, added))
}

/// Index every course document under `folder`.
///
/// Courses already in the store are skipped. Files that cannot be read or
/// parsed are logged and skipped. A missing folder indexes nothing.
pub async fn add_course_folder(
    store: &CourseStore,
    folder: &Path,
    clear_existing: bool,
    chunking: ChunkSettings,
) -> AppResult<IngestStats> {
    let mut stats = IngestStats::default();

    if clear_existing {
        tracing::info!("Clearing existing course data");
        store.clear()?;
    }

    if !folder.exists() {
        tracing::warn!("Course folder {:?} does not exist", folder);
        return Ok(stats);
    }

    let mut paths: Vec<_> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_course_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    for path in paths {
        let doc = match parse_course_file(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        if store.contains_course(&doc.course.title)? {
            tracing::debug!(course = %doc.course.title, "Course already indexed, skipping");
            stats.skipped += 1;
            continue;
        }

        let chunks = chunk_course(&doc, chunking.size, chunking.overlap)?;
        store.add_course(&doc.course).await?;
        let added = store.add_chunks(&chunks).await?;
        stats.chunks += added;
        stats.courses += 1;

        tracing::info!(course = %doc.course.title, chunks = added, "Added course");
    }

    Ok(stats)
}
