//! Ingest command handler.

use clap::Args;
use lectern_core::{AppConfig, AppError, AppResult};
use lectern_knowledge::ingest::{add_course_document, add_course_folder};
use lectern_knowledge::IngestStats;
use std::path::PathBuf;
use std::time::Instant;

use super::{chunk_settings, open_store};

/// Index course documents (files or folders)
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or folders to ingest (default: the configured docs directory)
    pub paths: Vec<PathBuf>,

    /// Clear the index before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");
        let start = Instant::now();

        let store = open_store(config)?;
        let chunking = chunk_settings(config);

        let paths = if self.paths.is_empty() {
            vec![config.docs_dir()]
        } else {
            self.paths.clone()
        };

        if self.reset {
            store.clear()?;
        }

        let mut stats = IngestStats::default();
        for path in &paths {
            if path.is_file() {
                let (course, chunks) = add_course_document(&store, path, chunking).await?;
                tracing::debug!("Ingested '{}' from {:?}", course.title, path);
                stats.courses += 1;
                stats.chunks += chunks;
            } else if path.is_dir() {
                let folder = add_course_folder(&store, path, false, chunking).await?;
                stats.courses += folder.courses;
                stats.chunks += folder.chunks;
                stats.skipped += folder.skipped;
            } else {
                return Err(AppError::Knowledge(format!("Path not found: {:?}", path)));
            }
        }

        let elapsed = start.elapsed().as_secs_f64();

        if self.json {
            let output = serde_json::json!({
                "courses": stats.courses,
                "chunks": stats.chunks,
                "skipped": stats.skipped,
                "totalCourses": store.course_count()?,
                "durationSecs": elapsed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Ingested {} courses ({} chunks, {} skipped) in {:.2}s",
                stats.courses, stats.chunks, stats.skipped, elapsed
            );
        }

        Ok(())
    }
}
