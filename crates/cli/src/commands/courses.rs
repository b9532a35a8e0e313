//! Courses command handler.

use clap::Args;
use lectern_core::{AppConfig, AppResult};
use lectern_knowledge::CourseAnalytics;

use super::open_store;

/// List indexed courses
#[derive(Args, Debug)]
pub struct CoursesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoursesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing courses command");

        let store = open_store(config)?;
        let course_titles = store.course_titles()?;
        let analytics = CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&analytics)?);
            return Ok(());
        }

        if analytics.total_courses == 0 {
            println!("No courses indexed. Run 'lectern ingest <path>' to add some.");
            return Ok(());
        }

        println!(
            "{} courses ({} chunks):",
            analytics.total_courses,
            store.chunk_count()?
        );
        for title in &analytics.course_titles {
            println!("  - {}", title);
        }

        Ok(())
    }
}
