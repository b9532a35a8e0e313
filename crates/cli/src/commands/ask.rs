//! Ask command handler.
//!
//! Answers one question against the course index.

use clap::Args;
use lectern_core::{AppConfig, AppError, AppResult};
use lectern_knowledge::RagSystem;
use std::path::PathBuf;

use super::format_sources;

/// Ask a question about the indexed courses
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self
            .get_question()?
            .ok_or_else(|| AppError::Config("No question provided".to_string()))?;

        config.validate()?;
        let rag = RagSystem::from_config(config)?;

        if rag.store().course_count()? == 0 {
            tracing::warn!("Course index is empty. Run 'lectern ingest' first.");
        }

        let outcome = rag.query(&question, None).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            println!("{}", outcome.answer);
            if !outcome.sources.is_empty() {
                println!("\nSources:\n{}", format_sources(&outcome.sources));
            }
        }

        Ok(())
    }

    fn get_question(&self) -> AppResult<Option<String>> {
        if let Some(question) = &self.question {
            return Ok(Some(question.clone()));
        }

        if let Some(path) = &self.file {
            let text = std::fs::read_to_string(path)?;
            return Ok(Some(text.trim().to_string()));
        }

        Ok(None)
    }
}
