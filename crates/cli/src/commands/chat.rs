//! Interactive chat loop sharing one session.

use clap::Args;
use lectern_core::{AppConfig, AppResult};
use lectern_knowledge::RagSystem;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::format_sources;

/// Chat about the indexed courses (type 'exit' to quit)
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Hide source citations
    #[arg(long)]
    pub no_sources: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        config.validate()?;
        let rag = RagSystem::from_config(config)?;
        let session = rag.sessions().create_session()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if matches!(question, "exit" | "quit") {
                break;
            }

            match rag.query(question, Some(&session)).await {
                Ok(outcome) => {
                    println!("{}", outcome.answer);
                    if !self.no_sources && !outcome.sources.is_empty() {
                        println!("\nSources:\n{}", format_sources(&outcome.sources));
                    }
                    println!();
                }
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    eprintln!("Error: {}", e);
                }
            }
        }

        rag.sessions().clear_session(&session)?;
        Ok(())
    }
}
