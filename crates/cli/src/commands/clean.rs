//! Clean command handler.

use clap::Args;
use lectern_core::{AppConfig, AppResult};

/// Delete the course index
#[derive(Args, Debug)]
pub struct CleanCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command");

        let index_path = config.index_path();
        let removed = if index_path.exists() {
            std::fs::remove_file(&index_path)?;
            true
        } else {
            false
        };

        if self.json {
            let output = serde_json::json!({
                "indexPath": index_path,
                "removed": removed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if removed {
            println!("Removed course index at {:?}", index_path);
        } else {
            println!("No course index found at {:?}", index_path);
        }

        Ok(())
    }
}
