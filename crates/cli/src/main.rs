//! Lectern CLI
//!
//! Main entry point for the lectern command-line tool: ingest course
//! documents, ask questions about them and serve the HTTP API.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ChatCommand, CleanCommand, CoursesCommand, IngestCommand, ServeCommand,
};
use lectern_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Lectern - course materials Q&A with tool-using models
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(about = "Course materials Q&A with tool-using models", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LECTERN_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LECTERN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Model provider (claude, ollama)
    #[arg(short, long, global = true, env = "LECTERN_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "LECTERN_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index course documents
    Ingest(IngestCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Interactive question loop with conversation memory
    Chat(ChatCommand),

    /// List indexed courses
    Courses(CoursesCommand),

    /// Delete the course index
    Clean(CleanCommand),

    /// Serve the HTTP API
    Serve(ServeCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Courses(_) => "courses",
            Commands::Clean(_) => "clean",
            Commands::Serve(_) => "serve",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)
        .context("Failed to initialize logging")?;

    tracing::info!("Lectern CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_lectern_dir()?;

    let command_name = cli.command.name();
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Courses(cmd) => cmd.execute(&config).await,
        Commands::Clean(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("{} failed", command_name))
}
