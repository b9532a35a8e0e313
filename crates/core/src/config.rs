//! Configuration management for Lectern.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.lectern/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: the course index and the config
//! file live under `.lectern/` in the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default Anthropic model.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Default local model when running against Ollama.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .lectern/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Model provider ("claude" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// API key for the model provider
    pub api_key: Option<String>,

    /// Environment variable the API key is read from
    pub api_key_env: String,

    /// Maximum output tokens per model call
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// HTTP timeout for a single model call, in seconds
    pub request_timeout_secs: u64,

    /// Chunking and search settings
    pub retrieval: RetrievalSettings,

    /// Number of prior exchanges kept per session
    pub max_history: usize,

    /// HTTP server settings
    pub server: ServerSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Chunking, embedding and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Chunk capacity in characters
    pub chunk_size: usize,

    /// Characters shared between adjacent chunks
    pub chunk_overlap: usize,

    /// Maximum passages returned per search
    pub max_results: usize,

    /// Dimensions of the local embedding vectors
    pub embedding_dimensions: usize,

    /// Course documents folder, relative to the workspace unless absolute
    pub docs_path: PathBuf,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            max_results: 5,
            embedding_dimensions: 384,
            docs_path: PathBuf::from("docs"),
        }
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    retrieval: Option<RetrievalSection>,
    session: Option<SessionSection>,
    server: Option<ServerSection>,
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    max_results: Option<usize>,
    embedding_dimensions: Option<usize>,
    docs_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionSection {
    max_history: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "claude".to_string(),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
            endpoint: None,
            api_key: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            request_timeout_secs: 60,
            retrieval: RetrievalSettings::default(),
            max_history: 2,
            server: ServerSettings::default(),
            log_level: None,
            log_format: LogFormat::Pretty,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `LECTERN_WORKSPACE`: Override workspace path
    /// - `LECTERN_CONFIG`: Path to config file
    /// - `LECTERN_PROVIDER`: Model provider
    /// - `LECTERN_MODEL`: Model identifier
    /// - `LECTERN_API_KEY`: API key (takes precedence over the provider key variable)
    /// - `ANTHROPIC_API_KEY`: Default provider key variable
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use lectern_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("LECTERN_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("LECTERN_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.lectern_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("LECTERN_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("LECTERN_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("LECTERN_API_KEY")
            .ok()
            .or_else(|| std::env::var(&config.api_key_env).ok());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                // A provider switch without an explicit model picks that provider's default.
                if llm.model.is_none() && provider != result.provider {
                    result.model = default_model_for(&provider).to_string();
                }
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = Some(endpoint);
            }
            if let Some(env) = llm.api_key_env {
                result.api_key_env = env;
            }
            if let Some(max_tokens) = llm.max_tokens {
                result.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                result.temperature = temperature;
            }
            if let Some(timeout) = llm.timeout_secs {
                result.request_timeout_secs = timeout;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            let target = &mut result.retrieval;
            if let Some(v) = retrieval.chunk_size {
                target.chunk_size = v;
            }
            if let Some(v) = retrieval.chunk_overlap {
                target.chunk_overlap = v;
            }
            if let Some(v) = retrieval.max_results {
                target.max_results = v;
            }
            if let Some(v) = retrieval.embedding_dimensions {
                target.embedding_dimensions = v;
            }
            if let Some(v) = retrieval.docs_path {
                target.docs_path = PathBuf::from(v);
            }
        }

        if let Some(session) = config_file.session {
            if let Some(max_history) = session.max_history {
                result.max_history = max_history;
            }
        }

        if let Some(server) = config_file.server {
            if let Some(host) = server.host {
                result.server.host = host;
            }
            if let Some(port) = server.port {
                result.server.port = port;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            if model.is_none() && provider != self.provider {
                self.model = default_model_for(&provider).to_string();
            }
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the .lectern directory.
    pub fn lectern_dir(&self) -> PathBuf {
        self.workspace.join(".lectern")
    }

    /// Ensure the .lectern directory exists.
    pub fn ensure_lectern_dir(&self) -> AppResult<()> {
        let dir = self.lectern_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .lectern directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Path to the SQLite course index.
    pub fn index_path(&self) -> PathBuf {
        self.lectern_dir().join("index.sqlite")
    }

    /// Course documents folder, resolved against the workspace.
    pub fn docs_dir(&self) -> PathBuf {
        if self.retrieval.docs_path.is_absolute() {
            self.retrieval.docs_path.clone()
        } else {
            self.workspace.join(&self.retrieval.docs_path)
        }
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["claude", "anthropic", "ollama"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if matches!(self.provider.as_str(), "claude" | "anthropic") && self.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env
            )));
        }

        if self.retrieval.max_results == 0 {
            return Err(AppError::Config(
                "retrieval.maxResults must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.chunk_size == 0 {
            return Err(AppError::Config(
                "retrieval.chunkSize must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "retrieval.chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.retrieval.chunk_overlap, self.retrieval.chunk_size
            )));
        }

        Ok(())
    }
}

fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "ollama" => DEFAULT_OLLAMA_MODEL,
        _ => DEFAULT_CLAUDE_MODEL,
    }
}
