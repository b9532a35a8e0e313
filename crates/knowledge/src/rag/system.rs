//! Course assistant facade: ingestion, querying and catalog analytics.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lectern_core::{AppConfig, AppError, AppResult};
use lectern_llm::create_client;

use crate::ingest::{self, ChunkSettings};
use crate::rag::generator::GenerationOrchestrator;
use crate::rag::prompt::build_user_prompt;
use crate::rag::registry::ToolRegistry;
use crate::rag::session::SessionManager;
use crate::rag::tools::{CourseOutlineTool, CourseSearchTool};
use crate::rag::types::QueryOutcome;
use crate::search::SearchCapability;
use crate::store::CourseStore;
use crate::types::{Course, CourseAnalytics, IngestStats};

pub struct RagSystem {
    store: Arc<CourseStore>,
    orchestrator: GenerationOrchestrator,
    sessions: SessionManager,
    chunking: ChunkSettings,
}

impl RagSystem {
    pub fn new(
        store: Arc<CourseStore>,
        orchestrator: GenerationOrchestrator,
        sessions: SessionManager,
        chunking: ChunkSettings,
    ) -> Self {
        Self {
            store,
            orchestrator,
            sessions,
            chunking,
        }
    }

    /// Wire the store, model client and sessions from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let retrieval = &config.retrieval;
        let store = CourseStore::open(
            &config.index_path(),
            retrieval.embedding_dimensions,
            retrieval.max_results,
        )?;

        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|e| AppError::Llm(format!("Failed to create model client: {}", e)))?;

        let orchestrator = GenerationOrchestrator::new(client, &config.model)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);

        Ok(Self::new(
            Arc::new(store),
            orchestrator,
            SessionManager::new(config.max_history),
            ChunkSettings {
                size: retrieval.chunk_size,
                overlap: retrieval.chunk_overlap,
            },
        ))
    }

    pub fn store(&self) -> &CourseStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// A registry holding the search and outline tools over this store.
    pub fn tool_registry(&self) -> ToolRegistry {
        let search: Arc<dyn SearchCapability> = self.store.clone();
        let mut registry = ToolRegistry::new();
        registry.register(CourseSearchTool::new(search.clone()));
        registry.register(CourseOutlineTool::new(search));
        registry
    }

    /// Answer a question, optionally within a conversation session.
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> AppResult<QueryOutcome> {
        let start = Instant::now();
        let prompt = build_user_prompt(query);

        let history = match session_id {
            Some(id) => self.sessions.history(id)?,
            None => None,
        };

        let registry = self.tool_registry();
        let result = self
            .orchestrator
            .generate(&prompt, history.as_deref(), Some(&registry))
            .await?;

        let sources = registry.collect_sources();
        registry.reset_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &result.answer)?;
        }

        tracing::info!(
            rounds = result.rounds_used,
            sources = sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query answered"
        );

        Ok(QueryOutcome {
            answer: result.answer,
            sources,
            rounds_used: result.rounds_used,
            tools_used: result.tools_used,
        })
    }

    /// Parse, chunk and index one course document.
    pub async fn add_course_document(&self, path: &Path) -> AppResult<(Course, usize)> {
        ingest::add_course_document(&self.store, path, self.chunking).await
    }

    /// Index every course document under `folder`, skipping known courses.
    pub async fn add_course_folder(
        &self,
        folder: &Path,
        clear_existing: bool,
    ) -> AppResult<IngestStats> {
        ingest::add_course_folder(&self.store, folder, clear_existing, self.chunking).await
    }

    pub fn course_analytics(&self) -> AppResult<CourseAnalytics> {
        let course_titles = self.store.course_titles()?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}
