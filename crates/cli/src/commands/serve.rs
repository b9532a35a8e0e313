//! HTTP API for the course assistant.
//!
//! Routes:
//! - `POST /api/query` answer a question, creating a session when none is given
//! - `GET /api/courses` catalog summary
//! - `DELETE /api/session/:id` forget a conversation
//! - `GET /health` liveness

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use clap::Args;
use lectern_core::{AppConfig, AppError, AppResult};
use lectern_knowledge::{CourseAnalytics, RagSystem, SourceCitation};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Serve the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Bind address (default from config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Skip ingesting the docs directory on startup
    #[arg(long)]
    pub no_ingest: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        config.validate()?;
        let rag = Arc::new(RagSystem::from_config(config)?);

        if !self.no_ingest {
            let docs = config.docs_dir();
            if docs.exists() {
                tracing::info!("Loading initial documents from {:?}", docs);
                match rag.add_course_folder(&docs, false).await {
                    Ok(stats) => tracing::info!(
                        "Loaded {} courses with {} chunks",
                        stats.courses,
                        stats.chunks
                    ),
                    Err(e) => tracing::error!("Error loading documents: {}", e),
                }
            }
        }

        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or(config.server.port);
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| {
                AppError::Config(format!("Invalid bind address {}:{}: {}", host, port, e))
            })?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, router(rag)).await?;
        Ok(())
    }
}

pub fn router(rag: Arc<RagSystem>) -> Router {
    Router::new()
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/session/:id", delete(delete_session))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(rag)
}

/// Failures surface as 500 with a `detail` message.
struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self.0);
        let body = serde_json::json!({ "detail": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<SourceCitation>,
    session_id: String,
}

async fn query(
    State(rag): State<Arc<RagSystem>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let session_id = match req.session_id.filter(|s| !s.is_empty()) {
        Some(id) => id,
        None => rag.sessions().create_session()?,
    };

    let outcome = rag.query(&req.query, Some(&session_id)).await?;

    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources,
        session_id,
    }))
}

async fn courses(State(rag): State<Arc<RagSystem>>) -> Result<Json<CourseAnalytics>, ApiError> {
    Ok(Json(rag.course_analytics()?))
}

async fn delete_session(
    State(rag): State<Arc<RagSystem>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    rag.sessions().clear_session(&id)?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": format!("Session {} deleted", id),
    })))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
