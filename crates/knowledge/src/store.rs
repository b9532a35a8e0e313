//! SQLite-backed course store.
//!
//! Holds the course catalog (one row per course, lessons as JSON) and the
//! embedded passages. Implements [`SearchCapability`] for the course tools.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use lectern_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};

use crate::embeddings::{cosine_similarity, create_provider, EmbeddingProvider};
use crate::search::{
    no_course_message, HitMetadata, SearchCapability, SearchHit, SearchQuery, SearchResults,
};
use crate::types::{Course, CourseChunk, Lesson};

/// Minimum title similarity for fuzzy course-name resolution.
const MIN_TITLE_SIMILARITY: f32 = 0.35;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    title TEXT PRIMARY KEY,
    link TEXT,
    instructor TEXT,
    lessons TEXT NOT NULL,
    lesson_count INTEGER NOT NULL,
    title_embedding BLOB NOT NULL,
    ingested_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    FOREIGN KEY (course_title) REFERENCES courses(title)
);

CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
"#;

/// Row loaded for scoring.
struct ChunkRow {
    course_title: String,
    lesson_number: Option<u32>,
    chunk_index: u32,
    content: String,
    embedding: Vec<f32>,
}

/// Course catalog and passage index.
pub struct CourseStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
    max_results: usize,
}

impl CourseStore {
    /// Open (or create) a store at `db_path` using trigram embeddings.
    pub fn open(db_path: &Path, dimensions: usize, max_results: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        tracing::debug!("Opened course store at {:?}", db_path);
        Self::with_connection(conn, create_provider("trigram", dimensions)?, max_results)
    }

    /// In-memory store, mainly for tests.
    pub fn open_in_memory(dimensions: usize, max_results: usize) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;
        Self::with_connection(conn, create_provider("trigram", dimensions)?, max_results)
    }

    /// Build a store over an existing connection and embedder.
    pub fn with_connection(
        conn: Connection,
        embedder: Arc<dyn EmbeddingProvider>,
        max_results: usize,
    ) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            max_results,
        })
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Course store lock poisoned".to_string()))
    }

    /// Add or replace a course record.
    pub async fn add_course(&self, course: &Course) -> AppResult<()> {
        let title_embedding = self.embedder.embed(&course.title).await?;
        let lessons = serde_json::to_string(&course.lessons)?;

        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO courses
                 (title, link, instructor, lessons, lesson_count, title_embedding, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    course.title,
                    course.link,
                    course.instructor,
                    lessons,
                    course.lessons.len() as i64,
                    embedding_to_bytes(&title_embedding),
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to insert course: {}", e)))?;

        tracing::debug!(course = %course.title, lessons = course.lessons.len(), "Stored course");
        Ok(())
    }

    /// Embed and insert passages in one transaction.
    pub async fn add_chunks(&self, chunks: &[CourseChunk]) -> AppResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            tx.execute(
                "INSERT INTO chunks (course_title, lesson_number, chunk_index, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content,
                    embedding_to_bytes(embedding),
                ],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit chunks: {}", e)))?;

        Ok(chunks.len())
    }

    /// All course titles, alphabetically.
    pub fn course_titles(&self) -> AppResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT title FROM courses ORDER BY title")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Knowledge(format!("Failed to list courses: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Knowledge(format!("Failed to read course row: {}", e)))?;

        Ok(titles)
    }

    /// Number of stored courses.
    pub fn course_count(&self) -> AppResult<usize> {
        self.count("SELECT COUNT(*) FROM courses")
    }

    /// Number of stored passages.
    pub fn chunk_count(&self) -> AppResult<usize> {
        self.count("SELECT COUNT(*) FROM chunks")
    }

    fn count(&self, sql: &str) -> AppResult<usize> {
        self.conn()?
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| AppError::Knowledge(format!("Failed to count rows: {}", e)))
    }

    /// Whether a course with exactly this title exists.
    pub fn contains_course(&self, title: &str) -> AppResult<bool> {
        self.conn()?
            .query_row("SELECT 1 FROM courses WHERE title = ?1", [title], |_| Ok(()))
            .optional()
            .map(|row| row.is_some())
            .map_err(|e| AppError::Knowledge(format!("Failed to look up course: {}", e)))
    }

    /// Delete every course and passage.
    pub fn clear(&self) -> AppResult<()> {
        self.conn()?
            .execute_batch("DELETE FROM chunks; DELETE FROM courses;")
            .map_err(|e| AppError::Knowledge(format!("Failed to clear store: {}", e)))?;

        tracing::info!("Cleared course store");
        Ok(())
    }

    fn load_course(&self, title: &str) -> AppResult<Option<Course>> {
        let row = self
            .conn()?
            .query_row(
                "SELECT title, link, instructor, lessons FROM courses WHERE title = ?1",
                [title],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| AppError::Knowledge(format!("Failed to load course: {}", e)))?;

        let Some((title, link, instructor, lessons_json)) = row else {
            return Ok(None);
        };

        let lessons: Vec<Lesson> = serde_json::from_str(&lessons_json).map_err(|e| {
            AppError::Knowledge(format!("Corrupt lesson list for '{}': {}", title, e))
        })?;

        Ok(Some(Course {
            title,
            link,
            instructor,
            lessons,
        }))
    }

    fn load_title_embeddings(&self) -> AppResult<Vec<(String, Vec<f32>)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT title, title_embedding FROM courses")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))
            .map_err(|e| AppError::Knowledge(format!("Failed to list courses: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Knowledge(format!("Failed to read course row: {}", e)))?;

        rows.into_iter()
            .map(|(title, bytes)| Ok((title, bytes_to_embedding(&bytes)?)))
            .collect()
    }

    fn load_chunks(
        &self,
        course_title: Option<&str>,
        lesson: Option<u32>,
    ) -> AppResult<Vec<ChunkRow>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT course_title, lesson_number, chunk_index, content, embedding FROM chunks
                 WHERE (?1 IS NULL OR course_title = ?1)
                   AND (?2 IS NULL OR lesson_number = ?2)",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let raw = stmt
            .query_map(params![course_title, lesson], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<u32>>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Knowledge(format!("Failed to read chunk row: {}", e)))?;

        raw.into_iter()
            .map(|(course_title, lesson_number, chunk_index, content, bytes)| {
                Ok(ChunkRow {
                    course_title,
                    lesson_number,
                    chunk_index,
                    content,
                    embedding: bytes_to_embedding(&bytes)?,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl SearchCapability for CourseStore {
    async fn search(&self, query: &SearchQuery) -> AppResult<SearchResults> {
        let course_title = match &query.course_name {
            Some(name) => match self.resolve_course_name(name).await? {
                Some(title) => Some(title),
                None => return Ok(SearchResults::Error(no_course_message(name))),
            },
            None => None,
        };

        let query_embedding = self.embedder.embed(&query.text).await?;
        let rows = self.load_chunks(course_title.as_deref(), query.lesson_number)?;

        let mut scored: Vec<(ChunkRow, f32)> = rows
            .into_iter()
            .map(|row| {
                let score = cosine_similarity(&query_embedding, &row.embedding);
                (row, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(query.limit.unwrap_or(self.max_results));

        let mut catalog: HashMap<String, Option<Course>> = HashMap::new();
        let mut hits = Vec::with_capacity(scored.len());

        for (row, score) in scored {
            let lesson_link = match row.lesson_number {
                Some(n) => {
                    if !catalog.contains_key(&row.course_title) {
                        let course = self.load_course(&row.course_title)?;
                        catalog.insert(row.course_title.clone(), course);
                    }
                    catalog
                        .get(&row.course_title)
                        .and_then(|c| c.as_ref())
                        .and_then(|c| c.lesson(n))
                        .and_then(|l| l.link.clone())
                }
                None => None,
            };

            hits.push(SearchHit {
                document: row.content,
                metadata: HitMetadata {
                    course_title: row.course_title,
                    lesson_number: row.lesson_number,
                    chunk_index: row.chunk_index,
                    lesson_link,
                },
                distance: 1.0 - score,
            });
        }

        tracing::debug!(
            query = %query.text,
            course = ?course_title,
            lesson = ?query.lesson_number,
            hits = hits.len(),
            "Searched course content"
        );

        Ok(SearchResults::Hits(hits))
    }

    async fn resolve_course_name(&self, name: &str) -> AppResult<Option<String>> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let name_embedding = self.embedder.embed(name).await?;
        let titles = self.load_title_embeddings()?;

        if let Some((title, _)) = titles.iter().find(|(t, _)| t.to_lowercase() == needle) {
            return Ok(Some(title.clone()));
        }

        let mut contained: Vec<&String> = titles
            .iter()
            .map(|(t, _)| t)
            .filter(|t| t.to_lowercase().contains(&needle))
            .collect();
        contained.sort_by_key(|t| t.len());
        if let Some(title) = contained.first() {
            return Ok(Some((*title).clone()));
        }

        let best = titles
            .iter()
            .map(|(t, e)| (t, cosine_similarity(&name_embedding, e)))
            .filter(|(_, s)| *s >= MIN_TITLE_SIMILARITY)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best.map(|(t, _)| t.clone()))
    }

    async fn course(&self, title: &str) -> AppResult<Option<Course>> {
        self.load_course(title)
    }

    async fn lesson_link(
        &self,
        course_title: &str,
        lesson_number: u32,
    ) -> AppResult<Option<String>> {
        Ok(self
            .load_course(course_title)?
            .and_then(|c| c.lesson(lesson_number).and_then(|l| l.link.clone())))
    }

    async fn course_link(&self, course_title: &str) -> AppResult<Option<String>> {
        Ok(self.load_course(course_title)?.and_then(|c| c.link))
    }
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
