//! In-memory conversation sessions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use lectern_core::{AppError, AppResult};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Turn {
    role: &'static str,
    content: String,
}

/// Bounded per-session history of user/assistant exchanges.
///
/// Each session keeps at most `max_history` exchanges; older ones are dropped.
pub struct SessionManager {
    max_history: usize,
    sessions: Mutex<HashMap<String, Vec<Turn>>>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> AppResult<MutexGuard<'_, HashMap<String, Vec<Turn>>>> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Session("session table lock poisoned".to_string()))
    }

    /// Start an empty session and return its id.
    pub fn create_session(&self) -> AppResult<String> {
        let id = format!("session_{}", Uuid::new_v4().simple());
        self.sessions()?.insert(id.clone(), Vec::new());
        tracing::debug!(session = %id, "Session created");
        Ok(id)
    }

    /// Record one question/answer pair. Unknown ids start a new session.
    pub fn add_exchange(&self, session_id: &str, question: &str, answer: &str) -> AppResult<()> {
        let mut sessions = self.sessions()?;
        let turns = sessions.entry(session_id.to_string()).or_default();

        turns.push(Turn {
            role: "User",
            content: question.to_string(),
        });
        turns.push(Turn {
            role: "Assistant",
            content: answer.to_string(),
        });

        let keep = self.max_history * 2;
        if turns.len() > keep {
            let excess = turns.len() - keep;
            turns.drain(..excess);
        }

        Ok(())
    }

    /// Formatted history, or `None` for unknown or empty sessions.
    pub fn history(&self, session_id: &str) -> AppResult<Option<String>> {
        let sessions = self.sessions()?;
        let formatted = sessions.get(session_id).filter(|t| !t.is_empty()).map(|turns| {
            turns
                .iter()
                .map(|t| format!("{}: {}", t.role, t.content))
                .collect::<Vec<_>>()
                .join("\n")
        });
        Ok(formatted)
    }

    /// Forget a session. Returns whether it existed.
    pub fn clear_session(&self, session_id: &str) -> AppResult<bool> {
        Ok(self.sessions()?.remove(session_id).is_some())
    }

    pub fn session_count(&self) -> AppResult<usize> {
        Ok(self.sessions()?.len())
    }
}
