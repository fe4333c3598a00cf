//! In-memory chat history keyed by session id.
//!
//! Sessions are created on first reference. A session idle for longer than
//! the TTL is dropped by [`SessionStore::evict_expired`]; when the store is
//! full the least recently used session makes room for a new one. Each
//! history keeps only its newest `history_limit` messages.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct Session {
    history: VecDeque<ChatMessage>,
    last_seen: Instant,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
    capacity: usize,
    history_limit: usize,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize, history_limit: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
            history_limit: history_limit.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &icare_core::AppConfig) -> Self {
        Self::new(
            Duration::from_secs(config.chat_session_ttl_secs),
            config.chat_max_sessions,
            config.chat_history_limit,
        )
    }

    /// Appends `message` to the session's history, creating the session if
    /// needed. Returns the history length after trimming.
    pub async fn append(&self, session_id: &str, message: ChatMessage) -> usize {
        self.append_at(session_id, message, Instant::now()).await
    }

    async fn append_at(&self, session_id: &str, message: ChatMessage, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;

        if !sessions.contains_key(session_id) && sessions.len() >= self.capacity {
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(id, _)| id.clone())
            {
                sessions.remove(&oldest);
                tracing::debug!(session_id = %oldest, "chat session evicted for capacity");
            }
        }

        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                history: VecDeque::new(),
                last_seen: now,
            });
        session.last_seen = now;
        session.history.push_back(message);
        while session.history.len() > self.history_limit {
            session.history.pop_front();
        }
        session.history.len()
    }

    /// Snapshot of a session's history, oldest first. Unknown ids are empty.
    pub async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|s| s.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drops every session idle for longer than the TTL. Returns how many
    /// were removed.
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now()).await
    }

    async fn evict_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_seen) <= self.ttl);
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
