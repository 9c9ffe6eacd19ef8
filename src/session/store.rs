//! Session storage keyed by the session cookie value.
//!
//! The in-memory store is the reference implementation; hosts may provide
//! their own backend behind [`SessionStore`]. Reads and the TTL-refresh
//! write on a single key are atomic; different keys never block each other
//! beyond the shared map lock, and concurrent writes to the same key are
//! last-write-wins.

use super::types::{Session, SessionError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session store keyed by session identifier.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a live session. Expired entries are treated as absent.
    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError>;

    /// Store a session with the given sliding TTL, replacing any previous
    /// state under the key.
    async fn put(&self, key: &str, session: Session, ttl: Duration) -> Result<(), SessionError>;

    /// Refresh the TTL of a live session. Returns false when the key is
    /// missing or already expired; an expired entry is never revived.
    async fn touch(&self, key: &str, ttl: Duration) -> Result<bool, SessionError>;

    /// Look up a live session and refresh its TTL in a single atomic step.
    /// An entry cannot expire between the read and the refresh.
    async fn get_and_touch(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<Session>, SessionError>;

    /// Drop a session. Returns whether a live entry was removed.
    async fn remove(&self, key: &str) -> Result<bool, SessionError>;

    /// Clean up expired sessions, returning the number deleted.
    async fn cleanup_expired(&self) -> Result<u64, SessionError>;
}

struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(key)
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| stored.session.clone()))
    }

    async fn put(&self, key: &str, session: Session, ttl: Duration) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            key.to_string(),
            StoredSession {
                session,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn touch(&self, key: &str, ttl: Duration) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        match sessions.get_mut(key) {
            Some(stored) if stored.expires_at > now => {
                stored.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_and_touch(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<Session>, SessionError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        match sessions.get_mut(key) {
            Some(stored) if stored.expires_at > now => {
                stored.expires_at = now + ttl;
                Ok(Some(stored.session.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(key).is_some())
    }

    async fn cleanup_expired(&self) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, stored| stored.expires_at > now);
        let deleted = (before - sessions.len()) as u64;

        if deleted > 0 {
            tracing::debug!(deleted, "Cleaned up expired SP sessions");
        }

        Ok(deleted)
    }
}
