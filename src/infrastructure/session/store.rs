use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::SessionError;

/// Everything persisted for one session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub values: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Empty record whose absolute lifetime starts now
    pub fn new(lifetime: chrono::Duration) -> Self {
        let created_at = Utc::now();
        Self { values: HashMap::new(), created_at, expires_at: created_at + lifetime }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Storage backend for session records keyed by opaque token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live record. Expired records read as absent.
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Insert or replace the record for `token`
    async fn save(&self, token: &str, record: &SessionRecord) -> Result<(), SessionError>;

    async fn delete(&self, token: &str) -> Result<(), SessionError>;

    /// Drop expired records and report how many were removed
    async fn sweep_expired(&self) -> Result<usize, SessionError>;
}

/// Process-local session store
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired or not
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, SessionError> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        Ok(sessions.get(token).filter(|record| !record.is_expired_at(now)).cloned())
    }

    async fn save(&self, token: &str, record: &SessionRecord) -> Result<(), SessionError> {
        self.sessions.write().await.insert(token.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, record| !record.is_expired_at(now));
        Ok(before - sessions.len())
    }
}
