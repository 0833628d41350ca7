use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::SessionBackend;
use crate::db::models::SessionRecord;
use crate::session::SessionError;

/// Session rows kept in process memory.
///
/// Behaves like the `user_session` table (unique tokens, expiry filtered on
/// read) for embedders without a database and for tests.
#[derive(Clone, Default)]
pub struct MemorySessionBackend {
    rows: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a row exists for `token`, expired or not.
    pub async fn contains(&self, token: &str) -> bool {
        self.rows.read().await.contains_key(token)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn find_live(&self, token: &str) -> Result<Option<SessionRecord>, SessionError> {
        let now = Utc::now();
        let rows = self.rows.read().await;
        Ok(rows
            .get(token)
            .filter(|record| record.expire_time > now)
            .cloned())
    }

    async fn insert(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&record.token) {
            return Err(SessionError::Storage(
                "duplicate key value violates unique constraint on token".to_string(),
            ));
        }
        rows.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<u64, SessionError> {
        Ok(u64::from(self.rows.write().await.remove(token).is_some()))
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, record| record.expire_time > now);
        Ok((before - rows.len()) as u64)
    }
}
