use async_trait::async_trait;

use super::SessionBackend;
use crate::db::models::SessionRecord;
use crate::db::queries::{delete_expired_sessions, delete_session, insert_session, select_live_session};
use crate::db::DbPool;
use crate::session::SessionError;

/// `user_session` table accessed through the shared connection pool.
#[derive(Clone)]
pub struct PostgresSessionBackend {
    pool: DbPool,
}

impl PostgresSessionBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> Result<deadpool_postgres::Client, SessionError> {
        self.pool
            .get_client()
            .await
            .map_err(|e| SessionError::Storage(format!("failed to get db connection: {}", e)))
    }
}

fn query_failed(e: tokio_postgres::Error) -> SessionError {
    SessionError::Storage(format!("db query failed: {}", e))
}

#[async_trait]
impl SessionBackend for PostgresSessionBackend {
    async fn find_live(&self, token: &str) -> Result<Option<SessionRecord>, SessionError> {
        let client = self.client().await?;
        select_live_session(&client, token).await.map_err(query_failed)
    }

    async fn insert(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let client = self.client().await?;
        insert_session(&client, record).await.map_err(query_failed)?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<u64, SessionError> {
        let client = self.client().await?;
        delete_session(&client, token).await.map_err(query_failed)
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        let client = self.client().await?;
        delete_expired_sessions(&client).await.map_err(query_failed)
    }
}
