use async_trait::async_trait;

use super::SessionError;
use crate::db::models::UserRecord;
use crate::db::queries::select_user_by_id;
use crate::db::DbPool;

/// User-data collaborator consulted whenever a session is built.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Unknown ids are an error, not `None`: a session must never point at a missing user.
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<UserRecord, SessionError>;
}

#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: DbPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<UserRecord, SessionError> {
        let client = self
            .pool
            .get_client()
            .await
            .map_err(|e| SessionError::UserLookup(format!("failed to get db connection: {}", e)))?;

        select_user_by_id(&client, user_id)
            .await
            .map_err(|e| SessionError::UserLookup(format!("db query failed: {}", e)))?
            .ok_or(SessionError::UserNotFound(user_id))
    }
}
