pub mod memory;
pub mod postgresql;

use async_trait::async_trait;

use super::SessionError;
use crate::db::models::SessionRecord;

pub use memory::MemorySessionBackend;
pub use postgresql::PostgresSessionBackend;

/// Durable system of record for session tokens.
///
/// Shared by every server process; the in-process cache is only a view over it.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Row for `token` if it exists and has not expired.
    async fn find_live(&self, token: &str) -> Result<Option<SessionRecord>, SessionError>;

    async fn insert(&self, record: &SessionRecord) -> Result<(), SessionError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete(&self, token: &str) -> Result<u64, SessionError>;

    /// Purge all rows whose expiry has passed. Returns the number of rows removed.
    async fn delete_expired(&self) -> Result<u64, SessionError>;
}
