use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use common::consts::DEFAULT_SESSION_TTL_SECS;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::cache::SessionCache;
use super::reaper::{Reaper, ReaperHandle};
use super::store::SessionBackend;
use super::users::UserDirectory;
use super::{redact, Session, SessionConfig, SessionError, SessionToken};
use crate::db::models::SessionRecord;

/// Resolves session tokens for request handlers.
///
/// Lookups hit the in-process [`SessionCache`] first and fall back to the
/// durable [`SessionBackend`]. The cache sits behind one mutex; calls to the
/// backend and the [`UserDirectory`] happen outside of it.
///
/// Known gaps kept on purpose:
/// - a cached session is returned without checking its expiry, so it can
///   outlive its TTL for as long as it stays resident;
/// - [`destroy_session`](Self::destroy_session) only deletes the durable row,
///   so a destroyed session keeps resolving on this process until it is
///   evicted from the cache.
pub struct SessionManager {
    cache: Mutex<SessionCache>,
    backend: Arc<dyn SessionBackend>,
    users: Arc<dyn UserDirectory>,
    ttl: TimeDelta,
    reaper: ReaperHandle,
}

impl SessionManager {
    /// Build the manager and start its reaper on the current tokio runtime.
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn SessionBackend>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let ttl = TimeDelta::from_std(config.ttl).unwrap_or_else(|_| {
            warn!(ttl = ?config.ttl, "session ttl out of range, using default");
            TimeDelta::seconds(DEFAULT_SESSION_TTL_SECS as i64)
        });
        let reaper = Reaper::new(Arc::clone(&backend), config.reap_interval).start();

        Self {
            cache: Mutex::new(SessionCache::new(config.cache_capacity)),
            backend,
            users,
            ttl,
            reaper,
        }
    }

    /// Create a session for an existing user and return its token.
    ///
    /// A failed durable write is logged and swallowed: the session still works
    /// on this process, but it will not survive a restart and other processes
    /// will not see it.
    pub async fn create_session_for_user(&self, user_id: i64) -> Result<SessionToken, SessionError> {
        let expires = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or(SessionError::ExpiryOutOfRange(self.ttl))?;
        let user = self.users.fetch_user_by_id(user_id).await?;

        let token = SessionToken::generate();
        let session = Arc::new(Session { user, expires });
        self.cache
            .lock()
            .await
            .insert(token.to_string(), session);

        let record = SessionRecord {
            token: token.to_string(),
            user_id,
            expire_time: expires,
        };
        if let Err(e) = self.backend.insert(&record).await {
            warn!(
                error = %e,
                user_id,
                token = redact(token.as_str()),
                "failed to persist session, it will only be known to this process"
            );
        }

        debug!(user_id, token = redact(token.as_str()), "created session");
        Ok(token)
    }

    /// Resolve a token. `Ok(None)` means there is no valid session for it.
    pub async fn get_session(&self, token: &str) -> Result<Option<Arc<Session>>, SessionError> {
        let cached = self.cache.lock().await.get(token);
        if cached.is_some() {
            return Ok(cached);
        }

        let Some(record) = self.backend.find_live(token).await? else {
            return Ok(None);
        };

        let user = self.users.fetch_user_by_id(record.user_id).await?;
        let session = Arc::new(Session {
            user,
            expires: record.expire_time,
        });
        self.cache
            .lock()
            .await
            .insert(token.to_string(), Arc::clone(&session));

        debug!(
            user_id = record.user_id,
            token = redact(token),
            "restored session from durable store"
        );
        Ok(Some(session))
    }

    /// Delete the durable row for `token`. The cached view is left in place.
    pub async fn destroy_session(&self, token: &str) -> Result<(), SessionError> {
        let removed = self.backend.delete(token).await?;
        debug!(removed, token = redact(token), "destroyed session");
        Ok(())
    }

    /// Drop the cached view of `token` without touching the durable row.
    pub async fn forget_cached(&self, token: &str) -> bool {
        self.cache.lock().await.remove(token)
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub fn reaper_running(&self) -> bool {
        self.reaper.is_running()
    }
}
