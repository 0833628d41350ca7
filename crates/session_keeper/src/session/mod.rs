//! Session tokens, the bounded in-process cache and the durable store bridge.
//!
//! [`SessionManager`] is the entry point: request handlers resolve a token
//! through it, the login flow creates sessions through it, and it owns the
//! background [`Reaper`] that trims expired rows from the durable store.

pub mod cache;
pub mod error;
pub mod manager;
pub mod reaper;
pub mod store;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::configuration::SessionSettings;
use common::consts::{DEFAULT_CACHE_CAPACITY, DEFAULT_REAP_INTERVAL_SECS, DEFAULT_SESSION_TTL_SECS};
use serde::Serialize;
use uuid::Uuid;

use crate::db::models::UserRecord;

pub use cache::SessionCache;
pub use error::SessionError;
pub use manager::SessionManager;
pub use reaper::{Reaper, ReaperHandle};
pub use store::{MemorySessionBackend, PostgresSessionBackend, SessionBackend};
pub use users::{PostgresUserDirectory, UserDirectory};

/// An authenticated user binding that stays valid until `expires`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: UserRecord,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Opaque credential handed to clients. Minted once from a random v4 UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Token prefix that is safe to put in logs: at most 8 characters.
pub fn redact(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map_or(token.len(), |(i, _)| i);
    &token[..end]
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum number of sessions resident in the in-process cache.
    pub cache_capacity: usize,
    /// Lifetime of a freshly created session.
    pub ttl: Duration,
    /// How often the reaper purges expired durable rows.
    pub reap_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            reap_interval: Duration::from_secs(DEFAULT_REAP_INTERVAL_SECS),
        }
    }
}

impl From<&SessionSettings> for SessionConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            cache_capacity: settings.cache_capacity(),
            ttl: settings.ttl(),
            reap_interval: settings.reap_interval(),
        }
    }
}
