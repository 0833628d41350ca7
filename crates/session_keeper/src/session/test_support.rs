use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::store::{MemorySessionBackend, SessionBackend};
use super::users::UserDirectory;
use super::{Session, SessionError};
use crate::db::models::{SessionRecord, UserRecord};

pub fn user(id: i64) -> UserRecord {
    UserRecord {
        id,
        username: format!("sheep{id}"),
        email: format!("sheep{id}@example.edu"),
        first_name: "Shaun".to_string(),
        last_name: "Sheep".to_string(),
        class_year: "2027".to_string(),
        account_created: Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap(),
        last_login: None,
    }
}

pub fn session_expiring_at(user: UserRecord, expires: DateTime<Utc>) -> Session {
    Session { user, expires }
}

/// User directory that knows a fixed set of ids and counts lookups.
#[derive(Default)]
pub struct CountingUsers {
    known: HashSet<i64>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingUsers {
    pub fn with_ids(ids: &[i64]) -> Self {
        Self {
            known: ids.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for CountingUsers {
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<UserRecord, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SessionError::UserLookup("connection reset".to_string()));
        }
        if self.known.contains(&user_id) {
            Ok(user(user_id))
        } else {
            Err(SessionError::UserNotFound(user_id))
        }
    }
}

/// Memory backend whose reads and writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyBackend {
    pub inner: MemorySessionBackend,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyBackend {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), SessionError> {
        if flag.load(Ordering::SeqCst) {
            Err(SessionError::Storage("db unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionBackend for FlakyBackend {
    async fn find_live(&self, token: &str) -> Result<Option<SessionRecord>, SessionError> {
        self.check(&self.fail_reads)?;
        self.inner.find_live(token).await
    }

    async fn insert(&self, record: &SessionRecord) -> Result<(), SessionError> {
        self.check(&self.fail_writes)?;
        self.inner.insert(record).await
    }

    async fn delete(&self, token: &str) -> Result<u64, SessionError> {
        self.check(&self.fail_writes)?;
        self.inner.delete(token).await
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        self.check(&self.fail_writes)?;
        self.inner.delete_expired().await
    }
}
