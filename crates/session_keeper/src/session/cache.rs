use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::IteratorRandom;
use tracing::debug;

use super::Session;

/// Bounded token -> session map.
///
/// Not synchronized on its own; [`SessionManager`](super::SessionManager)
/// keeps it behind a single mutex. Inserting a new token into a full cache
/// first drops every expired entry, and if that frees nothing, evicts a
/// random quarter of what is left. Evicted sessions are still in the durable
/// store and come back on the next lookup.
pub struct SessionCache {
    entries: HashMap<String, Arc<Session>>,
    capacity: usize,
}

impl SessionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Cached session for `token`. Expiry is not re-checked here.
    pub fn get(&self, token: &str) -> Option<Arc<Session>> {
        self.entries.get(token).cloned()
    }

    pub fn insert(&mut self, token: String, session: Arc<Session>) {
        self.insert_at(token, session, Utc::now());
    }

    pub(crate) fn insert_at(&mut self, token: String, session: Arc<Session>, now: DateTime<Utc>) {
        if !self.entries.contains_key(&token) && self.entries.len() >= self.capacity {
            self.make_room(now);
        }
        self.entries.insert(token, session);
    }

    pub fn remove(&mut self, token: &str) -> bool {
        self.entries.remove(token).is_some()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn make_room(&mut self, now: DateTime<Utc>) {
        let expired = self.sweep_expired(now);
        if self.entries.len() < self.capacity {
            debug!(expired, remaining = self.entries.len(), "swept expired sessions from cache");
            return;
        }

        // at least one victim, so the pending insert stays within capacity
        let quota = (self.entries.len() / 4).max(1);
        let mut rng = rand::rng();
        let victims: Vec<String> = self
            .entries
            .keys()
            .choose_multiple(&mut rng, quota)
            .into_iter()
            .cloned()
            .collect();
        for token in &victims {
            self.entries.remove(token);
        }

        debug!(
            expired,
            evicted = victims.len(),
            remaining = self.entries.len(),
            "evicted random sessions from full cache"
        );
    }

    fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, session| !session.is_expired_at(now));
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::{session_expiring_at, user};
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    fn live(now: DateTime<Utc>, id: i64) -> Arc<Session> {
        Arc::new(session_expiring_at(user(id), now + TimeDelta::hours(1)))
    }

    fn expired(now: DateTime<Utc>, id: i64) -> Arc<Session> {
        Arc::new(session_expiring_at(user(id), now - TimeDelta::hours(1)))
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = SessionCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn never_exceeds_capacity_at_rest() {
        let now = Utc::now();
        let mut cache = SessionCache::new(8);

        for i in 0..100 {
            cache.insert_at(format!("token-{i}"), live(now, i), now);
            assert!(cache.len() <= cache.capacity());
        }
        assert!(cache.contains("token-99"));
    }

    #[test]
    fn expired_entries_go_before_any_live_entry() {
        let now = Utc::now();
        let mut cache = SessionCache::new(4);
        cache.insert_at("old-a".to_string(), expired(now, 1), now);
        cache.insert_at("live-a".to_string(), live(now, 2), now);
        cache.insert_at("old-b".to_string(), expired(now, 3), now);
        cache.insert_at("live-b".to_string(), live(now, 4), now);
        assert_eq!(cache.len(), 4);

        cache.insert_at("new".to_string(), live(now, 5), now);

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("old-a"));
        assert!(!cache.contains("old-b"));
        assert!(cache.contains("live-a"));
        assert!(cache.contains("live-b"));
        assert!(cache.contains("new"));
    }

    #[test]
    fn evicts_a_quarter_when_nothing_has_expired() {
        let now = Utc::now();
        let mut cache = SessionCache::new(8);
        for i in 0..8 {
            cache.insert_at(format!("token-{i}"), live(now, i), now);
        }

        cache.insert_at("token-8".to_string(), live(now, 8), now);

        // 8 / 4 = 2 victims, then the new entry
        assert_eq!(cache.len(), 7);
        assert!(cache.contains("token-8"));
    }

    #[test]
    fn capacity_two_keeps_exactly_one_of_the_originals() {
        let now = Utc::now();
        let mut cache = SessionCache::new(2);
        cache.insert_at("a".to_string(), live(now, 1), now);
        cache.insert_at("b".to_string(), live(now, 2), now);

        cache.insert_at("c".to_string(), live(now, 3), now);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("c"));
        assert!(cache.contains("a") ^ cache.contains("b"));
    }

    #[test]
    fn replacing_a_resident_token_does_not_evict() {
        let now = Utc::now();
        let mut cache = SessionCache::new(2);
        cache.insert_at("a".to_string(), live(now, 1), now);
        cache.insert_at("b".to_string(), live(now, 2), now);

        cache.insert_at("a".to_string(), live(now, 10), now);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a").map(|s| s.user.id), Some(10));
        assert!(cache.contains("b"));
    }

    #[test]
    fn get_returns_expired_entries_as_is() {
        let now = Utc::now();
        let mut cache = SessionCache::new(2);
        cache.insert_at("stale".to_string(), expired(now, 1), now);

        let session = cache.get("stale").unwrap();
        assert!(session.is_expired_at(now));
    }
}
