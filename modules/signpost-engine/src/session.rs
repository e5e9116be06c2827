//! Server-side sessions: scoped models, page history, error notes.
//!
//! Sessions are opaque UUID-keyed server state. The store enforces an
//! idle TTL; an expired or unknown id resolves to no session, which is
//! what session-scoped model access reports as `SessionExpired`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use signpost_core::{BoundedStack, HistoryEntry};

use crate::model::SharedModel;

/// Idle minutes before a session expires, unless the host overrides.
pub const DEFAULT_IDLE_MINUTES: i64 = 30;

/// One session's state. Shared via `Arc`; every interior field has its
/// own lock, so holders never contend on the store itself.
pub struct SessionState {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_seen: Mutex<DateTime<Utc>>,
    models: Mutex<HashMap<String, SharedModel>>,
    history: Mutex<BoundedStack<HistoryEntry>>,
    last_error: Mutex<Option<String>>,
}

impl SessionState {
    fn new(history_capacity: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_seen: Mutex::new(now),
            models: Mutex::new(HashMap::new()),
            history: Mutex::new(BoundedStack::new(history_capacity)),
            last_error: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn models_mut(&self) -> MutexGuard<'_, HashMap<String, SharedModel>> {
        self.models.lock().expect("session model map lock poisoned")
    }

    pub fn push_history(&self, entry: HistoryEntry) {
        self.history
            .lock()
            .expect("session history lock poisoned")
            .push(entry);
    }

    pub fn pop_history(&self) -> Option<HistoryEntry> {
        self.history
            .lock()
            .expect("session history lock poisoned")
            .pop()
    }

    pub fn history_top(&self) -> Option<HistoryEntry> {
        self.history
            .lock()
            .expect("session history lock poisoned")
            .top()
            .cloned()
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .expect("session history lock poisoned")
            .len()
    }

    /// Replace the session's error note.
    pub fn set_last_error(&self, text: impl Into<String>) {
        *self.last_error.lock().expect("last error lock poisoned") = Some(text.into());
    }

    /// Append to the error note, newline-separated.
    pub fn append_last_error(&self, text: &str) {
        let mut slot = self.last_error.lock().expect("last error lock poisoned");
        match slot.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .expect("last error lock poisoned")
            .clone()
    }

    /// Read and clear the error note.
    pub fn take_last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .expect("last error lock poisoned")
            .take()
    }

    fn touch(&self) {
        *self.last_seen.lock().expect("last seen lock poisoned") = Utc::now();
    }

    fn idle_longer_than(&self, ttl: Duration) -> bool {
        let last = *self.last_seen.lock().expect("last seen lock poisoned");
        Utc::now().signed_duration_since(last) > ttl
    }
}

/// All live sessions, keyed by id.
pub struct SessionStore {
    history_capacity: usize,
    ttl: Duration,
    inner: RwLock<HashMap<Uuid, Arc<SessionState>>>,
}

impl SessionStore {
    pub fn new(history_capacity: usize, ttl: Duration) -> Self {
        Self {
            history_capacity,
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Mint a new session.
    pub fn create(&self) -> Arc<SessionState> {
        let session = Arc::new(SessionState::new(self.history_capacity));
        self.inner
            .write()
            .expect("session store lock poisoned")
            .insert(session.id(), session.clone());
        debug!(session = %session.id(), "session created");
        session
    }

    /// Look up a session by id, refreshing its idle clock. Expired
    /// sessions are removed and resolve to `None`.
    pub fn resolve(&self, id: Uuid) -> Option<Arc<SessionState>> {
        let found = self
            .inner
            .read()
            .expect("session store lock poisoned")
            .get(&id)
            .cloned()?;
        if found.idle_longer_than(self.ttl) {
            self.remove(id);
            debug!(session = %id, "session expired");
            return None;
        }
        found.touch();
        Some(found)
    }

    pub fn remove(&self, id: Uuid) {
        self.inner
            .write()
            .expect("session store lock poisoned")
            .remove(&id);
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut inner = self.inner.write().expect("session store lock poisoned");
        let before = inner.len();
        inner.retain(|_, session| !session.idle_longer_than(self.ttl));
        before - inner.len()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("session store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forever() -> Duration {
        Duration::minutes(DEFAULT_IDLE_MINUTES)
    }

    #[test]
    fn create_and_resolve() {
        let store = SessionStore::new(10, forever());
        let session = store.create();
        let found = store.resolve(session.id()).unwrap();
        assert_eq!(found.id(), session.id());
        assert!(store.resolve(Uuid::new_v4()).is_none());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::new(10, Duration::zero());
        let session = store.create();
        std::thread::sleep(std::time::Duration::from_millis(10));

        assert!(store.resolve(session.id()).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let store = SessionStore::new(10, Duration::zero());
        store.create();
        store.create();
        std::thread::sleep(std::time::Duration::from_millis(10));

        assert_eq!(store.sweep(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn history_is_bounded_by_store_capacity() {
        let store = SessionStore::new(2, forever());
        let session = store.create();
        session.push_history(HistoryEntry::new("/a.html", false));
        session.push_history(HistoryEntry::new("/b.html", false));
        session.push_history(HistoryEntry::new("/c.html", true));

        assert_eq!(session.history_len(), 2);
        assert_eq!(session.pop_history().unwrap().uri, "/c.html");
        assert_eq!(session.pop_history().unwrap().uri, "/b.html");
        assert!(session.pop_history().is_none());
    }

    #[test]
    fn error_note_accumulates_and_clears() {
        let store = SessionStore::new(10, forever());
        let session = store.create();

        session.append_last_error("first");
        session.append_last_error("second");
        assert_eq!(session.last_error().unwrap(), "first\nsecond");

        assert_eq!(session.take_last_error().unwrap(), "first\nsecond");
        assert!(session.last_error().is_none());

        session.set_last_error("fresh");
        assert_eq!(session.last_error().unwrap(), "fresh");
    }
}
