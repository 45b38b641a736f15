//! Session state binding one processed document to its extraction artifacts.
//!
//! The store is an injected abstraction; the core never reaches into ambient
//! global state. Reads must never observe a partially-written record, so the
//! in-memory implementation replaces the whole session value on write.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CardSenseError, Result};
use crate::schema::StatementRecord;

/// A table grid as returned by the upstream text/table extraction service.
/// Row-major; cells may be empty.
pub type TableGrid = Vec<Vec<Option<String>>>;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub filename: Option<String>,
    pub raw_text: String,
    pub tables: Vec<TableGrid>,
    pub processed_at: DateTime<Utc>,
    /// Attached once, after reconciliation completes.
    pub record: Option<StatementRecord>,
}

impl Session {
    pub fn new(raw_text: impl Into<String>, tables: Vec<TableGrid>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: None,
            raw_text: raw_text.into(),
            tables,
            processed_at: Utc::now(),
            record: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            filename: self.filename.clone(),
            processed_at: self.processed_at,
            text_length: self.raw_text.len(),
            table_count: self.tables.len(),
            has_record: self.record.is_some(),
        }
    }
}

/// Lightweight listing view of a session, without the raw text payload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub filename: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub text_length: usize,
    pub table_count: usize,
    pub has_record: bool,
}

pub trait SessionStore {
    fn get(&self, id: &str) -> Option<Arc<Session>>;
    fn put(&self, session: Session) -> Arc<Session>;
    fn delete(&self, id: &str) -> bool;

    /// Attaches the reconciled record by replacing the stored session as a
    /// whole, so concurrent readers see either no record or the finished one.
    fn attach_record(&self, id: &str, record: StatementRecord) -> Result<Arc<Session>> {
        let current = self
            .get(id)
            .ok_or_else(|| CardSenseError::SessionNotFound(id.to_string()))?;
        let mut next = (*current).clone();
        next.record = Some(record);
        Ok(self.put(next))
    }
}

struct StoreInner {
    sessions: HashMap<String, Arc<Session>>,
    insertion_order: VecDeque<String>,
}

/// Volatile in-process store with a capacity bound. When full, the
/// oldest-inserted session is evicted to keep memory use flat across many
/// uploads.
pub struct MemorySessionStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

pub const DEFAULT_SESSION_CAPACITY: usize = 256;

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                sessions: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summaries of all live sessions, oldest first.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let inner = self.read();
        inner
            .insertion_order
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .map(|session| session.summary())
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.read().sessions.get(id).cloned()
    }

    fn put(&self, session: Session) -> Arc<Session> {
        let stored = Arc::new(session);
        let mut inner = self.write();

        if !inner.sessions.contains_key(&stored.id) {
            while inner.sessions.len() >= self.capacity {
                match inner.insertion_order.pop_front() {
                    Some(evicted) => {
                        inner.sessions.remove(&evicted);
                        warn!("session store at capacity, evicted oldest session {}", evicted);
                    }
                    None => break,
                }
            }
            inner.insertion_order.push_back(stored.id.clone());
        }

        inner.sessions.insert(stored.id.clone(), Arc::clone(&stored));
        debug!("stored session {} ({} bytes of text)", stored.id, stored.raw_text.len());
        stored
    }

    fn delete(&self, id: &str) -> bool {
        let mut inner = self.write();
        let removed = inner.sessions.remove(id).is_some();
        if removed {
            inner.insertion_order.retain(|stored| stored != id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete_roundtrip() {
        let store = MemorySessionStore::new();
        let session = Session::new("statement text", Vec::new()).with_filename("april.pdf");
        let id = session.id.clone();

        store.put(session);
        let fetched = store.get(&id).unwrap();
        assert_eq!(fetched.raw_text, "statement text");
        assert_eq!(fetched.filename.as_deref(), Some("april.pdf"));
        assert!(fetched.record.is_none());

        assert!(store.delete(&id));
        assert!(store.get(&id).is_none());
        assert!(!store.delete(&id));
    }

    #[test]
    fn test_attach_record_replaces_whole_session() {
        let store = MemorySessionStore::new();
        let session = Session::new("text", Vec::new());
        let id = session.id.clone();
        store.put(session);

        let before = store.get(&id).unwrap();
        let record = StatementRecord {
            total_amount_due: Some(2000.0),
            ..Default::default()
        };
        store.attach_record(&id, record).unwrap();

        let after = store.get(&id).unwrap();
        assert!(after.record.is_some());
        // Old readers keep their snapshot, new readers see the new value.
        assert!(before.record.is_none());
        assert_eq!(after.raw_text, "text");
    }

    #[test]
    fn test_attach_record_unknown_session() {
        let store = MemorySessionStore::new();
        let err = store
            .attach_record("missing", StatementRecord::fallback())
            .unwrap_err();
        assert!(matches!(err, CardSenseError::SessionNotFound(_)));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = MemorySessionStore::with_capacity(2);
        let first = store.put(Session::new("a", Vec::new())).id.clone();
        let second = store.put(Session::new("b", Vec::new())).id.clone();
        let third = store.put(Session::new("c", Vec::new())).id.clone();

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn test_replacing_existing_session_does_not_evict() {
        let store = MemorySessionStore::with_capacity(2);
        let a = store.put(Session::new("a", Vec::new()));
        let b = store.put(Session::new("b", Vec::new()));

        let mut replacement = (*a).clone();
        replacement.raw_text = "a2".to_string();
        store.put(replacement);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a.id).unwrap().raw_text, "a2");
        assert!(store.get(&b.id).is_some());
    }

    #[test]
    fn test_summaries_in_insertion_order() {
        let store = MemorySessionStore::new();
        let a = store.put(Session::new("aaaa", Vec::new()));
        let b = store.put(Session::new("bb", Vec::new()));

        let summaries = store.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].session_id, a.id);
        assert_eq!(summaries[0].text_length, 4);
        assert_eq!(summaries[1].session_id, b.id);
        assert!(!summaries[1].has_record);
    }
}
