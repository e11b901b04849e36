//! Upload history log tests
//!
//! Capped, most-recent-first, persisted through the keyed store

use neocare_rust::scanner::FileRef;
use neocare_rust::session::{HistoryLog, UploadSession};
use neocare_rust::store::{keys, FileStore, KeyValueStore, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn file(name: &str) -> FileRef {
    FileRef::new(name, "image/jpeg", b"not really a jpeg".to_vec())
}

fn session(store: Arc<dyn KeyValueStore>, user: Option<&str>) -> UploadSession {
    UploadSession::new(HistoryLog::new(store, user, 50), Duration::from_millis(200))
}

/// Every added file is logged, newest batch first
#[test]
fn test_add_files_records_history() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = session(Arc::clone(&store), Some("u1"));

    session.add_files(vec![file("a.jpg"), file("b.jpg")]);
    session.add_files(vec![file("c.jpg")]);

    let entries = session.history().entries().unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["c.jpg", "a.jpg", "b.jpg"]);
    assert_eq!(entries[0].size_bytes, 17);
    assert_eq!(entries[0].mime_type, "image/jpeg");
    assert!(entries[0].preview.starts_with("data:image/jpeg;base64,"));

    // stored under the user's key with the wire names
    let raw = store.get("upload_history_u1").unwrap().unwrap();
    assert_eq!(raw[0]["name"], json!("c.jpg"));
    assert!(raw[0].get("addedAt").is_some());
    assert!(raw[0].get("type").is_some());
}

/// Never more than 50 entries
#[test]
fn test_history_capped_at_fifty() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = session(store, None);

    for i in 0..60 {
        session.add_files(vec![file(&format!("{}.jpg", i))]);
        assert!(session.history().entries().unwrap().len() <= 50);
    }

    let entries = session.history().entries().unwrap();
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0].name, "59.jpg");
    assert_eq!(entries[49].name, "10.jpg");
    assert_eq!(session.history().key(), "upload_history_guest");
}

/// A configured cap above fifty is clamped
#[test]
fn test_history_cap_is_clamped() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let log = HistoryLog::new(Arc::clone(&store), None, 200);
    let session = UploadSession::new(log, Duration::from_millis(10));

    for i in 0..120 {
        session.add_files(vec![file(&format!("{}.jpg", i))]);
    }

    let entries = session.history().entries().unwrap();
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0].name, "119.jpg");

    // a smaller cap is kept as is
    let small = HistoryLog::new(store, Some("asha"), 3);
    for i in 0..5 {
        small.append(session.history().entries().unwrap()[i..i + 1].to_vec()).unwrap();
    }
    assert_eq!(small.entries().unwrap().len(), 3);
}

/// Users do not see each other's history
#[test]
fn test_history_per_user() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    session(Arc::clone(&store), Some("alice")).add_files(vec![file("a.jpg")]);
    session(Arc::clone(&store), Some("bob")).add_files(vec![file("b.jpg")]);

    let alice = HistoryLog::new(Arc::clone(&store), Some("alice"), 50);
    let entries = alice.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "a.jpg");
}

/// Remove, prune and clear
#[test]
fn test_history_edits() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let session = session(Arc::clone(&store), None);
    session.add_files(vec![file("a.jpg"), file("b.jpg"), file("c.jpg")]);
    let log = session.history();

    let removed = log.remove(1).unwrap().unwrap();
    assert_eq!(removed.name, "b.jpg");
    assert!(log.remove(10).unwrap().is_none());
    assert_eq!(log.entries().unwrap().len(), 2);

    assert_eq!(session.prune_history(1).unwrap(), 1);
    assert_eq!(log.entries().unwrap()[0].name, "a.jpg");

    log.clear().unwrap();
    assert!(log.entries().unwrap().is_empty());
}

/// Removing a queued item leaves its history entry
#[test]
fn test_remove_item_keeps_history() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = session(store, None);
    let items = session.add_files(vec![file("a.jpg")]);

    assert!(session.remove(items[0].id).is_some());
    assert!(session.items().is_empty());
    assert_eq!(session.history().entries().unwrap().len(), 1);
}

/// A store that cannot write
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> neocare_rust::error::Result<Option<Value>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: Value) -> neocare_rust::error::Result<()> {
        Err(neocare_rust::error::NeoCareError::Storage(format!("read-only: {}", key)))
    }

    fn delete(&self, _key: &str) -> neocare_rust::error::Result<bool> {
        Ok(false)
    }

    fn update(
        &self,
        key: &str,
        _f: &mut dyn FnMut(Option<Value>) -> Value,
    ) -> neocare_rust::error::Result<Value> {
        Err(neocare_rust::error::NeoCareError::Storage(format!("read-only: {}", key)))
    }
}

/// History failures never reach the caller of add_files
#[test]
fn test_history_failure_is_swallowed() {
    let session = session(Arc::new(ReadOnlyStore), None);
    let items = session.add_files(vec![file("a.jpg"), file("b.jpg")]);

    assert_eq!(items.len(), 2);
    assert_eq!(session.items().len(), 2);
    assert!(session.history().entries().unwrap().is_empty());
}

/// Corrupt history is reported, not overwritten
#[test]
fn test_corrupt_history_is_kept() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set(&keys::history(None), json!({"not": "a list"})).unwrap();

    let log = HistoryLog::new(Arc::clone(&store), None, 50);
    assert!(log.entries().is_err());
    assert!(log.prune(10).is_err());
    assert_eq!(store.get(&keys::history(None)).unwrap(), Some(json!({"not": "a list"})));
}
