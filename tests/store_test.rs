//! Keyed store tests
//!
//! File-backed and in-memory stores behind the same trait

use neocare_rust::error::NeoCareError;
use neocare_rust::store::{self, keys, FileStore, KeyValueStore, MemoryStore, StoreExt};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

/// Missing key
#[test]
fn test_file_store_missing_key() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path()).unwrap();

    assert!(store.get("nothing").unwrap().is_none());
    assert!(!store.delete("nothing").unwrap());
}

/// Values survive reopening the directory
#[test]
fn test_file_store_persists() {
    let dir = tempdir().expect("Failed to create temp dir");
    {
        let store = FileStore::open(dir.path()).unwrap();
        store.set("pulse_report", json!({"analysis": "HR 72"})).unwrap();
    }

    let reopened = FileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get("pulse_report").unwrap(), Some(json!({"analysis": "HR 72"})));
}

/// Keys with path characters map to safe file names
#[test]
fn test_file_store_odd_keys() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path()).unwrap();

    let key = "upload_history_../../etc/passwd";
    store.set(key, json!([1, 2])).unwrap();

    let path = store.path_for(key);
    assert_eq!(path.parent(), Some(dir.path()));
    assert_eq!(store.get(key).unwrap(), Some(json!([1, 2])));

    assert!(store.delete(key).unwrap());
    assert!(!path.exists());
}

/// No temp files left after a write
#[test]
fn test_file_store_no_leftover_temp_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path()).unwrap();
    store.set("a", json!(1)).unwrap();
    store.set("a", json!(2)).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".json"));
}

/// A corrupt file is a storage error
#[test]
fn test_file_store_corrupt_entry() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = FileStore::open(dir.path()).unwrap();
    std::fs::write(store.path_for("broken"), b"{not json").unwrap();

    assert!(matches!(store.get("broken"), Err(NeoCareError::Storage(_))));
}

/// update is read-modify-write under one lock
#[test]
fn test_update_is_atomic_across_threads() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = Arc::new(FileStore::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..10 {
                    store
                        .update("counter", &mut |current| {
                            let n = current.and_then(|v| v.as_u64()).unwrap_or(0);
                            json!(n + 1)
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get("counter").unwrap(), Some(json!(80)));
}

/// Typed helpers
#[test]
fn test_typed_access() {
    let store = MemoryStore::new();
    store.set_as("list", &vec!["a".to_string(), "b".to_string()]).unwrap();

    let list: Vec<String> = store.get_as("list").unwrap().unwrap();
    assert_eq!(list, vec!["a", "b"]);

    let missing: Option<Vec<String>> = store.get_as("other").unwrap();
    assert!(missing.is_none());

    let required = store.require::<Vec<String>>("other");
    assert!(matches!(required, Err(NeoCareError::MissingSession(key)) if key == "other"));

    let wrong_type = store.get_as::<u32>("list");
    assert!(matches!(wrong_type, Err(NeoCareError::Json(_))));
}

/// Session-scoped keys go, history stays
#[test]
fn test_clear_session_scope() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.set(keys::PULSE_REPORT, json!({})).unwrap();
    store.set(keys::PHARMAFAST_ORDER, json!({})).unwrap();
    store.set(&keys::history(None), json!([])).unwrap();

    let cleared = store::clear_session_scope(store.as_ref()).unwrap();
    assert_eq!(cleared, 2);
    assert!(store.get(keys::PULSE_REPORT).unwrap().is_none());
    assert!(store.get(&keys::history(None)).unwrap().is_some());

    assert_eq!(store::clear_session_scope(store.as_ref()).unwrap(), 0);
}

/// History key per user
#[test]
fn test_history_key() {
    assert_eq!(keys::history(Some("u42")), "upload_history_u42");
    assert_eq!(keys::history(Some("  ")), "upload_history_guest");
    assert_eq!(keys::history(None), "upload_history_guest");
}
