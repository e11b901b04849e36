//! Keyed persistent store
//!
//! Components never touch files directly; they receive an
//! `Arc<dyn KeyValueStore>` and read/write JSON values by key.
//! [`FileStore`] persists one file per key, [`MemoryStore`] lives in memory.

mod file_store;

pub use file_store::FileStore;

use crate::error::{NeoCareError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Well-known keys
pub mod keys {
    /// last vitals report (analysis + extracted fields)
    pub const PULSE_REPORT: &str = "pulse_report";
    /// last prescription scan
    pub const PHARMA_SCAN_RESULT: &str = "pharma_scan_result";
    /// order draft built from a scan
    pub const PHARMAFAST_ORDER: &str = "pharmafast_order";
    /// last submitted delivery request
    pub const PHARMAFAST_REQUEST: &str = "pharmafast_request";
    /// answer of the delivery service
    pub const PHARMAFAST_RESPONSE: &str = "pharmafast_response";

    /// assistant conversation of a guest; logged-in users keep theirs on the service
    pub const CHAT_DRAFT: &str = "drneo_chat_conversation";

    /// Cleared at logout and when a flow restarts
    pub const SESSION_SCOPED: &[&str] = &[
        PULSE_REPORT,
        PHARMA_SCAN_RESULT,
        PHARMAFAST_ORDER,
        PHARMAFAST_REQUEST,
        PHARMAFAST_RESPONSE,
    ];

    /// `upload_history_<user>` or `upload_history_guest`
    pub fn history(user_id: Option<&str>) -> String {
        match user_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => format!("upload_history_{}", id),
            None => "upload_history_guest".to_string(),
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Returns whether the key existed
    fn delete(&self, key: &str) -> Result<bool>;

    /// Atomic read-modify-write; returns the stored value
    fn update(&self, key: &str, f: &mut dyn FnMut(Option<Value>) -> Value) -> Result<Value>;
}

/// Typed access on top of [`KeyValueStore`]
pub trait StoreExt: KeyValueStore {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }

    /// Like `get_as`, but a missing key is an error
    fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_as(key)?
            .ok_or_else(|| NeoCareError::MissingSession(key.to_string()))
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

/// Delete every session-scoped key; returns how many existed
pub fn clear_session_scope(store: &dyn KeyValueStore) -> Result<usize> {
    let mut cleared = 0;
    for key in keys::SESSION_SCOPED {
        if store.delete(key)? {
            cleared += 1;
        }
    }
    tracing::debug!(cleared, "session scope cleared");
    Ok(cleared)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries().remove(key).is_some())
    }

    fn update(&self, key: &str, f: &mut dyn FnMut(Option<Value>) -> Value) -> Result<Value> {
        let mut entries = self.entries();
        let next = f(entries.get(key).cloned());
        entries.insert(key.to_string(), next.clone());
        Ok(next)
    }
}
