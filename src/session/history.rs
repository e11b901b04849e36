//! Per-user upload history in the keyed store

use crate::error::{NeoCareError, Result};
use crate::store::{keys, KeyValueStore};
use neocare_common::{history, HistoryEntry, DEFAULT_HISTORY_CAP};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
    cap: usize,
}

impl HistoryLog {
    /// `cap` is clamped to [`DEFAULT_HISTORY_CAP`]
    pub fn new(store: Arc<dyn KeyValueStore>, user_id: Option<&str>, cap: usize) -> Self {
        Self {
            store,
            key: keys::history(user_id),
            cap: cap.min(DEFAULT_HISTORY_CAP),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Most-recent-first
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        match self.store.get(&self.key)? {
            Some(value) => decode(value),
            None => Ok(Vec::new()),
        }
    }

    /// Prepend `new` and cap the log; returns the new length
    pub fn append(&self, new: Vec<HistoryEntry>) -> Result<usize> {
        if new.is_empty() {
            return Ok(self.entries()?.len());
        }
        let cap = self.cap;
        self.rewrite(move |existing| history::merge_entries(new.clone(), existing, cap))
    }

    /// Drop entries past `max`; returns the new length
    pub fn prune(&self, max: usize) -> Result<usize> {
        self.rewrite(move |existing| history::prune(existing, max))
    }

    pub fn remove(&self, index: usize) -> Result<Option<HistoryEntry>> {
        let mut removed = None;
        self.rewrite(|mut existing| {
            if index < existing.len() {
                removed = Some(existing.remove(index));
            }
            existing
        })?;
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.delete(&self.key)?;
        Ok(())
    }

    fn rewrite<F>(&self, mut f: F) -> Result<usize>
    where
        F: FnMut(Vec<HistoryEntry>) -> Vec<HistoryEntry>,
    {
        let mut failure: Option<NeoCareError> = None;
        let mut len = 0;

        self.store.update(&self.key, &mut |current| {
            let existing = match current.clone().map(decode).transpose() {
                Ok(entries) => entries.unwrap_or_default(),
                Err(e) => {
                    failure = Some(e);
                    return current.unwrap_or(Value::Array(Vec::new()));
                }
            };

            let next = f(existing);
            len = next.len();
            match serde_json::to_value(&next) {
                Ok(value) => value,
                Err(e) => {
                    failure = Some(e.into());
                    current.unwrap_or(Value::Array(Vec::new()))
                }
            }
        })?;

        match failure {
            Some(e) => Err(e),
            None => Ok(len),
        }
    }
}

fn decode(value: Value) -> Result<Vec<HistoryEntry>> {
    serde_json::from_value(value).map_err(|e| NeoCareError::Storage(format!("unreadable upload history: {}", e)))
}
