//! Upload session manager
//!
//! Holds the queued uploads of one screen, drives their simulated progress
//! while an analysis is in flight and records every added file in the
//! per-user history log.
//!
//! Item lifecycle:
//! - `Pending` on add
//! - `Analyzing` on [`UploadSession::begin_progress`], ticking up to 90
//! - `Done` (progress 100) or `Error` (progress frozen) on [`UploadSession::complete_progress`]
//! - back to `Pending` on [`UploadSession::retry`], progress kept

pub mod history;
pub mod preview;
pub mod ticker;

pub use history::HistoryLog;
pub use ticker::{start_ticker, CancelHandle};

use crate::scanner::FileRef;
use chrono::Utc;
use neocare_common::{HistoryEntry, UploadStatus};
use rand::Rng;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

pub type UploadId = Uuid;

/// Simulated progress never passes this until the call completes
pub const PROGRESS_CAP: u8 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadItem {
    pub id: UploadId,
    pub file: FileRef,
    pub progress: u8,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

type Items = Arc<Mutex<Vec<UploadItem>>>;

fn lock(items: &Items) -> MutexGuard<'_, Vec<UploadItem>> {
    items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct UploadSession {
    items: Items,
    tickers: Mutex<HashMap<UploadId, CancelHandle>>,
    history: HistoryLog,
    tick: Duration,
}

impl UploadSession {
    pub fn new(history: HistoryLog, tick: Duration) -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            tickers: Mutex::new(HashMap::new()),
            history,
            tick,
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Queue files; one history entry per file is recorded.
    ///
    /// A failure to persist history is logged and otherwise ignored.
    pub fn add_files(&self, files: Vec<FileRef>) -> Vec<UploadItem> {
        if files.is_empty() {
            return Vec::new();
        }

        let added_at = Utc::now();
        let entries: Vec<HistoryEntry> = files
            .iter()
            .map(|file| HistoryEntry {
                name: file.name.clone(),
                size_bytes: file.size(),
                mime_type: file.mime_type.clone(),
                added_at,
                preview: preview::snapshot(file),
            })
            .collect();

        let added: Vec<UploadItem> = files
            .into_iter()
            .map(|file| UploadItem {
                id: Uuid::new_v4(),
                file,
                progress: 0,
                status: UploadStatus::Pending,
            })
            .collect();

        lock(&self.items).extend(added.iter().cloned());

        if let Err(e) = self.history.append(entries) {
            tracing::warn!(key = self.history.key(), error = %e, "failed to persist upload history");
        }

        tracing::debug!(count = added.len(), "files queued");
        added
    }

    /// Start ticking the given Pending items.
    ///
    /// Ids that are unknown, not Pending, or already ticking are skipped.
    /// Returns how many tickers were started. Needs a tokio runtime.
    pub fn begin_progress(&self, ids: &[UploadId]) -> usize {
        let mut tickers = self.tickers.lock().unwrap_or_else(|p| p.into_inner());
        let mut started = 0;

        for &id in ids {
            if tickers.contains_key(&id) {
                continue;
            }

            {
                let mut items = lock(&self.items);
                match items.iter_mut().find(|item| item.id == id) {
                    Some(item) if item.status == UploadStatus::Pending => {
                        item.status = UploadStatus::Analyzing;
                    }
                    _ => continue,
                }
            }

            let items = Arc::clone(&self.items);
            let handle = start_ticker(self.tick, move || advance(&items, id));
            tickers.insert(id, handle);
            started += 1;
        }

        started
    }

    /// Requeue failed items so the next analysis picks them up.
    ///
    /// Error items go back to Pending with their progress kept; anything
    /// else is left alone. Returns how many items were requeued.
    pub fn retry(&self, ids: &[UploadId]) -> usize {
        let mut items = lock(&self.items);
        let mut requeued = 0;
        for item in items.iter_mut().filter(|item| ids.contains(&item.id)) {
            if item.status == UploadStatus::Error {
                item.status = UploadStatus::Pending;
                requeued += 1;
            }
        }
        requeued
    }

    /// Stop ticking and settle the items. Items already Done or Error are left alone.
    pub fn complete_progress(&self, ids: &[UploadId], outcome: Outcome) {
        {
            let mut tickers = self.tickers.lock().unwrap_or_else(|p| p.into_inner());
            for id in ids {
                if let Some(handle) = tickers.remove(id) {
                    handle.cancel();
                }
            }
        }

        let mut items = lock(&self.items);
        for item in items.iter_mut().filter(|item| ids.contains(&item.id)) {
            if item.status.is_terminal() {
                continue;
            }
            match outcome {
                Outcome::Success => {
                    item.progress = 100;
                    item.status = UploadStatus::Done;
                }
                Outcome::Failure => item.status = UploadStatus::Error,
            }
        }
    }

    /// Drop an item and its ticker; history is not touched
    pub fn remove(&self, id: UploadId) -> Option<UploadItem> {
        if let Some(handle) = self.tickers.lock().unwrap_or_else(|p| p.into_inner()).remove(&id) {
            handle.cancel();
        }

        let mut items = lock(&self.items);
        let index = items.iter().position(|item| item.id == id)?;
        Some(items.remove(index))
    }

    /// Snapshot of the queue in insertion order
    pub fn items(&self) -> Vec<UploadItem> {
        lock(&self.items).clone()
    }

    pub fn get(&self, id: UploadId) -> Option<UploadItem> {
        lock(&self.items).iter().find(|item| item.id == id).cloned()
    }

    pub fn files(&self, ids: &[UploadId]) -> Vec<FileRef> {
        lock(&self.items)
            .iter()
            .filter(|item| ids.contains(&item.id))
            .map(|item| item.file.clone())
            .collect()
    }

    pub fn is_ticking(&self, id: UploadId) -> bool {
        self.tickers
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&id)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn prune_history(&self, max: usize) -> crate::error::Result<usize> {
        self.history.prune(max)
    }
}

/// One tick: add 1..=5 to an Analyzing item, capped
fn advance(items: &Items, id: UploadId) -> ControlFlow<()> {
    let mut items = lock(items);
    let Some(item) = items.iter_mut().find(|item| item.id == id) else {
        return ControlFlow::Break(());
    };
    if item.status != UploadStatus::Analyzing {
        return ControlFlow::Break(());
    }

    let step: u8 = rand::thread_rng().gen_range(1..=5);
    item.progress = item.progress.saturating_add(step).min(PROGRESS_CAP).max(item.progress);

    if item.progress >= PROGRESS_CAP {
        ControlFlow::Break(())
    } else {
        ControlFlow::Continue(())
    }
}
