//! Upload history pruning
//!
//! The log is ordered most-recent-first and capped.

use crate::types::HistoryEntry;

pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Prepend `new` (already newest-first) to `existing`, then cap
pub fn merge_entries(new: Vec<HistoryEntry>, existing: Vec<HistoryEntry>, cap: usize) -> Vec<HistoryEntry> {
    let mut merged = new;
    merged.extend(existing);
    prune(merged, cap)
}

/// Keep the first `cap` entries
pub fn prune(mut entries: Vec<HistoryEntry>, cap: usize) -> Vec<HistoryEntry> {
    entries.truncate(cap);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(name: &str) -> HistoryEntry {
        HistoryEntry {
            name: name.to_string(),
            size_bytes: 10,
            mime_type: "image/png".to_string(),
            added_at: Utc::now(),
            preview: String::new(),
        }
    }

    #[test]
    fn test_merge_prepends() {
        let merged = merge_entries(vec![entry("c")], vec![entry("b"), entry("a")], DEFAULT_HISTORY_CAP);
        let names: Vec<_> = merged.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut log = Vec::new();
        for i in 0..120 {
            log = merge_entries(vec![entry(&i.to_string())], log, DEFAULT_HISTORY_CAP);
            assert!(log.len() <= DEFAULT_HISTORY_CAP);
        }
        assert_eq!(log.len(), 50);
        assert_eq!(log[0].name, "119");
        assert_eq!(log[49].name, "70");
    }

    #[test]
    fn test_prune_under_cap_is_unchanged() {
        let log = prune(vec![entry("a"), entry("b")], 5);
        assert_eq!(log.len(), 2);
        assert!(prune(log, 0).is_empty());
    }
}
