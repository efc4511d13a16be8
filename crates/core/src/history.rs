//! Bounded newest-first log of successful conversions.
//!
//! History entries are immutable snapshots taken at the moment a job
//! completes. They live independently of the registry: the retention
//! sweep evicts terminal job records, but history entries stay until
//! capacity pushes them out.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::job::PlanType;
use crate::types::Timestamp;

/// Number of entries kept when no capacity override is given.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Immutable snapshot of one successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub job_id: String,
    pub output_file: PathBuf,
    pub plan_type: PlanType,
    pub projection: String,
    pub file_size_bytes: u64,
    pub completed_at: Timestamp,
    pub submitted_by: String,
    pub project: Option<String>,
}

/// Capacity-bounded log, newest entries first.
pub struct HistoryLog {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    fn locked(&self) -> MutexGuard<'_, VecDeque<HistoryEntry>> {
        self.entries.lock().expect("history log mutex poisoned")
    }

    /// Prepend an entry, evicting the oldest beyond capacity.
    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.locked();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Snapshot of all entries, newest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.locked().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(job_id: &str) -> HistoryEntry {
        HistoryEntry {
            job_id: job_id.to_string(),
            output_file: PathBuf::from(format!("/out/{job_id}.dxf")),
            plan_type: PlanType::KeyPlan,
            projection: "EPSG:3857".to_string(),
            file_size_bytes: 1024,
            completed_at: Utc::now(),
            submitted_by: "tester".to_string(),
            project: None,
        }
    }

    #[test]
    fn list_returns_newest_first() {
        let log = HistoryLog::new(10);
        log.append(entry("first"));
        log.append(entry("second"));
        log.append(entry("third"));

        let entries = log.list();
        let ids: Vec<&str> = entries.iter().map(|e| e.job_id.as_str()).collect();
        assert_eq!(ids, vec!["third", "second", "first"]);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let log = HistoryLog::new(3);
        for i in 0..4 {
            log.append(entry(&format!("job-{i}")));
        }

        let entries = log.list();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].job_id, "job-3");
        assert!(entries.iter().all(|e| e.job_id != "job-0"));
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let log = HistoryLog::new(5);
        for i in 0..20 {
            log.append(entry(&format!("job-{i}")));
            assert!(log.len() <= 5);
        }
    }

    #[test]
    fn default_uses_standard_capacity() {
        let log = HistoryLog::default();
        assert!(log.is_empty());
        for i in 0..(DEFAULT_HISTORY_CAPACITY + 10) {
            log.append(entry(&format!("job-{i}")));
        }
        assert_eq!(log.len(), DEFAULT_HISTORY_CAPACITY);
    }
}
