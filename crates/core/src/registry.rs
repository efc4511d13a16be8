//! Concurrency-safe in-memory store of conversion job records.
//!
//! The registry owns the only map touched by multiple concurrent actors
//! (submitters, the launching task, status pollers, the retention
//! sweep), so all access goes through methods that lock the map and
//! hand out cloned snapshots. Status and progress mutation is reserved
//! for the launching task that owns the job (single-writer discipline);
//! the typed methods below keep the state machine monotonic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::job::{JobRecord, JobStatus, NewJob};
use crate::types::Timestamp;

/// In-memory job store keyed by job id.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.lock().expect("job registry mutex poisoned")
    }

    /// Create a pending record and return a snapshot of it.
    ///
    /// Ids are UUIDv4, so they cannot collide with any live or
    /// previously evicted id.
    pub fn create(&self, new: NewJob) -> JobRecord {
        let record = JobRecord {
            id: Uuid::new_v4().to_string(),
            input_path: new.input_path,
            requested_output_name: new.requested_output_name,
            options: new.options,
            status: JobStatus::Pending,
            progress: 0,
            message: "Conversion queued".to_string(),
            created_at: Utc::now(),
            completed_at: None,
            error_message: None,
            output_file: None,
            stats: serde_json::Map::new(),
            submitted_by: new.submitted_by,
            project: new.project,
        };

        self.locked().insert(record.id.clone(), record.clone());
        record
    }

    /// Snapshot of a record by id.
    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.locked().get(id).cloned()
    }

    /// Snapshots of all records still pending or processing, newest first.
    pub fn list_active(&self) -> Vec<JobRecord> {
        let mut active: Vec<JobRecord> = self
            .locked()
            .values()
            .filter(|job| !job.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.locked().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    // -----------------------------------------------------------------------
    // Mutators used by the launching task (single writer per job)
    // -----------------------------------------------------------------------

    /// Move a pending job to `processing` with its initial progress and
    /// narrative. No-op if the record is gone or already past pending.
    pub fn start_processing(&self, id: &str, progress: u8, message: &str) {
        let mut jobs = self.locked();
        if let Some(job) = jobs.get_mut(id) {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Processing;
                job.progress = progress;
                job.message = message.to_string();
            }
        }
    }

    /// Apply a progress milestone while the job is processing.
    ///
    /// Progress is monotonic: a value at or below the current one is
    /// ignored. Updates to jobs that are not processing are ignored.
    pub fn update_progress(&self, id: &str, progress: u8, message: &str) {
        let mut jobs = self.locked();
        if let Some(job) = jobs.get_mut(id) {
            if job.status == JobStatus::Processing && progress > job.progress {
                job.progress = progress;
                job.message = message.to_string();
            }
        }
    }

    /// Finalize a successful job and return the updated snapshot.
    ///
    /// Sets `completed_at` (exactly once), progress 100, the output
    /// artifact, and the merged stats. Returns `None` if the record is
    /// gone or already terminal.
    pub fn complete(
        &self,
        id: &str,
        output_file: PathBuf,
        stats: serde_json::Map<String, serde_json::Value>,
    ) -> Option<JobRecord> {
        let mut jobs = self.locked();
        let job = jobs.get_mut(id)?;
        if job.status.is_terminal() {
            return None;
        }
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.message = "Conversion completed".to_string();
        job.completed_at = Some(Utc::now());
        job.output_file = Some(output_file);
        job.stats = stats;
        Some(job.clone())
    }

    /// Finalize a failed job and return the updated snapshot.
    ///
    /// Sets the error message and resets progress to 0. `completed_at`
    /// stays absent: it marks successful completion only. Returns
    /// `None` if the record is gone or already terminal.
    pub fn fail(&self, id: &str, error: &str) -> Option<JobRecord> {
        let mut jobs = self.locked();
        let job = jobs.get_mut(id)?;
        if job.status.is_terminal() {
            return None;
        }
        job.status = JobStatus::Error;
        job.progress = 0;
        job.message = error.to_string();
        job.error_message = Some(error.to_string());
        Some(job.clone())
    }

    // -----------------------------------------------------------------------
    // Retention
    // -----------------------------------------------------------------------

    /// Evict terminal records created before `cutoff`.
    ///
    /// Pending and processing records are never touched regardless of
    /// age: a long-running job must not vanish mid-flight. Returns the
    /// number of records removed.
    pub fn reap_terminal_older_than(&self, cutoff: Timestamp) -> usize {
        let mut jobs = self.locked();
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.created_at < cutoff));
        before - jobs.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
