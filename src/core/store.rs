//! Concurrency-safe job store.
//!
//! Design:
//! - `RwLock` over the id -> record map (read-heavy, write only on create)
//! - Per-record `Mutex` so status, result and timestamps change together and a
//!   reader never observes a half-applied transition
//! - Atomic sequence counter for submission ordering
//!
//! Records are never removed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::audit::{build_job_event, AuditSink};
use super::error::JobError;
use super::job::{Job, JobId, JobStatus};
use crate::util::clock::now_ms;

/// Count of jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// All jobs ever created.
    pub total: usize,
    /// Jobs waiting for the worker.
    pub pending: usize,
    /// Jobs currently executing.
    pub running: usize,
    /// Jobs that ended in `Failed`.
    pub failed: usize,
    /// Jobs that ended in `Succeeded`.
    pub succeeded: usize,
}

/// Holds every job created during the process lifetime.
pub struct JobStore {
    entries: RwLock<HashMap<JobId, Arc<Mutex<Job>>>>,
    next_seq: AtomicU64,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            audit: None,
        }
    }

    /// Attach an audit sink receiving creation and transition events.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Insert a new `Pending` job and return its identifier.
    pub fn create(&self, command: impl Into<String>, callback_url: Option<String>) -> JobId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let command = command.into();

        let mut entries = self.entries.write();
        let mut id = JobId::new();
        while entries.contains_key(&id) {
            warn!(job_id = %id, "Job id collision, regenerating");
            id = JobId::new();
        }
        entries.insert(id, Arc::new(Mutex::new(Job::new(id, seq, command, callback_url))));
        if let Some(audit) = &self.audit {
            audit.record(build_job_event(id, None, JobStatus::Pending));
        }
        drop(entries);

        debug!(job_id = %id, seq, "Job created");
        id
    }

    /// Snapshot of a job.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` if no job has this id.
    pub fn get(&self, id: JobId) -> Result<Job, JobError> {
        let record = self.record(id).ok_or_else(|| JobError::not_found(id))?;
        let job = record.lock().clone();
        Ok(job)
    }

    /// Snapshot of all `Pending` jobs in submission order.
    ///
    /// The map lock is released before records are inspected, so concurrent
    /// `create` calls are never blocked for the duration of the scan. Jobs
    /// inserted after the map snapshot show up in the next call.
    #[must_use]
    pub fn list_pending(&self) -> Vec<(JobId, Job)> {
        let records: Vec<Arc<Mutex<Job>>> = self.entries.read().values().cloned().collect();

        let mut pending: Vec<(JobId, Job)> = records
            .iter()
            .filter_map(|record| {
                let job = record.lock();
                (job.status == JobStatus::Pending).then(|| (job.id, job.clone()))
            })
            .collect();
        pending.sort_by_key(|(_, job)| job.seq);
        pending
    }

    /// Move a job to `new_status`, setting `result` when it becomes terminal.
    ///
    /// # Errors
    ///
    /// - `JobError::NotFound` for an unknown id
    /// - `JobError::InvalidTransition` if the edge is not in the state machine
    /// - `JobError::InvalidResult` if `result` is given for a non-terminal status
    ///   or missing for a terminal one
    pub fn update_status(
        &self,
        id: JobId,
        new_status: JobStatus,
        result: Option<String>,
    ) -> Result<(), JobError> {
        if result.is_some() != new_status.is_terminal() {
            return Err(JobError::InvalidResult(new_status));
        }

        let record = self.record(id).ok_or_else(|| JobError::not_found(id))?;
        let mut job = record.lock();

        let from = job.status;
        if !from.can_transition_to(new_status) {
            return Err(JobError::InvalidTransition {
                id,
                from,
                to: new_status,
            });
        }

        let now = now_ms();
        job.status = new_status;
        if new_status.is_terminal() {
            job.result = result;
            job.finished_at_ms = Some(now);
        } else {
            job.started_at_ms = Some(now);
        }

        if let Some(audit) = &self.audit {
            audit.record(build_job_event(id, Some(from), new_status));
        }
        Ok(())
    }

    /// Number of jobs ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no job has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Per-status counts.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let records: Vec<Arc<Mutex<Job>>> = self.entries.read().values().cloned().collect();
        let mut stats = StoreStats {
            total: records.len(),
            ..StoreStats::default()
        };
        for record in &records {
            match record.lock().status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Succeeded => stats.succeeded += 1,
            }
        }
        stats
    }

    fn record(&self, id: JobId) -> Option<Arc<Mutex<Job>>> {
        self.entries.read().get(&id).cloned()
    }
}
