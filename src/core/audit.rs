//! Audit sink implementations.
//!
//! The store reports every job creation and status transition to an optional
//! sink. The in-memory sink keeps a bounded buffer that tests and operators can
//! inspect to reconstruct the status sequence a job went through.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::job::{JobId, JobStatus};
use crate::util::clock::now_ms;

/// A single lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    /// Job the event belongs to.
    pub job_id: JobId,
    /// Previous status; `None` for creation.
    pub from: Option<JobStatus>,
    /// Status entered.
    pub to: JobStatus,
    /// Timestamp milliseconds.
    pub at_ms: u128,
}

/// Audit sink abstraction.
///
/// `record` is called while the job record is locked, so events of a single job
/// arrive in transition order. Implementations must not block.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: JobEvent);
}

/// In-memory audit sink for testing and dev. Clones share the same buffer.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<JobEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Statuses entered by `id`, in order.
    #[must_use]
    pub fn history(&self, id: JobId) -> Vec<JobStatus> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.job_id == id)
            .map(|e| e.to)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: JobEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event stamped with the current time.
#[must_use]
pub fn build_job_event(job_id: JobId, from: Option<JobStatus>, to: JobStatus) -> JobEvent {
    JobEvent {
        job_id,
        from,
        to,
        at_ms: now_ms(),
    }
}
