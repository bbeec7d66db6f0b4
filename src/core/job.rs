//! Job record, identifier and lifecycle state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, globally unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of a job.
///
/// The only legal path is `Pending -> Running -> {Failed | Succeeded}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, waiting for the worker.
    Pending,
    /// Currently executing.
    Running,
    /// Finished unsuccessfully (spawn error, non-zero exit, signal, shutdown).
    Failed,
    /// Exited with status zero.
    Succeeded,
}

impl JobStatus {
    /// Whether this status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Succeeded)
    }

    /// Whether `self -> next` is an edge of the state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running) | (Self::Running, Self::Failed | Self::Succeeded)
        )
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted command and its execution state.
///
/// Values handed out by the store are snapshots; mutating one has no effect on
/// the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier.
    pub id: JobId,
    /// Command line to execute.
    pub command: String,
    /// Reserved for completion notification; stored but never dereferenced.
    pub callback_url: Option<String>,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Captured output or failure description; set together with a terminal status.
    pub result: Option<String>,
    /// Creation order within this process.
    pub seq: u64,
    /// Creation timestamp in milliseconds since epoch.
    pub created_at_ms: u128,
    /// Set when the job enters `Running`.
    pub started_at_ms: Option<u128>,
    /// Set when the job enters a terminal status.
    pub finished_at_ms: Option<u128>,
}

impl Job {
    /// Create a new job in `Pending`.
    #[must_use]
    pub fn new(id: JobId, seq: u64, command: String, callback_url: Option<String>) -> Self {
        Self {
            id,
            command,
            callback_url,
            status: JobStatus::Pending,
            result: None,
            seq,
            created_at_ms: crate::util::clock::now_ms(),
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    /// Whether the job has reached a final status.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Succeeded));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        // skipping Running
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Succeeded));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Failed));
        // regressions and self-loops
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Running));
        for terminal in [JobStatus::Failed, JobStatus::Succeeded] {
            for next in [
                JobStatus::Pending,
                JobStatus::Running,
                JobStatus::Failed,
                JobStatus::Succeeded,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&JobStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
        assert_eq!(JobStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn test_job_id_parse() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new(JobId::new(), 0, "echo hi".into(), None);
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.result.is_none());
        assert!(!job.is_finished());
    }
}
