//! Error types for job engine operations.

use thiserror::Error;

use super::job::{JobId, JobStatus};

/// Errors produced by the job store, submission and query paths.
///
/// A command that fails to run is *not* an error here: it is recorded on the
/// job as [`JobStatus::Failed`] and surfaced through a later query.
#[derive(Debug, Error)]
pub enum JobError {
    /// Submission input was rejected; no job was created.
    #[error("validation failed: {0}")]
    Validation(String),
    /// No job exists under the given identifier.
    #[error("job not found: {0}")]
    NotFound(String),
    /// The requested status change is not allowed by the job state machine.
    #[error("invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        /// Job being transitioned.
        id: JobId,
        /// Status the job currently holds.
        from: JobStatus,
        /// Status that was requested.
        to: JobStatus,
    },
    /// A result was supplied for a non-terminal status, or omitted for a terminal one.
    #[error("result must be set exactly when entering a terminal status (got {0})")]
    InvalidResult(JobStatus),
    /// The service has been shut down and accepts no new work.
    #[error("service has been shut down")]
    Shutdown,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal failure with context (worker thread, channel, runtime).
    #[error("internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// Build a `NotFound` error for a known identifier.
    #[must_use]
    pub fn not_found(id: JobId) -> Self {
        Self::NotFound(id.to_string())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
