//! Submission and query entry points over a store and its worker.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{AppResult, JobError};
use super::executor::{CommandExecutor, ProcessExecutor};
use super::job::{Job, JobId, JobStatus};
use super::store::{JobStore, StoreStats};
use super::worker::Worker;
use crate::config::ServiceConfig;

/// What a query reports about a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    /// Job identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// Output or failure description; present only once terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        let result = if job.status.is_terminal() { job.result } else { None };
        Self {
            id: job.id,
            status: job.status,
            result,
        }
    }
}

/// Accepts commands, hands them to the background worker, answers status queries.
///
/// Submission never waits for execution; callers poll with [`JobService::query`].
///
/// ```rust,ignore
/// use cmdjobs::config::ServiceConfig;
/// use cmdjobs::core::JobService;
///
/// let service = JobService::from_env()?;
/// let id = service.submit("echo hi", None)?;
/// let view = service.query(id)?;
/// ```
pub struct JobService {
    store: Arc<JobStore>,
    worker: Worker,
}

impl JobService {
    /// Service running commands as local processes.
    ///
    /// # Errors
    ///
    /// See [`Worker::spawn`].
    pub fn new(config: ServiceConfig) -> Result<Self, JobError> {
        let executor = ProcessExecutor::from_config(&config);
        Self::with_executor(config, executor)
    }

    /// Service configured from `.env` and `CMDJOBS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Fails if an override does not parse or the resulting config is invalid.
    pub fn from_env() -> AppResult<Self> {
        let config = ServiceConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    /// Service with a custom executor.
    ///
    /// # Errors
    ///
    /// See [`Worker::spawn`].
    pub fn with_executor<E: CommandExecutor>(
        config: ServiceConfig,
        executor: E,
    ) -> Result<Self, JobError> {
        Self::with_store(Arc::new(JobStore::new()), config, executor)
    }

    /// Service over an existing store (e.g. one with an audit sink attached).
    /// Jobs already `Pending` in the store are executed first.
    ///
    /// # Errors
    ///
    /// See [`Worker::spawn`].
    pub fn with_store<E: CommandExecutor>(
        store: Arc<JobStore>,
        config: ServiceConfig,
        executor: E,
    ) -> Result<Self, JobError> {
        let worker = Worker::spawn(Arc::clone(&store), executor, &config)?;
        Ok(Self { store, worker })
    }

    /// Accept a command for asynchronous execution.
    ///
    /// An empty `callback_url` is treated as absent. The URL is stored only.
    ///
    /// # Errors
    ///
    /// - `JobError::Validation` if `command` is empty or whitespace; no job is created
    /// - `JobError::Shutdown` if the service has been shut down; no job is created
    /// - `JobError::Internal` if the worker thread died without a shutdown
    pub fn submit(&self, command: &str, callback_url: Option<String>) -> Result<JobId, JobError> {
        if command.trim().is_empty() {
            return Err(JobError::Validation("command must not be empty".into()));
        }

        let callback_url = callback_url.filter(|url| !url.trim().is_empty());
        let id = self
            .worker
            .submit_with(|| self.store.create(command, callback_url))?;
        info!(job_id = %id, "Job submitted");
        Ok(id)
    }

    /// Current status of a job.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` for an unknown id.
    pub fn query(&self, id: JobId) -> Result<JobView, JobError> {
        self.store.get(id).map(JobView::from)
    }

    /// Full snapshot of a job, including command and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` for an unknown id.
    pub fn job(&self, id: JobId) -> Result<Job, JobError> {
        self.store.get(id)
    }

    /// Per-status job counts.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Whether submissions are still accepted.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Stop accepting work and stop the worker. See [`Worker::shutdown`].
    pub fn shutdown(&self) {
        self.worker.shutdown();
    }
}
