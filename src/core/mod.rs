//! Job lifecycle engine: records, store, execution and the worker loop.

pub mod audit;
pub mod error;
pub mod executor;
pub mod job;
pub mod service;
pub mod store;
pub mod worker;

pub use audit::{build_job_event, AuditSink, InMemoryAuditSink, JobEvent};
pub use error::{AppResult, JobError};
pub use executor::{
    CommandExecutor, ExecutionOutcome, ProcessExecutor, StopSignal, INTERRUPTED_RESULT,
};
pub use job::{Job, JobId, JobStatus};
pub use service::{JobService, JobView};
pub use store::{JobStore, StoreStats};
pub use worker::Worker;
