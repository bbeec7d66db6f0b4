//! # cmdjobs
//!
//! A minimal asynchronous command-execution engine. A caller submits a command
//! line, gets an opaque job id back immediately, and later polls for the job's
//! status and output.
//!
//! ## Job lifecycle
//!
//! Every job follows exactly one path:
//!
//! ```text
//! Pending -> Running -> Succeeded | Failed
//! ```
//!
//! - **Pending**: accepted by [`core::JobService::submit`], waiting in the work queue
//! - **Running**: picked up by the single background worker
//! - **Succeeded**: the process exited with status zero; the result is its stdout
//! - **Failed**: the process could not be launched, exited non-zero, was killed
//!   by a signal, or was interrupted by shutdown; the result describes why
//!
//! ## Key Features
//!
//! - **Concurrency-safe store**: [`core::JobStore`] validates every transition and
//!   never exposes a half-updated record
//! - **No polling**: the worker blocks on a channel until work arrives
//! - **Sequential execution**: at most one job runs at a time, on a dedicated
//!   OS thread with its own tokio runtime
//! - **Audit trail**: attach an [`core::AuditSink`] to observe every transition
//!
//! ```rust,ignore
//! use cmdjobs::core::{JobService, JobStatus};
//!
//! cmdjobs::util::init_tracing();
//! let service = JobService::from_env()?;
//!
//! let id = service.submit("echo hi", None)?;
//! // ... later
//! let view = service.query(id)?;
//! if view.status == JobStatus::Succeeded {
//!     println!("{}", view.result.unwrap_or_default());
//! }
//! service.shutdown();
//! ```
//!
//! ## Limitations
//!
//! - Jobs are held in memory only and are never evicted.
//! - Commands run with the privileges of the host process. Do not expose
//!   submission to untrusted callers without an external sandbox.
//! - There is no per-job timeout; a hung command blocks the jobs behind it.
//! - `callback_url` is stored but never called.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Job records, store, executor, worker loop and service facade.
pub mod core;
/// Configuration models for the service and worker.
pub mod config;
/// Transport-facing request/response models.
pub mod runtime;
/// Shared utilities.
pub mod util;
