//! Configuration models for the job service and worker.

pub mod service;

pub use service::{ExecMode, ServiceConfig};
