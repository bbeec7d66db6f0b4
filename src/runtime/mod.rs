//! Transport-facing request/response models and thin submit/query adapters.

pub mod api;

pub use api::{query_job, submit_job, ApiEnvelope, SubmitRequest, SubmitResponse};
