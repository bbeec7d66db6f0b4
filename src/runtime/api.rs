//! API-facing request/response models.
//!
//! These mirror the JSON shapes of an HTTP front end (`POST /jobs`,
//! `GET /jobs/{id}`) without binding to any server framework.

use serde::{Deserialize, Serialize};

use crate::core::{JobError, JobId, JobService, JobView};

/// Job submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Command line to execute.
    pub command: String,
    /// Optional completion callback; stored, never called.
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Returned on accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Identifier to poll with.
    pub id: JobId,
}

/// Response wrapper: `{"status": "ok" | "error", "attributes": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "attributes", rename_all = "snake_case")]
pub enum ApiEnvelope<T> {
    /// Successful call.
    Ok(T),
    /// Failed call.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl<T> ApiEnvelope<T> {
    /// Wrap a service result.
    pub fn from_result(result: Result<T, JobError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Worker still accepting jobs.
    pub ok: bool,
}

/// Submit a job on behalf of a transport handler.
///
/// # Errors
///
/// See [`JobService::submit`].
pub fn submit_job(service: &JobService, req: SubmitRequest) -> Result<SubmitResponse, JobError> {
    service
        .submit(&req.command, req.callback_url)
        .map(|id| SubmitResponse { id })
}

/// Query a job by its raw identifier, as taken from a URL path.
///
/// An identifier that does not parse cannot name a job, so it is reported as
/// not found rather than as a validation error.
///
/// # Errors
///
/// Returns `JobError::NotFound` for malformed or unknown identifiers.
pub fn query_job(service: &JobService, raw_id: &str) -> Result<JobView, JobError> {
    let id: JobId = raw_id
        .trim()
        .parse()
        .map_err(|_| JobError::NotFound(raw_id.to_string()))?;
    service.query(id)
}

/// HTTP status a front end should answer with for an error.
#[must_use]
pub const fn status_code(err: &JobError) -> u16 {
    match err {
        JobError::Validation(_) => 400,
        JobError::NotFound(_) => 404,
        JobError::Shutdown => 503,
        JobError::InvalidTransition { .. }
        | JobError::InvalidResult(_)
        | JobError::InvalidConfig(_)
        | JobError::Internal(_) => 500,
    }
}

/// Return a health payload.
#[must_use]
pub fn health(service: &JobService) -> Health {
    Health {
        ok: service.is_running(),
    }
}
