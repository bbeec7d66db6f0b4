//! Tests for error types

use cmdjobs::core::{JobError, JobId, JobStatus};

#[test]
fn test_validation_error() {
    let err = JobError::Validation("command must not be empty".to_string());
    assert_eq!(format!("{}", err), "validation failed: command must not be empty");
}

#[test]
fn test_not_found_error() {
    let err = JobError::NotFound("abc".to_string());
    assert_eq!(format!("{}", err), "job not found: abc");

    let id = JobId::new();
    assert_eq!(JobError::not_found(id).to_string(), format!("job not found: {id}"));
}

#[test]
fn test_invalid_transition_error() {
    let id = JobId::new();
    let err = JobError::InvalidTransition {
        id,
        from: JobStatus::Succeeded,
        to: JobStatus::Running,
    };
    assert_eq!(
        format!("{}", err),
        format!("invalid transition for job {id}: succeeded -> running")
    );
}

#[test]
fn test_shutdown_error() {
    assert_eq!(JobError::Shutdown.to_string(), "service has been shut down");
}
