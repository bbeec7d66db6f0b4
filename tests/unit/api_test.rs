//! Tests for transport models

use cmdjobs::core::{JobId, JobStatus, JobView};
use cmdjobs::runtime::{ApiEnvelope, SubmitRequest};

#[test]
fn test_submit_request_fields() {
    let req: SubmitRequest = serde_json::from_str(
        r#"{"command": "ls -la", "callback_url": "https://example.test/hook"}"#,
    )
    .unwrap();
    assert_eq!(req.command, "ls -la");
    assert_eq!(req.callback_url.as_deref(), Some("https://example.test/hook"));
}

#[test]
fn test_submit_request_requires_command() {
    assert!(serde_json::from_str::<SubmitRequest>(r#"{"callback_url": "x"}"#).is_err());
}

#[test]
fn test_query_envelope() {
    let id = JobId::new();
    let envelope = ApiEnvelope::Ok(JobView {
        id,
        status: JobStatus::Failed,
        result: Some("exit status 2".into()),
    });

    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["attributes"]["id"], id.to_string());
    assert_eq!(json["attributes"]["status"], "failed");
    assert_eq!(json["attributes"]["result"], "exit status 2");

    let back: ApiEnvelope<JobView> = serde_json::from_value(json).unwrap();
    assert_eq!(back, envelope);
}
