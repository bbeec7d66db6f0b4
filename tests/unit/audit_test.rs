//! Tests for audit sink

use cmdjobs::core::{build_job_event, AuditSink, InMemoryAuditSink, JobId, JobStatus};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let id = JobId::new();

    sink.record(build_job_event(id, None, JobStatus::Pending));
    sink.record(build_job_event(id, Some(JobStatus::Pending), JobStatus::Running));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].job_id, id);
    assert_eq!(events[0].from, None);
    assert_eq!(events[1].from, Some(JobStatus::Pending));
    assert_eq!(events[1].to, JobStatus::Running);
    assert!(events[1].at_ms >= events[0].at_ms);
}

#[test]
fn test_history_unknown_job_is_empty() {
    let sink = InMemoryAuditSink::new(10);
    sink.record(build_job_event(JobId::new(), None, JobStatus::Pending));
    assert!(sink.history(JobId::new()).is_empty());
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let sink = InMemoryAuditSink::new(0);
    let id = JobId::new();

    sink.record(build_job_event(id, None, JobStatus::Pending));
    sink.record(build_job_event(id, Some(JobStatus::Pending), JobStatus::Running));

    assert!(sink.events().is_empty());
    assert!(sink.history(id).is_empty());
}
