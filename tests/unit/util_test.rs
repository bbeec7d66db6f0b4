//! Tests for utility functions

use cmdjobs::util::{init_tracing, now_ms};

#[test]
fn test_now_ms() {
    assert!(now_ms() > 1_600_000_000_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!(component = "util_test", "tracing initialised");
}
