//! Unit tests for individual components

mod api_test;
mod audit_test;
mod config_test;
mod error_test;
mod util_test;
