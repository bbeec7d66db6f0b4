//! Tests for configuration validation

use cmdjobs::config::{ExecMode, ServiceConfig};

#[test]
fn test_default_config_validation() {
    assert!(ServiceConfig::default().validate().is_ok());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "exec_mode": "shell",
        "inter_job_delay_ms": 100,
        "capture_stderr_on_failure": false,
        "worker_stack_size": 1048576
    }"#;

    let config = ServiceConfig::from_json_str(json).expect("valid config");
    assert_eq!(config.exec_mode, ExecMode::Shell);
    assert_eq!(config.inter_job_delay_ms, 100);
    assert!(!config.capture_stderr_on_failure);
    assert_eq!(config.worker_stack_size, 1_048_576);
}

#[test]
fn test_config_from_bad_json() {
    assert!(ServiceConfig::from_json_str("{ not json").is_err());
    assert!(ServiceConfig::from_json_str(r#"{ "worker_stack_size": 0 }"#).is_err());
}

#[test]
fn test_exec_mode_parse() {
    assert_eq!("direct".parse::<ExecMode>(), Ok(ExecMode::Direct));
    assert_eq!(" SHELL ".parse::<ExecMode>(), Ok(ExecMode::Shell));
    assert!("bash".parse::<ExecMode>().is_err());
}

#[test]
fn test_config_from_env_defaults() {
    // No CMDJOBS_* variables are set in the test environment.
    let config = ServiceConfig::from_env().expect("environment config");
    assert_eq!(config.exec_mode, ExecMode::Direct);
    assert!(config.validate().is_ok());
}

#[test]
fn test_service_from_env() {
    let service = cmdjobs::core::JobService::from_env().expect("service from environment");
    assert!(service.is_running());
    service.shutdown();
}
