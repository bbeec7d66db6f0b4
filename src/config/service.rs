//! Service and worker configuration.

use std::time::Duration;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable selecting [`ExecMode`] (`direct` or `shell`).
pub const ENV_EXEC_MODE: &str = "CMDJOBS_EXEC_MODE";
/// Environment variable for the inter-job pause in milliseconds.
pub const ENV_INTER_JOB_DELAY_MS: &str = "CMDJOBS_INTER_JOB_DELAY_MS";
/// Environment variable toggling stderr capture in failure results.
pub const ENV_CAPTURE_STDERR: &str = "CMDJOBS_CAPTURE_STDERR";
/// Environment variable for the worker thread stack size in bytes.
pub const ENV_WORKER_STACK_SIZE: &str = "CMDJOBS_WORKER_STACK_SIZE";

const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 64 * 1024;

/// How a submitted command line is turned into a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Split on whitespace and execute the first word with the rest as arguments.
    /// No quoting, globbing or redirection.
    #[default]
    Direct,
    /// Hand the whole line to `sh -c`.
    Shell,
}

impl std::str::FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "shell" => Ok(Self::Shell),
            other => Err(format!("unknown exec mode `{other}` (expected `direct` or `shell`)")),
        }
    }
}

/// Configuration for [`crate::core::JobService`] and its worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Command line interpretation.
    pub exec_mode: ExecMode,
    /// Pause after each job, in milliseconds.
    pub inter_job_delay_ms: u64,
    /// Append captured stderr to the failure description of non-zero exits.
    pub capture_stderr_on_failure: bool,
    /// Stack size for the worker thread, in bytes.
    pub worker_stack_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            exec_mode: ExecMode::Direct,
            inter_job_delay_ms: 0,
            capture_stderr_on_failure: true,
            worker_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution mode.
    #[must_use]
    pub const fn with_exec_mode(mut self, mode: ExecMode) -> Self {
        self.exec_mode = mode;
        self
    }

    /// Set the pause between jobs.
    #[must_use]
    pub const fn with_inter_job_delay_ms(mut self, ms: u64) -> Self {
        self.inter_job_delay_ms = ms;
        self
    }

    /// Toggle stderr capture for failed jobs.
    #[must_use]
    pub const fn with_capture_stderr_on_failure(mut self, capture: bool) -> Self {
        self.capture_stderr_on_failure = capture;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = bytes;
        self
    }

    /// Pause between jobs as a `Duration`.
    #[must_use]
    pub const fn inter_job_delay(&self) -> Duration {
        Duration::from_millis(self.inter_job_delay_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_stack_size < MIN_STACK_SIZE {
            return Err(format!(
                "worker_stack_size must be at least {MIN_STACK_SIZE} bytes"
            ));
        }
        if self.inter_job_delay_ms > 60_000 {
            return Err("inter_job_delay_ms must not exceed 60000".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by process environment, after loading `.env` if present.
    ///
    /// Supported variables: `CMDJOBS_EXEC_MODE`, `CMDJOBS_INTER_JOB_DELAY_MS`,
    /// `CMDJOBS_CAPTURE_STDERR`, `CMDJOBS_WORKER_STACK_SIZE`.
    ///
    /// # Errors
    ///
    /// Fails with a message naming the malformed variable, or a validation message.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| std::env::var(key).ok())
            .map_err(|e| anyhow!("invalid environment override: {e}"))?;
        cfg.validate()
            .map_err(|e| anyhow!("invalid configuration from environment: {e}"))?;
        Ok(cfg)
    }

    /// Apply overrides from an arbitrary key lookup (environment, map, ...).
    ///
    /// # Errors
    ///
    /// Returns a message naming the first malformed value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_EXEC_MODE) {
            self.exec_mode = mode.parse().map_err(|e| format!("{ENV_EXEC_MODE}: {e}"))?;
        }
        if let Some(delay) = lookup(ENV_INTER_JOB_DELAY_MS) {
            self.inter_job_delay_ms = delay
                .trim()
                .parse()
                .map_err(|_| format!("invalid {ENV_INTER_JOB_DELAY_MS} value: {delay}"))?;
        }
        if let Some(val) = lookup(ENV_CAPTURE_STDERR) {
            self.capture_stderr_on_failure = parse_bool(&val)
                .ok_or_else(|| format!("invalid {ENV_CAPTURE_STDERR} value: {val}"))?;
        }
        if let Some(size) = lookup(ENV_WORKER_STACK_SIZE) {
            self.worker_stack_size = size
                .trim()
                .parse()
                .map_err(|_| format!("invalid {ENV_WORKER_STACK_SIZE} value: {size}"))?;
        }
        Ok(())
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
