//! Command execution abstraction and the default process-backed executor.

use std::process::{ExitStatus, Output, Stdio};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{info, warn};

use super::job::{JobId, JobStatus};
use crate::config::{ExecMode, ServiceConfig};

/// Result recorded for a job whose execution was cut short by shutdown.
pub const INTERRUPTED_RESULT: &str = "job interrupted by shutdown";

/// Shutdown notification handed to an executor for the duration of one job.
///
/// A channel closed without a stop having been sent never resolves.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    /// Wrap the receiving half of a stop channel.
    #[must_use]
    pub const fn new(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    /// Whether stop has already been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once stop is requested.
    pub async fn stopped(&mut self) {
        if self.0.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Terminal outcome of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// `Succeeded` or `Failed`.
    pub status: JobStatus,
    /// Standard output on success, a non-empty failure description otherwise.
    pub result: String,
}

impl ExecutionOutcome {
    /// Successful run with captured stdout.
    #[must_use]
    pub const fn succeeded(stdout: String) -> Self {
        Self {
            status: JobStatus::Succeeded,
            result: stdout,
        }
    }

    /// Failed run. An empty description is replaced so the result is never blank.
    #[must_use]
    pub fn failed(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            status: JobStatus::Failed,
            result: if description.trim().is_empty() {
                "command failed".to_string()
            } else {
                description
            },
        }
    }
}

/// Runs a job's command line and reports its terminal outcome.
///
/// Launch errors are not surfaced as `Err`: they collapse into a `Failed`
/// outcome, the same as a non-zero exit.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use cmdjobs::core::{CommandExecutor, ExecutionOutcome, JobId, StopSignal};
///
/// struct Echo;
///
/// #[async_trait]
/// impl CommandExecutor for Echo {
///     async fn execute(&self, _id: JobId, command: &str, _stop: StopSignal) -> ExecutionOutcome {
///         ExecutionOutcome::succeeded(command.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandExecutor: Send + Sync + 'static {
    /// Execute `command` for job `id`.
    ///
    /// Called from the worker thread's single-threaded runtime. When `stop`
    /// fires, the executor should release its resources (kill and reap any
    /// child) and return `Failed` with [`INTERRUPTED_RESULT`]. Executors that
    /// ignore `stop` are dropped by the worker after a short grace period.
    async fn execute(&self, id: JobId, command: &str, stop: StopSignal) -> ExecutionOutcome;
}

/// Spawns each command as a child process on the local host.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    mode: ExecMode,
    capture_stderr_on_failure: bool,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(ExecMode::Direct)
    }
}

impl ProcessExecutor {
    /// Executor with the given mode; stderr is included in failure descriptions.
    #[must_use]
    pub const fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            capture_stderr_on_failure: true,
        }
    }

    /// Executor configured from service settings.
    #[must_use]
    pub const fn from_config(config: &ServiceConfig) -> Self {
        Self {
            mode: config.exec_mode,
            capture_stderr_on_failure: config.capture_stderr_on_failure,
        }
    }

    fn build_command(&self, command: &str) -> Option<Command> {
        let mut cmd = match self.mode {
            ExecMode::Direct => {
                let mut words = command.split_whitespace();
                let mut cmd = Command::new(words.next()?);
                cmd.args(words);
                cmd
            }
            ExecMode::Shell => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(command);
                cmd
            }
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Some(cmd)
    }

    fn process_output(&self, id: JobId, result: std::io::Result<Output>) -> ExecutionOutcome {
        match result {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                info!(job_id = %id, bytes = stdout.len(), "Job succeeded");
                ExecutionOutcome::succeeded(stdout)
            }
            Ok(output) => {
                let mut description = describe_exit(output.status);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim_end();
                if self.capture_stderr_on_failure && !stderr.is_empty() {
                    description.push_str(": ");
                    description.push_str(stderr);
                }
                warn!(job_id = %id, exit_code = ?output.status.code(), "Job failed");
                ExecutionOutcome::failed(description)
            }
            Err(e) => {
                warn!(job_id = %id, error = %e, "Job could not be launched");
                ExecutionOutcome::failed(format!("failed to launch command: {e}"))
            }
        }
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, id: JobId, command: &str, mut stop: StopSignal) -> ExecutionOutcome {
        info!(job_id = %id, command, mode = ?self.mode, "Executing job");

        let Some(mut cmd) = self.build_command(command) else {
            warn!(job_id = %id, "Job has no program to run");
            return ExecutionOutcome::failed("failed to launch command: empty command line");
        };

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return self.process_output(id, Err(e)),
        };
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Pipes are drained while waiting so a chatty child cannot block on a full pipe.
        let finished = tokio::select! {
            (status, stdout, stderr) = async {
                tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
            } => Some((status, stdout, stderr)),
            () = stop.stopped() => None,
        };

        let Some((status, stdout, stderr)) = finished else {
            // kill() also waits, so the child is reaped before the runtime goes away.
            if let Err(e) = child.kill().await {
                warn!(job_id = %id, error = %e, "Failed to kill interrupted job");
            }
            warn!(job_id = %id, "Job interrupted by shutdown");
            return ExecutionOutcome::failed(INTERRUPTED_RESULT);
        };

        let result = status.map(|status| Output {
            status,
            stdout,
            stderr,
        });
        self.process_output(id, result)
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit status {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {signal}");
        }
    }
    "process terminated abnormally".to_string()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_echo() {
        let outcome = ProcessExecutor::default()
            .execute(JobId::new(), "echo hi", StopSignal::never())
            .await;
        assert_eq!(outcome, ExecutionOutcome::succeeded("hi\n".into()));
    }

    #[tokio::test]
    async fn test_direct_does_not_interpret_shell_syntax() {
        let outcome = ProcessExecutor::default()
            .execute(JobId::new(), "echo a && echo b", StopSignal::never())
            .await;
        assert_eq!(outcome.status, JobStatus::Succeeded);
        assert_eq!(outcome.result, "a && echo b\n");
    }

    #[tokio::test]
    async fn test_shell_mode() {
        let outcome = ProcessExecutor::new(ExecMode::Shell)
            .execute(JobId::new(), "echo a && echo b", StopSignal::never())
            .await;
        assert_eq!(outcome.result, "a\nb\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_with_stderr() {
        let outcome = ProcessExecutor::new(ExecMode::Shell)
            .execute(JobId::new(), "echo oops >&2; exit 3", StopSignal::never())
            .await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.result, "exit status 3: oops");
    }

    #[tokio::test]
    async fn test_stderr_capture_disabled() {
        let executor = ProcessExecutor::from_config(
            &ServiceConfig::new()
                .with_exec_mode(ExecMode::Shell)
                .with_capture_stderr_on_failure(false),
        );
        let outcome = executor
            .execute(JobId::new(), "echo oops >&2; exit 3", StopSignal::never())
            .await;
        assert_eq!(outcome.result, "exit status 3");
    }

    #[tokio::test]
    async fn test_missing_program_fails() {
        let outcome = ProcessExecutor::default()
            .execute(
                JobId::new(),
                "definitely-not-a-real-binary-cmdjobs --flag",
                StopSignal::never(),
            )
            .await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(outcome.result.starts_with("failed to launch command"));
    }

    #[tokio::test]
    async fn test_blank_command_fails() {
        let outcome = ProcessExecutor::default()
            .execute(JobId::new(), "   ", StopSignal::never())
            .await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(!outcome.result.is_empty());
    }

    #[tokio::test]
    async fn test_killed_by_signal() {
        let outcome = ProcessExecutor::new(ExecMode::Shell)
            .execute(JobId::new(), "kill -9 $$", StopSignal::never())
            .await;
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.result, "terminated by signal 9");
    }

    #[tokio::test]
    async fn test_large_output_is_drained() {
        let outcome = ProcessExecutor::default()
            .execute(JobId::new(), "seq 1 100000", StopSignal::never())
            .await;
        assert_eq!(outcome.status, JobStatus::Succeeded);
        assert_eq!(outcome.result.lines().count(), 100_000);
    }

    #[tokio::test]
    async fn test_stop_kills_and_reaps_child() {
        let (tx, rx) = watch::channel(false);
        let executor = ProcessExecutor::default();
        let run = executor.execute(JobId::new(), "sleep 30", StopSignal::new(rx));
        let stopper = async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            tx.send_replace(true);
        };

        let start = std::time::Instant::now();
        let (outcome, ()) = tokio::join!(run, stopper);
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(outcome, ExecutionOutcome::failed(INTERRUPTED_RESULT));
    }

    #[test]
    fn test_stop_signal_states() {
        let (tx, rx) = watch::channel(false);
        let signal = StopSignal::new(rx);
        assert!(!signal.is_stopped());
        tx.send_replace(true);
        assert!(signal.is_stopped());
        assert!(!StopSignal::never().is_stopped());
    }

    #[test]
    fn test_failed_never_blank() {
        assert_eq!(ExecutionOutcome::failed("").result, "command failed");
    }
}
