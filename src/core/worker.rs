//! The single background worker that executes queued jobs.
//!
//! The worker runs on a dedicated OS thread with its own single-threaded tokio
//! runtime, so child-process I/O never competes with the caller's runtime.
//!
//! # Design Principles
//!
//! - **No polling**: the thread blocks on a channel `recv` until a job id arrives
//! - **One at a time**: jobs run sequentially in dequeue order
//! - **Clean shutdown**: dropping the sender unblocks an idle worker; a stop
//!   signal asks the executor to kill and reap an in-flight job's child
//!
//! A hung command stalls every job queued behind it. There is no per-job timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::error::JobError;
use super::executor::{CommandExecutor, ExecutionOutcome, StopSignal, INTERRUPTED_RESULT};
use super::job::{JobId, JobStatus};
use super::store::JobStore;
use crate::config::ServiceConfig;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);
/// How long an executor may take to wind down after stop before it is dropped.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Handle to the running worker thread.
pub struct Worker {
    /// Work queue sender. `None` once shut down.
    queue_tx: Mutex<Option<Sender<JobId>>>,
    /// Interrupts an in-flight job.
    stop_tx: watch::Sender<bool>,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Start the worker thread.
    ///
    /// Before blocking on the queue, the worker sweeps the store for jobs that
    /// are already `Pending`, so a pre-populated store is drained too.
    ///
    /// # Errors
    ///
    /// - `JobError::InvalidConfig` if `config` does not validate
    /// - `JobError::Internal` if the OS refuses to spawn the thread
    pub fn spawn<E>(
        store: Arc<JobStore>,
        executor: E,
        config: &ServiceConfig,
    ) -> Result<Self, JobError>
    where
        E: CommandExecutor,
    {
        config.validate().map_err(JobError::InvalidConfig)?;

        let (queue_tx, queue_rx) = unbounded::<JobId>();
        let (stop_tx, stop_rx) = watch::channel(false);
        let shutdown = Arc::new(AtomicBool::new(false));

        let ctx = LoopContext {
            store,
            executor,
            queue_rx,
            stop: StopSignal::new(stop_rx),
            shutdown: Arc::clone(&shutdown),
            inter_job_delay: config.inter_job_delay(),
        };

        let handle = thread::Builder::new()
            .name("cmdjobs-worker".into())
            .stack_size(config.worker_stack_size)
            .spawn(move || ctx.run())
            .map_err(|e| JobError::Internal(format!("failed to spawn worker thread: {e}")))?;

        info!(
            exec_mode = ?config.exec_mode,
            inter_job_delay_ms = config.inter_job_delay_ms,
            "Worker started"
        );

        Ok(Self {
            queue_tx: Mutex::new(Some(queue_tx)),
            stop_tx,
            shutdown,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Hand a job id to the worker. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Shutdown` once the worker has been stopped.
    pub fn enqueue(&self, id: JobId) -> Result<(), JobError> {
        let queue_tx = self.queue_tx.lock();
        let Some(tx) = queue_tx.as_ref() else {
            return Err(JobError::Shutdown);
        };
        tx.send(id).map_err(|_| JobError::Shutdown)
    }

    /// Create a job with `create` and enqueue it, atomically with respect to
    /// [`Worker::shutdown`].
    ///
    /// `create` runs only while the worker still accepts jobs, so a submission
    /// racing with shutdown either lands in the queue or leaves no job behind.
    ///
    /// # Errors
    ///
    /// - `JobError::Shutdown` if the worker has been stopped; `create` is not called
    /// - `JobError::Internal` if the worker thread vanished without a shutdown
    pub fn submit_with<F>(&self, create: F) -> Result<JobId, JobError>
    where
        F: FnOnce() -> JobId,
    {
        let queue_tx = self.queue_tx.lock();
        let Some(tx) = queue_tx.as_ref() else {
            return Err(JobError::Shutdown);
        };
        let id = create();
        tx.send(id).map_err(|_| {
            error!(job_id = %id, "Worker stopped unexpectedly; job left pending");
            JobError::Internal("worker stopped unexpectedly".to_string())
        })?;
        Ok(id)
    }

    /// Whether the worker still accepts jobs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }

    /// Stop the worker and wait for its thread to exit.
    ///
    /// An in-flight job is interrupted: its child process is killed and the job
    /// is recorded as `Failed` with [`INTERRUPTED_RESULT`]. Jobs still queued
    /// stay `Pending`. Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        if !self.signal_stop() {
            return;
        }
        info!("Shutting down worker");

        let Some(handle) = self.handle.lock().take() else {
            return;
        };

        // Join on a helper thread so a wedged worker cannot hang the caller.
        let (tx, rx) = std::sync::mpsc::channel();
        let joiner = thread::spawn(move || {
            let _ = tx.send(handle.join().is_ok());
        });
        match rx.recv_timeout(JOIN_TIMEOUT) {
            Ok(true) => {
                debug!("Worker joined");
                let _ = joiner.join();
            }
            Ok(false) => {
                warn!("Worker thread panicked");
                let _ = joiner.join();
            }
            Err(_) => warn!("Worker did not exit within timeout - detaching"),
        }
        info!("Worker shut down");
    }

    /// Returns `false` if shutdown was already signalled.
    fn signal_stop(&self) -> bool {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return false;
        }
        *self.queue_tx.lock() = None;
        self.stop_tx.send_replace(true);
        true
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Signal only; joining here could block a dropping async task.
        if self.signal_stop() {
            debug!("Worker dropped without explicit shutdown - thread will be detached");
        }
    }
}

/// Everything the worker thread owns.
struct LoopContext<E> {
    store: Arc<JobStore>,
    executor: E,
    queue_rx: Receiver<JobId>,
    stop: StopSignal,
    shutdown: Arc<AtomicBool>,
    inter_job_delay: Duration,
}

impl<E: CommandExecutor> LoopContext<E> {
    fn run(mut self) {
        debug!("Worker thread started");

        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!(error = %e, "Failed to create worker runtime");
                return;
            }
        };

        for (id, _) in self.store.list_pending() {
            if self.stopped() {
                break;
            }
            self.run_job(&rt, id);
        }

        while !self.stopped() {
            // Blocks until a job arrives or every sender is dropped.
            let Ok(id) = self.queue_rx.recv() else {
                debug!("Worker channel closed, exiting");
                break;
            };
            if self.stopped() {
                break;
            }
            self.run_job(&rt, id);
        }

        debug!("Worker thread exiting");
    }

    fn stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn run_job(&mut self, rt: &Runtime, id: JobId) {
        let command = match self.store.get(id) {
            Ok(job) => job.command,
            Err(e) => {
                warn!(job_id = %id, error = %e, "Dequeued unknown job");
                return;
            }
        };

        // Already picked up (e.g. by the start-up sweep) or otherwise not Pending.
        if let Err(e) = self.store.update_status(id, JobStatus::Running, None) {
            debug!(job_id = %id, error = %e, "Skipping job");
            return;
        }
        debug!(job_id = %id, "Worker executing job");

        let executor = &self.executor;
        let mut stop = self.stop.clone();
        let outcome = rt.block_on(async {
            let execution = executor.execute(id, &command, stop.clone());
            tokio::pin!(execution);

            tokio::select! {
                outcome = &mut execution => outcome,
                () = stop.stopped() => {
                    // The executor saw the same signal; let it kill and reap its child.
                    match tokio::time::timeout(STOP_GRACE, execution).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(job_id = %id, "Executor ignored stop, dropping job");
                            ExecutionOutcome::failed(INTERRUPTED_RESULT)
                        }
                    }
                }
            }
        });

        if let Err(e) = self
            .store
            .update_status(id, outcome.status, Some(outcome.result))
        {
            error!(job_id = %id, error = %e, "Failed to record job outcome");
        }

        if !self.inter_job_delay.is_zero() && !self.stopped() {
            let delay = self.inter_job_delay;
            let stop = &mut self.stop;
            rt.block_on(async {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = stop.stopped() => {}
                }
            });
        }
    }
}
