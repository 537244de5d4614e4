use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::segments::{SegmentName, SegmentPlan};
use crate::template::CommandTemplate;

use super::dry_run::print_plan;
use super::executor::{CommandExecutor, CommandOutput};
use super::{DispatchConfig, DispatchError, DispatchSummary, WorkItem};

/// Holds the first failure seen by any worker. Later failures are logged but not kept.
#[derive(Clone, Default)]
struct FailureSlot {
    first: Arc<Mutex<Option<DispatchError>>>,
}

impl FailureSlot {
    fn record(&self, err: DispatchError) {
        let mut slot = self.first.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        } else {
            debug!(event = "secondary_failure", error = %err, "ignoring failure after the first");
        }
    }

    fn take(&self) -> Option<DispatchError> {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Counters shared by the producer and the workers, readable while a run is in
/// progress. They accumulate over the lifetime of the dispatcher.
#[derive(Debug, Default)]
pub struct DispatchProgress {
    enqueued: AtomicUsize,
    completed: AtomicUsize,
}

impl DispatchProgress {
    /// Items accepted by the work queue so far.
    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::Acquire)
    }

    /// Commands that exited successfully so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

/// Coordinates the producer, the worker pool and the fail-fast policy.
pub struct Dispatcher<E> {
    executor: Arc<E>,
    config: DispatchConfig,
    shutdown: CancellationToken,
    progress: Arc<DispatchProgress>,
}

impl<E> Dispatcher<E>
where
    E: CommandExecutor + 'static,
{
    /// `shutdown` is an external stop signal (SIGINT/SIGTERM in the binary). Cancelling
    /// it has the same effect on in-flight work as a command failure.
    pub fn new(executor: E, config: DispatchConfig, shutdown: CancellationToken) -> Self {
        Self {
            executor: Arc::new(executor),
            config,
            shutdown,
            progress: Arc::new(DispatchProgress::default()),
        }
    }

    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    pub fn progress(&self) -> Arc<DispatchProgress> {
        self.progress.clone()
    }

    /// Processes every eligible segment of `plan` exactly once. The frontier is never
    /// touched. In dry-run mode the intended commands are written to `out` instead.
    pub async fn run<W: Write>(
        &self,
        directory: &Path,
        plan: &SegmentPlan,
        template: &CommandTemplate,
        out: &mut W,
    ) -> Result<DispatchSummary, DispatchError> {
        if self.config.dry_run {
            return print_plan(directory, plan, template, out);
        }

        let (dispatched, completed) = self.dispatch(directory, &plan.eligible, template).await?;
        info!(
            event = "dispatch_complete",
            completed,
            frontier = %plan.frontier,
            "processed all segments except the newest"
        );

        Ok(DispatchSummary {
            eligible: plan.eligible.len(),
            dispatched,
            completed,
            frontier: plan.frontier.clone(),
            dry_run: false,
        })
    }

    /// Live path: fan the segments out to the worker pool and wait for all of it.
    ///
    /// Returns `(dispatched, completed)` on success.
    async fn dispatch(
        &self,
        directory: &Path,
        segments: &[SegmentName],
        template: &CommandTemplate,
    ) -> Result<(usize, usize), DispatchError> {
        let worker_count = self.config.worker_count.max(1);
        let (sender, receiver) = flume::bounded::<WorkItem>(self.config.queue_capacity.max(1));
        let cancel = self.shutdown.child_token();
        let failures = FailureSlot::default();

        info!(
            event = "dispatch_starting",
            segments = segments.len(),
            workers = worker_count,
            queue_capacity = self.config.queue_capacity.max(1),
            "dispatching segments"
        );

        let mut worker_handles = Vec::with_capacity(worker_count);
        for worker_idx in 0..worker_count {
            let worker = Worker {
                worker_idx,
                executor: self.executor.clone(),
                receiver: receiver.clone(),
                cancel: cancel.clone(),
                failures: failures.clone(),
                progress: self.progress.clone(),
            };
            worker_handles.push(tokio::spawn(worker.run()));
        }
        drop(receiver);

        let dispatched = enqueue_segments(
            directory,
            segments,
            template,
            sender,
            &cancel,
            &self.progress,
        )
        .await;

        let mut completed = 0usize;
        let mut join_error = None;
        for handle in worker_handles {
            match handle.await {
                Ok(worker_completed) => completed += worker_completed,
                Err(err) => {
                    cancel.cancel();
                    join_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = failures.take() {
            return Err(err);
        }
        if let Some(err) = join_error {
            return Err(DispatchError::WorkerJoin(err));
        }
        if completed < segments.len() {
            warn!(
                event = "dispatch_interrupted",
                dispatched,
                completed,
                pending = segments.len() - completed,
                "shutdown requested before all segments were processed"
            );
            return Err(DispatchError::Interrupted);
        }

        Ok((dispatched, completed))
    }
}

/// Producer side: expands and enqueues in ascending order. Blocks while the queue is
/// full and stops as soon as the run is cancelled.
async fn enqueue_segments(
    directory: &Path,
    segments: &[SegmentName],
    template: &CommandTemplate,
    sender: Sender<WorkItem>,
    cancel: &CancellationToken,
    progress: &DispatchProgress,
) -> usize {
    let mut dispatched = 0usize;
    for segment in segments {
        let item = WorkItem::new(directory, segment, template);
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            sent = sender.send_async(item) => sent.is_ok(),
        };
        if !sent {
            debug!(
                event = "producer_stopped",
                dispatched,
                "no longer accepting work"
            );
            break;
        }
        dispatched += 1;
        progress.enqueued.fetch_add(1, Ordering::AcqRel);
    }
    dispatched
}

struct Worker<E> {
    worker_idx: usize,
    executor: Arc<E>,
    receiver: Receiver<WorkItem>,
    cancel: CancellationToken,
    failures: FailureSlot,
    progress: Arc<DispatchProgress>,
}

impl<E> Worker<E>
where
    E: CommandExecutor + 'static,
{
    /// Drains the queue one item at a time. Returns the number of commands that
    /// succeeded.
    async fn run(self) -> usize {
        let mut completed = 0usize;

        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.receiver.recv_async() => match received {
                    Ok(item) => item,
                    Err(_) => break,
                },
            };

            debug!(
                event = "segment_started",
                worker = self.worker_idx,
                segment = %item.segment,
                command = %item.command.to_string_lossy(),
                "running process command"
            );

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(
                        event = "segment_abandoned",
                        worker = self.worker_idx,
                        segment = %item.segment,
                        "abandoning in-flight command"
                    );
                    break;
                }
                outcome = self.executor.execute(&item.command) => outcome,
            };

            match check_outcome(&item, outcome) {
                Ok(()) => {
                    completed += 1;
                    self.progress.completed.fetch_add(1, Ordering::AcqRel);
                    debug!(
                        event = "segment_processed",
                        worker = self.worker_idx,
                        segment = %item.segment,
                        "process command succeeded"
                    );
                }
                Err(err) => {
                    self.failures.record(err);
                    self.cancel.cancel();
                    break;
                }
            }
        }

        completed
    }
}

fn check_outcome(
    item: &WorkItem,
    outcome: std::io::Result<CommandOutput>,
) -> Result<(), DispatchError> {
    let output = match outcome {
        Ok(output) => output,
        Err(source) => {
            error!(
                event = "process_command_spawn_failed",
                segment = %item.segment,
                error = %source,
                "could not start process command"
            );
            return Err(DispatchError::Spawn {
                segment: item.segment.clone(),
                source,
            });
        }
    };

    if output.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    error!(
        event = "process_command_failed",
        segment = %item.segment,
        command = %item.command.to_string_lossy(),
        exit_code = ?output.code,
        "process command failed"
    );
    if !stderr.is_empty() {
        error!(
            event = "process_command_output",
            segment = %item.segment,
            "program output:\n{}",
            stderr.trim_end()
        );
    }

    Err(DispatchError::CommandFailed {
        segment: item.segment.clone(),
        command: item.command.clone(),
        code: output.code,
        stderr,
    })
}
