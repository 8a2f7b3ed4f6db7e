// src/engine/runtime.rs

use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, Interval};
use tracing::{debug, info, warn};

use crate::engine::queue::BoundedQueue;
use crate::engine::shutdown::ShutdownSignal;
use crate::engine::status::{RuntimeStatus, StatusSnapshot};
use crate::errors::Result;
use crate::exec::ExecutionWorker;
use crate::generate::{QuestionGenerator, StructuredAdmission};
use crate::schedule::{CadenceScheduler, Firing};
use crate::types::TaskKind;

/// Options for the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Let the worker finish queued items after shutdown instead of
    /// discarding them.
    pub drain_on_shutdown: bool,
    /// Log a status line at this interval.
    pub status_interval: Option<Duration>,
    /// Exit once every timer is retired and no follow-up work is pending
    /// (used with one-shot scheduling for `--once`).
    pub exit_when_idle: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            drain_on_shutdown: true,
            status_interval: None,
            exit_when_idle: false,
        }
    }
}

enum LoopEvent {
    Shutdown,
    Due,
    Joined(std::result::Result<(), JoinError>),
    StatusTick,
}

/// Drives the cadence scheduler and hands firings to the question
/// generator, while the execution worker consumes the queue in its own task.
///
/// The scheduler itself is a pure timer wheel; this struct only does the
/// async part: sleeping until the next deadline, spawning structured
/// retries and exploratory generation, and coordinating shutdown.
pub struct Runtime {
    scheduler: CadenceScheduler,
    generator: Arc<QuestionGenerator>,
    worker: Option<ExecutionWorker>,
    queue: Arc<BoundedQueue>,
    status: Arc<RuntimeStatus>,
    shutdown: ShutdownSignal,
    options: RuntimeOptions,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("queue_len", &self.queue.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        scheduler: CadenceScheduler,
        generator: Arc<QuestionGenerator>,
        worker: ExecutionWorker,
        status: Arc<RuntimeStatus>,
        shutdown: ShutdownSignal,
        options: RuntimeOptions,
    ) -> Self {
        let queue = Arc::clone(generator.queue());
        Self {
            scheduler,
            generator,
            worker: Some(worker),
            queue,
            status,
            shutdown,
            options,
        }
    }

    /// Main loop. Returns the final status once the worker has stopped.
    pub async fn run(mut self) -> Result<StatusSnapshot> {
        info!(
            tasks = self.scheduler.len(),
            capacity = self.queue.capacity(),
            "querywatch runtime started"
        );

        let worker = self.worker.take().map(|w| tokio::spawn(w.run()));
        let mut pending: JoinSet<()> = JoinSet::new();
        let mut status_tick = self
            .options
            .status_interval
            .map(|every| tokio::time::interval_at(Instant::now() + every, every));

        let mut interrupted = false;

        loop {
            if self.options.exit_when_idle && self.scheduler.is_exhausted() && pending.is_empty() {
                info!("all tasks fired once and no work is pending; stopping");
                break;
            }

            let deadline = self.scheduler.next_deadline();
            let event = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => LoopEvent::Shutdown,
                _ = sleep_until_deadline(deadline) => LoopEvent::Due,
                Some(joined) = pending.join_next(), if !pending.is_empty() => LoopEvent::Joined(joined),
                _ = next_tick(&mut status_tick) => LoopEvent::StatusTick,
            };

            match event {
                LoopEvent::Shutdown => {
                    info!("shutdown requested; stopping scheduler");
                    interrupted = true;
                    break;
                }
                LoopEvent::Due => {
                    for firing in self.scheduler.poll_due(Instant::now()) {
                        self.dispatch(firing, &mut pending);
                    }
                }
                LoopEvent::Joined(Err(e)) => {
                    warn!(error = %e, "background firing task failed");
                }
                LoopEvent::Joined(Ok(())) => {}
                LoopEvent::StatusTick => log_status(&self.status.snapshot()),
            }
        }

        self.scheduler.stop();

        // Admission closes before background tasks are joined, so nothing
        // enters the queue after this point.
        if interrupted && !self.options.drain_on_shutdown {
            let discarded = self.queue.close_and_discard();
            if discarded > 0 {
                warn!(discarded, "discarded queued work on shutdown");
            }
        } else {
            let queued = self.queue.len();
            debug!(queued, "closing queue; worker drains remaining work");
            self.queue.close();
        }

        // Retry and generation tasks watch the same signal and return.
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "background firing task failed during shutdown");
            }
        }

        if let Some(worker) = worker {
            match worker.await {
                Ok(processed) => debug!(processed, "execution worker joined"),
                Err(e) => warn!(error = %e, "execution worker task failed"),
            }
        }

        let snapshot = self.status.snapshot();
        log_status(&snapshot);
        info!("querywatch runtime exiting");
        Ok(snapshot)
    }

    /// Route one firing to its lane.
    fn dispatch(&self, firing: Firing, pending: &mut JoinSet<()>) {
        let task = firing.task;
        self.status.record_fired(&task.name, firing.fired_at);

        match task.kind {
            TaskKind::Structured => match self.generator.admit_structured(&task) {
                StructuredAdmission::Admitted { .. } | StructuredAdmission::Closed => {}
                StructuredAdmission::QueueFull(request) => {
                    let generator = Arc::clone(&self.generator);
                    let shutdown = self.shutdown.clone();
                    pending.spawn(async move {
                        generator.retry_structured(request, shutdown).await;
                    });
                }
            },
            TaskKind::Exploratory => {
                if self.generator.skip_when_full(&task) {
                    return;
                }
                let generator = Arc::clone(&self.generator);
                let shutdown = self.shutdown.clone();
                pending.spawn(async move {
                    let outcome = generator.explore(&task, shutdown).await;
                    debug!(task = %task.name, ?outcome, "exploratory firing finished");
                });
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(i) => {
            i.tick().await;
        }
        None => future::pending().await,
    }
}

fn log_status(snapshot: &StatusSnapshot) {
    info!(
        queue_len = snapshot.queue_len,
        queue_capacity = snapshot.queue_capacity,
        notifications_sent = snapshot.notifications_sent,
        executions = snapshot.executions,
        failed_executions = snapshot.failed_executions,
        skipped_queue_full = snapshot.exploratory_skipped_queue_full,
        duplicates = snapshot.exploratory_duplicates,
        structured_retries = snapshot.structured_retries,
        "status"
    );
    for task in &snapshot.tasks {
        debug!(
            task = %task.name,
            kind = %task.kind,
            last_fired = ?task.activity.last_fired,
            last_completed = ?task.activity.last_completed,
            firings = task.activity.firings,
            completions = task.activity.completions,
            "task status"
        );
    }
}
