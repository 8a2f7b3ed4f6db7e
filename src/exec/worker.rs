// src/exec/worker.rs

//! The single queue consumer.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::alert::{AlertDecision, AlertEngine};
use crate::config::ExecutorSettings;
use crate::engine::queue::BoundedQueue;
use crate::engine::status::RuntimeStatus;
use crate::engine::work::{ExecutionResult, WorkItem};
use crate::exec::backend::QueryExecutor;
use crate::types::TaskKind;

/// Optional per-lane text prepended to questions as `"<prefix>: <question>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanePrefixes {
    pub structured: Option<String>,
    pub exploratory: Option<String>,
}

impl LanePrefixes {
    pub fn from_settings(settings: &ExecutorSettings) -> Self {
        Self {
            structured: settings.structured_prefix.clone(),
            exploratory: settings.exploratory_prefix.clone(),
        }
    }

    /// Text actually sent to the executor for `question` in `kind`'s lane.
    pub fn apply(&self, kind: TaskKind, question: &str) -> String {
        let prefix = match kind {
            TaskKind::Structured => self.structured.as_deref(),
            TaskKind::Exploratory => self.exploratory.as_deref(),
        };
        match prefix.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => format!("{p}: {question}"),
            None => question.to_string(),
        }
    }
}

/// Dequeues work one item at a time, executes it and hands the result to the
/// alert engine. Failed executions are turned into failed results, never
/// dropped.
pub struct ExecutionWorker {
    queue: Arc<BoundedQueue>,
    executor: Arc<dyn QueryExecutor>,
    alerts: AlertEngine,
    status: Arc<RuntimeStatus>,
    prefixes: LanePrefixes,
}

impl ExecutionWorker {
    pub fn new(
        queue: Arc<BoundedQueue>,
        executor: Arc<dyn QueryExecutor>,
        alerts: AlertEngine,
        status: Arc<RuntimeStatus>,
    ) -> Self {
        Self {
            queue,
            executor,
            alerts,
            status,
            prefixes: LanePrefixes::default(),
        }
    }

    pub fn with_prefixes(mut self, prefixes: LanePrefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Consume until the queue is closed and empty. Returns the number of
    /// items processed.
    pub async fn run(self) -> u64 {
        let mut processed = 0;
        while let Some(item) = self.queue.dequeue().await {
            self.process(&item).await;
            processed += 1;
        }
        info!(processed, "execution worker stopped");
        processed
    }

    /// Execute one item and run it through the alert engine.
    pub async fn process(&self, item: &WorkItem) -> AlertDecision {
        let text = self.prefixes.apply(item.kind, &item.question);
        debug!(task = %item.task_name(), seq = item.seq, question = %text, "executing");

        let result = match self.executor.execute(&text).await {
            Ok(output) => ExecutionResult::success(output),
            Err(e) => {
                warn!(task = %item.task_name(), seq = item.seq, error = %e, "execution failed");
                ExecutionResult::failure(e.detail())
            }
        };

        self.status
            .record_completed(item.task_name(), result.completed_at, result.success);

        self.alerts.handle(item, &result).await
    }
}
