// src/engine/status.rs

//! Operational visibility: queue occupancy, per-task activity and counters.
//!
//! The board is shared (`Arc`) by the scheduler loop, the generator, the
//! worker and the alert engine. Callers render [`StatusSnapshot`] however
//! they like; nothing here formats output.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::TaskDefinition;
use crate::engine::queue::BoundedQueue;
use crate::types::TaskKind;

/// Per-task activity timestamps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskActivity {
    pub last_fired: Option<DateTime<Utc>>,
    pub last_completed: Option<DateTime<Utc>>,
    pub firings: u64,
    pub completions: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    pub name: String,
    pub kind: TaskKind,
    #[serde(flatten)]
    pub activity: TaskActivity,
}

/// Point-in-time copy of everything on the board.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub queue_len: usize,
    pub queue_capacity: usize,
    pub notifications_sent: u64,
    pub executions: u64,
    pub failed_executions: u64,
    pub questions_recorded: u64,
    pub exploratory_skipped_queue_full: u64,
    pub exploratory_duplicates: u64,
    pub generation_failures: u64,
    pub structured_retries: u64,
    pub tasks: Vec<TaskStatus>,
}

#[derive(Debug, Default)]
struct Counters {
    notifications_sent: AtomicU64,
    executions: AtomicU64,
    failed_executions: AtomicU64,
    questions_recorded: AtomicU64,
    exploratory_skipped_queue_full: AtomicU64,
    exploratory_duplicates: AtomicU64,
    generation_failures: AtomicU64,
    structured_retries: AtomicU64,
}

#[derive(Debug)]
pub struct RuntimeStatus {
    queue: Arc<BoundedQueue>,
    order: Vec<(String, TaskKind)>,
    activity: Mutex<HashMap<String, TaskActivity>>,
    counters: Counters,
}

impl RuntimeStatus {
    pub fn new(queue: Arc<BoundedQueue>, tasks: &[Arc<TaskDefinition>]) -> Self {
        let order = tasks.iter().map(|t| (t.name.clone(), t.kind)).collect();
        let activity = tasks
            .iter()
            .map(|t| (t.name.clone(), TaskActivity::default()))
            .collect();

        Self {
            queue,
            order,
            activity: Mutex::new(activity),
            counters: Counters::default(),
        }
    }

    fn activity(&self) -> MutexGuard<'_, HashMap<String, TaskActivity>> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn record_fired(&self, task: &str, at: DateTime<Utc>) {
        let mut map = self.activity();
        let entry = map.entry(task.to_string()).or_default();
        entry.last_fired = Some(at);
        entry.firings += 1;
    }

    pub fn record_completed(&self, task: &str, at: DateTime<Utc>, success: bool) {
        {
            let mut map = self.activity();
            let entry = map.entry(task.to_string()).or_default();
            entry.last_completed = Some(at);
            entry.completions += 1;
        }
        self.counters.executions.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.counters.failed_executions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_notification(&self) {
        self.counters.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_question(&self) {
        self.counters.questions_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_full(&self) {
        self.counters
            .exploratory_skipped_queue_full
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.counters
            .exploratory_duplicates
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generation_failure(&self) {
        self.counters
            .generation_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_structured_retry(&self) {
        self.counters
            .structured_retries
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn notifications_sent(&self) -> u64 {
        self.counters.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn task_activity(&self, task: &str) -> Option<TaskActivity> {
        self.activity().get(task).cloned()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let activity = self.activity();
        let tasks = self
            .order
            .iter()
            .map(|(name, kind)| TaskStatus {
                name: name.clone(),
                kind: *kind,
                activity: activity.get(name).cloned().unwrap_or_default(),
            })
            .collect();
        drop(activity);

        let c = &self.counters;
        StatusSnapshot {
            queue_len: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            notifications_sent: c.notifications_sent.load(Ordering::Relaxed),
            executions: c.executions.load(Ordering::Relaxed),
            failed_executions: c.failed_executions.load(Ordering::Relaxed),
            questions_recorded: c.questions_recorded.load(Ordering::Relaxed),
            exploratory_skipped_queue_full: c
                .exploratory_skipped_queue_full
                .load(Ordering::Relaxed),
            exploratory_duplicates: c.exploratory_duplicates.load(Ordering::Relaxed),
            generation_failures: c.generation_failures.load(Ordering::Relaxed),
            structured_retries: c.structured_retries.load(Ordering::Relaxed),
            tasks,
        }
    }
}
