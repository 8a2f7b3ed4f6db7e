// src/schedule/scheduler.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::TaskDefinition;
use crate::schedule::cadence::describe_cadence;
use crate::schedule::timer::{CadenceTimer, TimerState};

/// Options controlling how timers are armed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleOptions {
    /// First firing at start instead of one cadence after start.
    pub fire_on_start: bool,
    /// Retire every timer after its first firing (used for `--once`).
    pub one_shot: bool,
}

/// A single `Due` event handed to the question generator.
#[derive(Debug, Clone)]
pub struct Firing {
    pub task: Arc<TaskDefinition>,
    /// Position of the task in configuration order.
    pub index: usize,
    /// The instant this firing was scheduled for (may be in the past when
    /// the poll ran late).
    pub scheduled_for: Instant,
    pub fired_at: DateTime<Utc>,
    /// 1-based firing count for this task.
    pub ordinal: u64,
}

/// Timer wheel holding one [`CadenceTimer`] per task.
///
/// This is a synchronous, deterministic core: the async shell asks for
/// [`next_deadline`](Self::next_deadline), sleeps until then and calls
/// [`poll_due`](Self::poll_due). Firings that are due at the same instant
/// come out in configuration order. Overdue timers emit every missed firing
/// so that structured demand piles up instead of being silently skipped.
#[derive(Debug)]
pub struct CadenceScheduler {
    timers: Vec<CadenceTimer>,
}

impl CadenceScheduler {
    pub fn new(tasks: &[Arc<TaskDefinition>], start: Instant, options: ScheduleOptions) -> Self {
        let timers = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let first_due = if options.fire_on_start {
                    start
                } else {
                    start + task.cadence
                };
                info!(
                    task = %task.name,
                    kind = %task.kind,
                    cadence = %describe_cadence(task.cadence),
                    alert_mode = %task.alert_mode,
                    "scheduled task"
                );
                CadenceTimer::new(idx, Arc::clone(task), first_due, options.one_shot)
            })
            .collect();

        Self { timers }
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest armed deadline, or `None` when every timer is retired.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().filter_map(CadenceTimer::next_due).min()
    }

    /// `true` once no timer will fire again.
    pub fn is_exhausted(&self) -> bool {
        self.next_deadline().is_none()
    }

    pub fn state_of(&self, task: &str) -> Option<TimerState> {
        self.timers
            .iter()
            .find(|t| t.task().name == task)
            .map(CadenceTimer::state)
    }

    pub fn firings_of(&self, task: &str) -> Option<u64> {
        self.timers
            .iter()
            .find(|t| t.task().name == task)
            .map(CadenceTimer::firings)
    }

    /// Fire every timer due at or before `now`.
    ///
    /// Ordered by scheduled time, ties broken by configuration order. Each
    /// timer goes `Idle -> Due -> Idle` (or `Retired` in one-shot mode).
    pub fn poll_due(&mut self, now: Instant) -> Vec<Firing> {
        let mut firings = Vec::new();
        let fired_at = Utc::now();

        loop {
            let next = self
                .timers
                .iter()
                .filter(|t| t.is_due(now))
                .filter_map(|t| t.next_due().map(|due| (due, t.index())))
                .min();

            let Some((_, idx)) = next else {
                break;
            };

            let timer = &mut self.timers[idx];
            let scheduled_for = timer.fire();
            let firing = Firing {
                task: Arc::clone(timer.task()),
                index: idx,
                scheduled_for,
                fired_at,
                ordinal: timer.firings(),
            };
            timer.rearm();

            debug!(
                task = %firing.task.name,
                ordinal = firing.ordinal,
                late_ms = now.saturating_duration_since(scheduled_for).as_millis() as u64,
                "task due"
            );
            firings.push(firing);
        }

        firings
    }

    /// Retire every timer; no further firings will be produced.
    pub fn stop(&mut self) {
        for timer in &mut self.timers {
            timer.retire();
        }
        debug!("cadence scheduler stopped");
    }
}
