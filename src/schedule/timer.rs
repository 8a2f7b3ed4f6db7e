// src/schedule/timer.rs

//! Per-task cadence timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::TaskDefinition;

/// Scheduling state of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Waiting for `next_due`.
    Idle,
    /// Fired; being handed to the generator.
    Due,
    /// No further firings (shutdown, or one-shot mode after its firing).
    Retired,
}

/// Repeating timer for one [`TaskDefinition`].
///
/// Re-arming adds the cadence to the *scheduled* firing time, so the
/// schedule is firing-to-firing and a late poll does not shift later
/// firings.
#[derive(Debug, Clone)]
pub struct CadenceTimer {
    task: Arc<TaskDefinition>,
    index: usize,
    interval: Duration,
    next_due: Instant,
    state: TimerState,
    firings: u64,
    one_shot: bool,
}

impl CadenceTimer {
    pub fn new(index: usize, task: Arc<TaskDefinition>, first_due: Instant, one_shot: bool) -> Self {
        // A zero cadence would make `poll_due` spin; validated configs never have one.
        let interval = task.cadence.max(Duration::from_millis(1));
        Self {
            task,
            index,
            interval,
            next_due: first_due,
            state: TimerState::Idle,
            firings: 0,
            one_shot,
        }
    }

    pub fn task(&self) -> &Arc<TaskDefinition> {
        &self.task
    }

    /// Position of the task in configuration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn firings(&self) -> u64 {
        self.firings
    }

    /// Next firing time, if the timer is still armed.
    pub fn next_due(&self) -> Option<Instant> {
        match self.state {
            TimerState::Idle => Some(self.next_due),
            TimerState::Due | TimerState::Retired => None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.state == TimerState::Idle && self.next_due <= now
    }

    /// `Idle -> Due`. Returns the scheduled firing time.
    pub fn fire(&mut self) -> Instant {
        debug_assert_eq!(self.state, TimerState::Idle);
        self.state = TimerState::Due;
        self.firings += 1;
        self.next_due
    }

    /// `Due -> Idle`, armed for the next cadence step.
    pub fn rearm(&mut self) {
        if self.state != TimerState::Due {
            return;
        }
        if self.one_shot {
            self.state = TimerState::Retired;
            return;
        }
        self.next_due += self.interval;
        self.state = TimerState::Idle;
    }

    pub fn retire(&mut self) {
        self.state = TimerState::Retired;
    }
}
