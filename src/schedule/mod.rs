// src/schedule/mod.rs

//! Cadence-based scheduling.
//!
//! - [`cadence`] parses duration strings like `"1h"`.
//! - [`timer`] holds the per-task `Idle -> Due -> Idle` timer.
//! - [`scheduler`] is the timer wheel polled by the runtime loop.

pub mod cadence;
pub mod scheduler;
pub mod timer;

pub use cadence::{describe_cadence, parse_duration, parse_positive_duration};
pub use scheduler::{CadenceScheduler, Firing, ScheduleOptions};
pub use timer::{CadenceTimer, TimerState};
