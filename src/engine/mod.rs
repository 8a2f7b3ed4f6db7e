// src/engine/mod.rs

//! Orchestration engine for querywatch.
//!
//! This module ties together:
//! - the bounded work queue shared by both lanes
//! - the work items flowing through it
//! - the cooperative shutdown signal
//! - the status board (queue occupancy, per-task activity, counters)
//! - the main runtime loop that reacts to:
//!   - cadence deadlines
//!   - finished structured retries and exploratory generations
//!   - periodic status ticks
//!   - shutdown signals
//!
//! The pure timer wheel lives in [`crate::schedule`]; the async shell is
//! implemented in [`runtime`].

pub mod queue;
pub mod runtime;
pub mod shutdown;
pub mod status;
pub mod work;

pub use queue::{BoundedQueue, DEFAULT_CAPACITY, EnqueueError};
pub use runtime::{Runtime, RuntimeOptions};
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use status::{RuntimeStatus, StatusSnapshot, TaskActivity, TaskStatus};
pub use work::{ExecutionResult, WorkItem, WorkRequest};
