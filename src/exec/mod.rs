// src/exec/mod.rs

//! Query execution layer.
//!
//! - [`backend`] provides the `QueryExecutor` trait and the command-backed
//!   implementation used in production; tests replace it with a fake.
//! - [`process`] runs shell commands for every command-backed collaborator.
//! - [`worker`] owns the single consumer loop over the work queue.

pub mod backend;
pub mod process;
pub mod worker;

pub use backend::{CommandQueryExecutor, QueryExecutor};
pub use process::{CommandOutput, run_command};
pub use worker::{ExecutionWorker, LanePrefixes};
