// src/exec/backend.rs

//! Pluggable query-executor abstraction.
//!
//! The worker talks to a `QueryExecutor` instead of spawning processes
//! itself. Production uses [`CommandQueryExecutor`]; tests provide a fake
//! that returns scripted results without spawning anything.

use async_trait::async_trait;

use crate::config::ExecutorSettings;
use crate::errors::{QuerywatchError, Result};
use crate::exec::process::run_with_timeout;

/// Answers a natural-language question against the dataset.
///
/// An `Err` means the execution failed (malformed query, backend down,
/// timeout); the worker turns it into a failed result for alerting.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, question: &str) -> Result<String>;
}

/// Executor backed by an external command.
///
/// The question is exported as `QUERYWATCH_QUESTION` and also written to the
/// command's stdin. Stdout is the result text.
#[derive(Debug, Clone)]
pub struct CommandQueryExecutor {
    settings: ExecutorSettings,
}

impl CommandQueryExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl QueryExecutor for CommandQueryExecutor {
    async fn execute(&self, question: &str) -> Result<String> {
        let output = run_with_timeout(
            &self.settings.cmd,
            self.settings.timeout,
            Some(question),
            &[("QUERYWATCH_QUESTION", question)],
        )
        .await
        .map_err(|e| QuerywatchError::collaborator("query executor", format!("{e:#}")))?;

        if !output.success {
            return Err(QuerywatchError::collaborator(
                "query executor",
                output.failure_detail(),
            ));
        }

        Ok(output.stdout.trim().to_string())
    }
}
