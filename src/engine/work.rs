// src/engine/work.rs

//! Units of work flowing through the queue.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::TaskDefinition;
use crate::types::TaskKind;

/// A question ready to be admitted into the queue.
///
/// The queue turns an admitted request into a [`WorkItem`] by stamping the
/// sequence number and enqueue time.
#[derive(Debug, Clone)]
pub struct WorkRequest {
    pub task: Arc<TaskDefinition>,
    pub question: String,
}

impl WorkRequest {
    pub fn new(task: Arc<TaskDefinition>, question: impl Into<String>) -> Self {
        Self {
            task,
            question: question.into(),
        }
    }

    /// Request for a structured task, using its fixed question.
    ///
    /// Returns `None` for exploratory tasks.
    pub fn structured(task: &Arc<TaskDefinition>) -> Option<Self> {
        let question = task.question.clone()?;
        Some(Self::new(Arc::clone(task), question))
    }
}

/// A queued (or in-flight) unit of work.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub task: Arc<TaskDefinition>,
    /// Resolved question text.
    pub question: String,
    pub kind: TaskKind,
    pub enqueued_at: DateTime<Utc>,
    /// Monotonically increasing admission number.
    pub seq: u64,
}

impl WorkItem {
    pub fn task_name(&self) -> &str {
        &self.task.name
    }
}

/// Outcome of executing one [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub text: String,
    pub success: bool,
    /// Failure detail when `success` is false.
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            success: false,
            error: Some(detail.into()),
            completed_at: Utc::now(),
        }
    }
}
