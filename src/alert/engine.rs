// src/alert/engine.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::alert::classifier::AnomalyClassifier;
use crate::alert::notifier::{Dispatcher, NotifyPayload};
use crate::config::TaskDefinition;
use crate::engine::status::RuntimeStatus;
use crate::engine::work::{ExecutionResult, WorkItem};
use crate::types::{AlertMode, Severity};

pub const AUTOMATIC_REASON: &str = "automatic alert";
pub const NO_ANOMALY_REASON: &str = "no anomaly detected";

/// Whether (and why) a result should be surfaced to a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDecision {
    pub notify: bool,
    pub reason: String,
    pub severity: Option<Severity>,
}

impl AlertDecision {
    fn execution_failed(detail: &str) -> Self {
        Self {
            notify: true,
            reason: format!("execution failed: {detail}"),
            severity: Some(Severity::High),
        }
    }

    fn automatic() -> Self {
        Self {
            notify: true,
            reason: AUTOMATIC_REASON.to_string(),
            severity: None,
        }
    }
}

/// Applies a task's alert policy to each execution result and dispatches
/// positive decisions.
///
/// Decision order:
/// 1. a failed execution always notifies with severity high;
/// 2. automatic mode always notifies;
/// 3. anomaly mode asks the classifier.
pub struct AlertEngine {
    classifier: Arc<dyn AnomalyClassifier>,
    dispatcher: Arc<Dispatcher>,
    status: Option<Arc<RuntimeStatus>>,
}

impl AlertEngine {
    pub fn new(classifier: Arc<dyn AnomalyClassifier>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            classifier,
            dispatcher,
            status: None,
        }
    }

    /// Count delivered notifications on `status`.
    pub fn with_status(mut self, status: Arc<RuntimeStatus>) -> Self {
        self.status = Some(status);
        self
    }

    pub async fn decide(&self, task: &TaskDefinition, result: &ExecutionResult) -> AlertDecision {
        if !result.success {
            let detail = result.error.as_deref().unwrap_or("unknown error");
            return AlertDecision::execution_failed(detail);
        }

        if task.alert_mode == AlertMode::Automatic {
            return AlertDecision::automatic();
        }

        let threshold = task.effective_threshold();
        match self.classifier.classify(&result.text, threshold).await {
            Ok(c) if c.is_anomaly => AlertDecision {
                notify: true,
                reason: if c.description.trim().is_empty() {
                    "anomaly detected".to_string()
                } else {
                    c.description
                },
                severity: c.severity,
            },
            Ok(c) => AlertDecision {
                notify: false,
                reason: if c.description.trim().is_empty() {
                    NO_ANOMALY_REASON.to_string()
                } else {
                    c.description
                },
                severity: None,
            },
            Err(e) => {
                warn!(task = %task.name, error = %e, "anomaly classification failed");
                AlertDecision {
                    notify: false,
                    reason: format!("anomaly classification failed: {}", e.detail()),
                    severity: None,
                }
            }
        }
    }

    /// Decide for `item` and, on a positive decision, notify every channel.
    ///
    /// Notification failures are logged by the dispatcher and never
    /// returned.
    pub async fn handle(&self, item: &WorkItem, result: &ExecutionResult) -> AlertDecision {
        let decision = self.decide(&item.task, result).await;

        if !decision.notify {
            debug!(task = %item.task_name(), seq = item.seq, reason = %decision.reason, "no alert");
            return decision;
        }

        info!(
            task = %item.task_name(),
            seq = item.seq,
            severity = ?decision.severity,
            reason = %decision.reason,
            "alerting"
        );

        let payload = NotifyPayload {
            task_name: item.task_name().to_string(),
            kind: item.kind,
            reason: decision.reason.clone(),
            severity: decision.severity,
            question: item.question.clone(),
            timestamp: result.completed_at,
        };

        if self.dispatcher.notify(&payload).await {
            if let Some(status) = &self.status {
                status.record_notification();
            }
        } else if !self.dispatcher.is_empty() {
            warn!(task = %item.task_name(), seq = item.seq, "alert was not delivered by any channel");
        }

        decision
    }
}
