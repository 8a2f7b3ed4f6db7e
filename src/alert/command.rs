// src/alert/command.rs

//! Command-backed classifier and notification channel.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::alert::classifier::{AnomalyClassifier, Classification};
use crate::alert::notifier::{NotifyPayload, Notifier};
use crate::config::{AnomalyThreshold, CommandSettings};
use crate::errors::{QuerywatchError, Result};
use crate::exec::process::run_command;
use crate::types::Severity;

/// Reply expected from a classifier command on stdout.
#[derive(Debug, Deserialize)]
struct ClassifierReply {
    anomaly_detected: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    alert_message: Option<String>,
}

/// Classifier backed by an external command.
///
/// The result text goes to stdin; threshold type and value are exported as
/// `QUERYWATCH_THRESHOLD_TYPE` and `QUERYWATCH_THRESHOLD_VALUE`. The command
/// answers with a JSON object:
/// `{"anomaly_detected": bool, "reason": str, "severity": str, "alert_message": str}`.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    settings: CommandSettings,
}

impl CommandClassifier {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AnomalyClassifier for CommandClassifier {
    async fn classify(&self, result_text: &str, threshold: AnomalyThreshold) -> Result<Classification> {
        let value = threshold.value.to_string();
        let env = [
            ("QUERYWATCH_THRESHOLD_TYPE", threshold.kind.as_str()),
            ("QUERYWATCH_THRESHOLD_VALUE", value.as_str()),
        ];

        let output = run_command(&self.settings, Some(result_text), &env)
            .await
            .map_err(|e| QuerywatchError::collaborator("anomaly classifier", format!("{e:#}")))?;

        if !output.success {
            return Err(QuerywatchError::collaborator(
                "anomaly classifier",
                output.failure_detail(),
            ));
        }

        parse_reply(&output.stdout)
    }
}

/// Parse a classifier reply. Tolerates text around the JSON object.
pub fn parse_reply(stdout: &str) -> Result<Classification> {
    let json = match (stdout.find('{'), stdout.rfind('}')) {
        (Some(start), Some(end)) if start < end => &stdout[start..=end],
        _ => {
            return Err(QuerywatchError::collaborator(
                "anomaly classifier",
                "reply contained no JSON object",
            ));
        }
    };

    let reply: ClassifierReply = serde_json::from_str(json).map_err(|e| {
        QuerywatchError::collaborator("anomaly classifier", format!("invalid reply: {e}"))
    })?;

    let description = reply
        .alert_message
        .filter(|m| !m.trim().is_empty())
        .or(reply.reason.filter(|r| !r.trim().is_empty()));

    if !reply.anomaly_detected {
        return Ok(Classification::normal(
            description.unwrap_or_else(|| "no anomaly detected".to_string()),
        ));
    }

    let severity = match reply.severity.as_deref() {
        Some(s) if !s.trim().is_empty() => s.parse::<Severity>().map_err(|e| {
            QuerywatchError::collaborator("anomaly classifier", e)
        })?,
        _ => {
            debug!("classifier reply without severity; assuming medium");
            Severity::Medium
        }
    };

    Ok(Classification::anomaly(
        description.unwrap_or_else(|| "anomaly detected".to_string()),
        severity,
    ))
}

/// Notification channel that pipes the JSON payload into a command.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    settings: CommandSettings,
}

impl CommandNotifier {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn send(&self, payload: &NotifyPayload) -> Result<()> {
        let body = serde_json::to_string(payload)
            .map_err(|e| QuerywatchError::collaborator("notifier", format!("encoding payload: {e}")))?;

        let output = run_command(
            &self.settings,
            Some(&body),
            &[
                ("QUERYWATCH_TASK", payload.task_name.as_str()),
                ("QUERYWATCH_REASON", payload.reason.as_str()),
            ],
        )
        .await
        .map_err(|e| QuerywatchError::collaborator("notifier", format!("{e:#}")))?;

        if output.success {
            Ok(())
        } else {
            Err(QuerywatchError::collaborator("notifier", output.failure_detail()))
        }
    }

    fn channel_name(&self) -> &str {
        "command"
    }
}
