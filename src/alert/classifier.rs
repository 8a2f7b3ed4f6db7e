// src/alert/classifier.rs

//! Anomaly-classification collaborator.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::AnomalyThreshold;
use crate::errors::Result;
use crate::types::Severity;

/// Verdict of an [`AnomalyClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub is_anomaly: bool,
    pub description: String,
    /// Present when an anomaly was found.
    pub severity: Option<Severity>,
}

impl Classification {
    pub fn anomaly(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            is_anomaly: true,
            description: description.into(),
            severity: Some(severity),
        }
    }

    pub fn normal(description: impl Into<String>) -> Self {
        Self {
            is_anomaly: false,
            description: description.into(),
            severity: None,
        }
    }
}

/// Decides whether a result text contains an anomaly under `threshold`.
///
/// Implementations must treat the threshold type as follows:
/// `percent_change` flags a change in either direction larger than the value,
/// `dropoff` only decreases, `spike` only increases, and `general` uses the
/// value as a baseline sensitivity for open-ended judgment.
#[async_trait]
pub trait AnomalyClassifier: Send + Sync {
    async fn classify(&self, result_text: &str, threshold: AnomalyThreshold) -> Result<Classification>;
}
