// src/config/definition.rs

//! Immutable task definitions derived from validated configuration.

use std::time::Duration;

use crate::types::{AlertMode, TaskKind, ThresholdType};

/// Default threshold applied to anomaly-mode tasks that do not set one.
pub const DEFAULT_THRESHOLD: AnomalyThreshold = AnomalyThreshold {
    kind: ThresholdType::General,
    value: 0.05,
};

/// Sensitivity used by the anomaly classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyThreshold {
    pub kind: ThresholdType,
    /// Fraction, e.g. `0.10` for 10%.
    pub value: f64,
}

/// A single recurring task, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    /// Unique, stable key.
    pub name: String,
    pub kind: TaskKind,
    pub cadence: Duration,
    /// Fixed question for structured tasks; `None` for exploratory.
    pub question: Option<String>,
    pub alert_mode: AlertMode,
    /// Present iff `alert_mode == Anomaly`.
    pub threshold: Option<AnomalyThreshold>,
}

impl TaskDefinition {
    /// Structured task with automatic alerts.
    pub fn structured(name: impl Into<String>, question: impl Into<String>, cadence: Duration) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Structured,
            cadence,
            question: Some(question.into()),
            alert_mode: AlertMode::Automatic,
            threshold: None,
        }
    }

    /// Exploratory task with automatic alerts.
    pub fn exploratory(name: impl Into<String>, cadence: Duration) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Exploratory,
            cadence,
            question: None,
            alert_mode: AlertMode::Automatic,
            threshold: None,
        }
    }

    /// Switch to anomaly mode with the given threshold.
    pub fn with_anomaly(mut self, kind: ThresholdType, value: f64) -> Self {
        self.alert_mode = AlertMode::Anomaly;
        self.threshold = Some(AnomalyThreshold { kind, value });
        self
    }

    pub fn is_exploratory(&self) -> bool {
        self.kind == TaskKind::Exploratory
    }

    /// Threshold to classify with; falls back to [`DEFAULT_THRESHOLD`].
    pub fn effective_threshold(&self) -> AnomalyThreshold {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }
}
