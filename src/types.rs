use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which lane a task belongs to.
///
/// - `Structured`: fixed question, must run on every cadence firing.
/// - `Exploratory`: question generated per firing, best-effort under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Structured,
    Exploratory,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Structured => "structured",
            TaskKind::Exploratory => "exploratory",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Ok(TaskKind::Structured),
            "exploratory" => Ok(TaskKind::Exploratory),
            other => Err(format!(
                "invalid task kind: {other} (expected \"structured\" or \"exploratory\")"
            )),
        }
    }
}

/// Alert policy applied to successful results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    /// Notify on every successful result.
    Automatic,
    /// Notify only when the classifier flags the result.
    Anomaly,
}

impl Default for AlertMode {
    fn default() -> Self {
        AlertMode::Anomaly
    }
}

impl fmt::Display for AlertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMode::Automatic => f.write_str("automatic"),
            AlertMode::Anomaly => f.write_str("anomaly"),
        }
    }
}

impl FromStr for AlertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "automatic" => Ok(AlertMode::Automatic),
            "anomaly" => Ok(AlertMode::Anomaly),
            other => Err(format!(
                "invalid alert_mode: {other} (expected \"automatic\" or \"anomaly\")"
            )),
        }
    }
}

/// How an anomaly threshold is compared against the observed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdType {
    /// Relative change in either direction.
    PercentChange,
    /// Decreases only.
    Dropoff,
    /// Increases only.
    Spike,
    /// Open-ended judgment; the value is a baseline sensitivity.
    General,
}

impl ThresholdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdType::PercentChange => "percent_change",
            ThresholdType::Dropoff => "dropoff",
            ThresholdType::Spike => "spike",
            ThresholdType::General => "general",
        }
    }
}

impl fmt::Display for ThresholdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent_change" => Ok(ThresholdType::PercentChange),
            "dropoff" => Ok(ThresholdType::Dropoff),
            "spike" => Ok(ThresholdType::Spike),
            "general" => Ok(ThresholdType::General),
            other => Err(format!(
                "unknown threshold type: {other} (expected percent_change, dropoff, spike or general)"
            )),
        }
    }
}

/// Severity attached to anomaly alerts and execution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => f.write_str("low"),
            Severity::Medium => f.write_str("medium"),
            Severity::High => f.write_str("high"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!(
                "invalid severity: {other} (expected low, medium or high)"
            )),
        }
    }
}

/// Where the exploratory question history lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStorageMode {
    /// Append log on disk (`.querywatch/history` by default).
    File,
    /// In memory only (lost on restart).
    Memory,
}

impl Default for HistoryStorageMode {
    fn default() -> Self {
        HistoryStorageMode::Memory
    }
}
