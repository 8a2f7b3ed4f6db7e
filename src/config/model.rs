// src/config/model.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::definition::TaskDefinition;
use crate::types::HistoryStorageMode;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// queue_capacity = 10
///
/// [[task]]
/// name = "revenue"
/// kind = "structured"
/// question = "What was revenue today vs yesterday?"
/// cadence = "1h"
/// alert_mode = "automatic"
/// ```
///
/// All sections except `[[task]]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub exploratory: ExploratorySection,

    #[serde(default)]
    pub history: HistorySection,

    #[serde(default)]
    pub executor: Option<ExecutorSection>,

    #[serde(default)]
    pub generator: Option<GeneratorSection>,

    #[serde(default)]
    pub classifier: Option<ClassifierSection>,

    #[serde(default)]
    pub notify: NotifySection,

    /// `[[task]]` entries, in file order.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[config]` section: global queue and scheduling behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of pending work items.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Delay between re-attempts of a structured firing that found the
    /// queue full.
    #[serde(default = "default_structured_retry_interval")]
    pub structured_retry_interval: String,

    /// Fire every task once at startup before following its cadence.
    #[serde(default = "default_true")]
    pub run_on_startup: bool,

    /// Process queued items before exiting on shutdown.
    #[serde(default = "default_true")]
    pub drain_on_shutdown: bool,

    /// Optional interval for a periodic status log line.
    #[serde(default)]
    pub status_interval: Option<String>,
}

fn default_queue_capacity() -> usize {
    10
}

fn default_structured_retry_interval() -> String {
    "1s".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            structured_retry_interval: default_structured_retry_interval(),
            run_on_startup: true,
            drain_on_shutdown: true,
            status_interval: None,
        }
    }
}

/// `[exploratory]` section: settings shared by all exploratory tasks.
#[derive(Debug, Clone, Deserialize)]
pub struct ExploratorySection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How many recent questions are handed to the text generator.
    #[serde(default = "default_recent_history")]
    pub recent_history: usize,

    /// Schema description file passed to the text generator.
    #[serde(default)]
    pub schema: Option<PathBuf>,
}

fn default_recent_history() -> usize {
    10
}

impl Default for ExploratorySection {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_history: default_recent_history(),
            schema: None,
        }
    }
}

/// `[history]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HistorySection {
    #[serde(default)]
    pub storage: HistoryStorageMode,

    #[serde(default = "default_history_path")]
    pub path: PathBuf,
}

fn default_history_path() -> PathBuf {
    PathBuf::from(".querywatch/history")
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            storage: HistoryStorageMode::default(),
            path: default_history_path(),
        }
    }
}

/// `[executor]` section: the command that answers questions.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    pub cmd: String,

    #[serde(default = "default_executor_timeout")]
    pub timeout: String,

    #[serde(default)]
    pub structured_prefix: Option<String>,

    #[serde(default)]
    pub exploratory_prefix: Option<String>,
}

fn default_executor_timeout() -> String {
    "2m".to_string()
}

/// `[generator]` section: the command that proposes exploratory questions.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSection {
    pub cmd: String,

    #[serde(default = "default_generator_timeout")]
    pub timeout: String,
}

fn default_generator_timeout() -> String {
    "1m".to_string()
}

/// `[classifier]` section. Without it the built-in rule classifier is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSection {
    pub cmd: String,

    #[serde(default = "default_generator_timeout")]
    pub timeout: String,
}

/// `[notify]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifySection {
    /// Print alerts to stdout.
    #[serde(default = "default_true")]
    pub terminal: bool,

    /// Command receiving the JSON alert payload on stdin.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default = "default_notify_timeout")]
    pub timeout: String,
}

fn default_notify_timeout() -> String {
    "30s".to_string()
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            terminal: true,
            cmd: None,
            timeout: default_notify_timeout(),
        }
    }
}

/// One `[[task]]` entry.
///
/// `kind`, `alert_mode` and the threshold type are kept as strings here so
/// that validation can report the offending task and field by name.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,

    /// `"structured"` (default) or `"exploratory"`.
    #[serde(default)]
    pub kind: Option<String>,

    /// Fixed question; required for structured, forbidden for exploratory.
    #[serde(default)]
    pub question: Option<String>,

    /// Interval between firings, e.g. `"1h"`.
    pub cadence: String,

    /// `"automatic"` or `"anomaly"` (default).
    #[serde(default)]
    pub alert_mode: Option<String>,

    #[serde(default)]
    pub anomaly_threshold: Option<ThresholdConfig>,
}

/// `anomaly_threshold = { type = "dropoff", value = 0.1 }`
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    #[serde(rename = "type", default = "default_threshold_type")]
    pub kind: String,

    #[serde(default = "default_threshold_value")]
    pub value: f64,
}

fn default_threshold_type() -> String {
    "general".to_string()
}

fn default_threshold_value() -> f64 {
    0.05
}

/// Validated global settings with durations parsed.
#[derive(Debug, Clone)]
pub struct Settings {
    pub queue_capacity: usize,
    pub structured_retry_interval: Duration,
    pub run_on_startup: bool,
    pub drain_on_shutdown: bool,
    pub status_interval: Option<Duration>,
}

/// Validated `[executor]`.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub cmd: String,
    pub timeout: Duration,
    pub structured_prefix: Option<String>,
    pub exploratory_prefix: Option<String>,
}

/// Validated settings for any command-backed collaborator.
#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub cmd: String,
    pub timeout: Duration,
}

/// Validated `[notify]`.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub terminal: bool,
    pub command: Option<CommandSettings>,
}

/// Fully validated configuration. Immutable for the process lifetime.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: Settings,
    pub exploratory: ExploratorySection,
    pub history: HistorySection,
    pub executor: Option<ExecutorSettings>,
    pub generator: Option<CommandSettings>,
    pub classifier: Option<CommandSettings>,
    pub notify: NotifySettings,
    /// Task definitions in configuration order.
    pub tasks: Vec<Arc<TaskDefinition>>,
}

impl ConfigFile {
    /// Tasks that will actually be scheduled (exploratory tasks are dropped
    /// when `[exploratory].enabled = false`).
    pub fn active_tasks(&self) -> Vec<Arc<TaskDefinition>> {
        self.tasks
            .iter()
            .filter(|t| self.exploratory.enabled || !t.is_exploratory())
            .cloned()
            .collect()
    }

    pub fn has_exploratory_tasks(&self) -> bool {
        self.tasks.iter().any(|t| t.is_exploratory())
    }
}
