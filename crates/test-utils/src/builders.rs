#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use querywatch::config::{
    ConfigFile, ConfigSection, ExecutorSection, ExploratorySection, GeneratorSection,
    HistorySection, NotifySection, RawConfigFile, TaskConfig, TaskDefinition, ThresholdConfig,
};
use querywatch::types::ThresholdType;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                exploratory: ExploratorySection::default(),
                history: HistorySection::default(),
                executor: None,
                generator: None,
                classifier: None,
                notify: NotifySection::default(),
                task: vec![],
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.config.queue_capacity = capacity;
        self
    }

    pub fn structured_retry_interval(mut self, interval: &str) -> Self {
        self.config.config.structured_retry_interval = interval.to_string();
        self
    }

    pub fn run_on_startup(mut self, val: bool) -> Self {
        self.config.config.run_on_startup = val;
        self
    }

    pub fn exploratory_enabled(mut self, val: bool) -> Self {
        self.config.exploratory.enabled = val;
        self
    }

    pub fn executor(mut self, cmd: &str) -> Self {
        self.config.executor = Some(ExecutorSection {
            cmd: cmd.to_string(),
            timeout: "2m".to_string(),
            structured_prefix: None,
            exploratory_prefix: None,
        });
        self
    }

    pub fn generator(mut self, cmd: &str) -> Self {
        self.config.generator = Some(GeneratorSection {
            cmd: cmd.to_string(),
            timeout: "1m".to_string(),
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn structured(name: &str, question: &str, cadence: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                kind: Some("structured".to_string()),
                question: Some(question.to_string()),
                cadence: cadence.to_string(),
                alert_mode: None,
                anomaly_threshold: None,
            },
        }
    }

    pub fn exploratory(name: &str, cadence: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                kind: Some("exploratory".to_string()),
                question: None,
                cadence: cadence.to_string(),
                alert_mode: None,
                anomaly_threshold: None,
            },
        }
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.task.kind = Some(kind.to_string());
        self
    }

    pub fn question(mut self, question: &str) -> Self {
        self.task.question = Some(question.to_string());
        self
    }

    pub fn no_question(mut self) -> Self {
        self.task.question = None;
        self
    }

    pub fn alert_mode(mut self, mode: &str) -> Self {
        self.task.alert_mode = Some(mode.to_string());
        self
    }

    pub fn automatic(self) -> Self {
        self.alert_mode("automatic")
    }

    pub fn threshold(mut self, kind: &str, value: f64) -> Self {
        self.task.alert_mode = Some("anomaly".to_string());
        self.task.anomaly_threshold = Some(ThresholdConfig {
            kind: kind.to_string(),
            value,
        });
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Shorthands for already-validated task definitions.
pub fn structured_task(name: &str, question: &str, cadence: Duration) -> Arc<TaskDefinition> {
    Arc::new(TaskDefinition::structured(name, question, cadence))
}

pub fn exploratory_task(name: &str, cadence: Duration) -> Arc<TaskDefinition> {
    Arc::new(TaskDefinition::exploratory(name, cadence))
}

pub fn anomaly_task(name: &str, question: &str, kind: ThresholdType, value: f64) -> Arc<TaskDefinition> {
    Arc::new(
        TaskDefinition::structured(name, question, Duration::from_secs(3600)).with_anomaly(kind, value),
    )
}
