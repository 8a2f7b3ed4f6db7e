// src/config/validate.rs

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::definition::{AnomalyThreshold, DEFAULT_THRESHOLD, TaskDefinition};
use crate::config::model::{
    CommandSettings, ConfigFile, ExecutorSettings, NotifySettings, RawConfigFile, Settings,
    TaskConfig,
};
use crate::errors::{QuerywatchError, Result};
use crate::schedule::cadence::parse_positive_duration;
use crate::types::{AlertMode, TaskKind, ThresholdType};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = QuerywatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        let settings = validate_global_config(&raw)?;
        let tasks = validate_tasks(&raw.task)?;

        let executor = match raw.executor {
            Some(ex) => Some(ExecutorSettings {
                timeout: section_duration("executor", "timeout", &ex.timeout)?,
                cmd: non_empty_cmd("executor", ex.cmd)?,
                structured_prefix: ex.structured_prefix,
                exploratory_prefix: ex.exploratory_prefix,
            }),
            None => None,
        };

        let generator = match raw.generator {
            Some(g) => Some(command_settings("generator", g.cmd, &g.timeout)?),
            None => None,
        };

        let classifier = match raw.classifier {
            Some(c) => Some(command_settings("classifier", c.cmd, &c.timeout)?),
            None => None,
        };

        let notify = NotifySettings {
            terminal: raw.notify.terminal,
            command: match raw.notify.cmd {
                Some(cmd) => Some(command_settings("notify", cmd, &raw.notify.timeout)?),
                None => None,
            },
        };

        Ok(ConfigFile {
            settings,
            exploratory: raw.exploratory,
            history: raw.history,
            executor,
            generator,
            classifier,
            notify,
            tasks,
        })
    }
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(QuerywatchError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<Settings> {
    if cfg.config.queue_capacity == 0 {
        return Err(QuerywatchError::ConfigError(
            "[config].queue_capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    let structured_retry_interval = section_duration(
        "config",
        "structured_retry_interval",
        &cfg.config.structured_retry_interval,
    )?;

    let status_interval = match cfg.config.status_interval.as_deref() {
        Some(s) => Some(section_duration("config", "status_interval", s)?),
        None => None,
    };

    Ok(Settings {
        queue_capacity: cfg.config.queue_capacity,
        structured_retry_interval,
        run_on_startup: cfg.config.run_on_startup,
        drain_on_shutdown: cfg.config.drain_on_shutdown,
        status_interval,
    })
}

fn validate_tasks(tasks: &[TaskConfig]) -> Result<Vec<Arc<TaskDefinition>>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(tasks.len());

    for (idx, task) in tasks.iter().enumerate() {
        let name = task.name.trim();
        if name.is_empty() {
            return Err(QuerywatchError::invalid_task(
                format!("#{}", idx + 1),
                "name",
                "must not be empty",
            ));
        }
        if !seen.insert(name.to_string()) {
            return Err(QuerywatchError::invalid_task(
                name,
                "name",
                "is used by more than one task",
            ));
        }

        out.push(Arc::new(validate_task(name, task)?));
    }

    Ok(out)
}

/// Turn one raw `[[task]]` entry into a [`TaskDefinition`].
pub fn validate_task(name: &str, task: &TaskConfig) -> Result<TaskDefinition> {
    let kind = match task.kind.as_deref() {
        Some(s) => s
            .parse::<TaskKind>()
            .map_err(|e| QuerywatchError::invalid_task(name, "kind", e))?,
        None => TaskKind::Structured,
    };

    let cadence = parse_positive_duration(&task.cadence)
        .map_err(|e| QuerywatchError::invalid_task(name, "cadence", e))?;

    let question = match (kind, task.question.as_deref().map(str::trim)) {
        (TaskKind::Structured, Some(q)) if !q.is_empty() => Some(q.to_string()),
        (TaskKind::Structured, _) => {
            return Err(QuerywatchError::invalid_task(
                name,
                "question",
                "is required for structured tasks",
            ));
        }
        (TaskKind::Exploratory, None) => None,
        (TaskKind::Exploratory, Some(_)) => {
            return Err(QuerywatchError::invalid_task(
                name,
                "question",
                "must not be set for exploratory tasks (questions are generated)",
            ));
        }
    };

    let alert_mode = match task.alert_mode.as_deref() {
        Some(s) => s
            .parse::<AlertMode>()
            .map_err(|e| QuerywatchError::invalid_task(name, "alert_mode", e))?,
        None => AlertMode::default(),
    };

    let threshold = match (alert_mode, task.anomaly_threshold.as_ref()) {
        (AlertMode::Automatic, Some(_)) => {
            warn!(task = %name, "anomaly_threshold is ignored for alert_mode = automatic");
            None
        }
        (AlertMode::Automatic, None) => None,
        (AlertMode::Anomaly, None) => Some(DEFAULT_THRESHOLD),
        (AlertMode::Anomaly, Some(raw)) => {
            let kind = raw
                .kind
                .parse::<ThresholdType>()
                .map_err(|e| QuerywatchError::invalid_task(name, "anomaly_threshold.type", e))?;

            if !raw.value.is_finite() || raw.value <= 0.0 {
                return Err(QuerywatchError::invalid_task(
                    name,
                    "anomaly_threshold.value",
                    format!("must be a positive fraction (got {})", raw.value),
                ));
            }
            if raw.value >= 1.0 {
                warn!(
                    task = %name,
                    value = raw.value,
                    "anomaly_threshold.value >= 1 means a change of 100% or more"
                );
            }

            Some(AnomalyThreshold {
                kind,
                value: raw.value,
            })
        }
    };

    Ok(TaskDefinition {
        name: name.to_string(),
        kind,
        cadence,
        question,
        alert_mode,
        threshold,
    })
}

fn section_duration(section: &str, field: &str, value: &str) -> Result<Duration> {
    parse_positive_duration(value)
        .map_err(|e| QuerywatchError::ConfigError(format!("[{section}].{field}: {e}")))
}

fn non_empty_cmd(section: &str, cmd: String) -> Result<String> {
    if cmd.trim().is_empty() {
        return Err(QuerywatchError::ConfigError(format!(
            "[{section}].cmd must not be empty"
        )));
    }
    Ok(cmd)
}

fn command_settings(section: &str, cmd: String, timeout: &str) -> Result<CommandSettings> {
    Ok(CommandSettings {
        timeout: section_duration(section, "timeout", timeout)?,
        cmd: non_empty_cmd(section, cmd)?,
    })
}
