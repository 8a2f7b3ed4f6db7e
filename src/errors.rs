// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuerywatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid task '{task}': field `{field}` {reason}")]
    InvalidTask {
        task: String,
        field: &'static str,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuerywatchError {
    pub fn invalid_task(
        task: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        QuerywatchError::InvalidTask {
            task: task.into(),
            field,
            reason: reason.into(),
        }
    }

    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        QuerywatchError::Collaborator {
            collaborator,
            message: message.into(),
        }
    }

    /// The bare failure message, without the collaborator prefix.
    pub fn detail(&self) -> String {
        match self {
            QuerywatchError::Collaborator { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, QuerywatchError>;
