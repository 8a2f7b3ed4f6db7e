// src/generate/backend.rs

//! Text-generation collaborator.

use async_trait::async_trait;

use crate::config::CommandSettings;
use crate::errors::{QuerywatchError, Result};
use crate::exec::process::run_command;
use crate::generate::prompt::build_prompt;

/// Proposes an exploratory question given the schema and prior questions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, schema: &str, history: &[String]) -> Result<String>;
}

/// Generator backed by an external command.
///
/// The prompt is written to the command's stdin; the question is read from
/// stdout. The schema is also exported as `QUERYWATCH_SCHEMA`.
#[derive(Debug, Clone)]
pub struct CommandTextGenerator {
    settings: CommandSettings,
}

impl CommandTextGenerator {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl TextGenerator for CommandTextGenerator {
    async fn generate(&self, schema: &str, history: &[String]) -> Result<String> {
        let prompt = build_prompt(schema, history);
        let output = run_command(&self.settings, Some(&prompt), &[("QUERYWATCH_SCHEMA", schema)])
            .await
            .map_err(|e| QuerywatchError::collaborator("text generation", format!("{e:#}")))?;

        if !output.success {
            return Err(QuerywatchError::collaborator(
                "text generation",
                output.failure_detail(),
            ));
        }

        Ok(output.stdout)
    }
}
