// src/alert/notifier.rs

//! Notification channels and the dispatcher that fans alerts out to them.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::{Severity, TaskKind};

/// Structured alert handed to every channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotifyPayload {
    pub task_name: String,
    pub kind: TaskKind,
    pub reason: String,
    pub severity: Option<Severity>,
    pub question: String,
    pub timestamp: DateTime<Utc>,
}

impl NotifyPayload {
    /// One-line human rendering used by the terminal channel.
    pub fn headline(&self) -> String {
        match self.severity {
            Some(sev) => format!(
                "[{}] {} ({}): {}",
                sev.to_string().to_uppercase(),
                self.task_name,
                self.kind,
                self.reason
            ),
            None => format!("{} ({}): {}", self.task_name, self.kind, self.reason),
        }
    }
}

/// A notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &NotifyPayload) -> Result<()>;

    /// Short name used in logs ("terminal", "command").
    fn channel_name(&self) -> &str;
}

/// Prints alerts to stdout. Logs go to stderr, so the two never interleave.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn send(&self, payload: &NotifyPayload) -> Result<()> {
        println!("{}", payload.headline());
        println!("  question: {}", payload.question);
        println!("  at: {}", payload.timestamp.to_rfc3339());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "terminal"
    }
}

/// Outcome of delivering one payload to one channel.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Delivers each alert to every configured channel.
///
/// A failing channel never blocks the others and never propagates: failures
/// are logged and reported in the returned results only.
#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, channel: Box<dyn Notifier>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    pub async fn dispatch(&self, payload: &NotifyPayload) -> Vec<DispatchResult> {
        if self.channels.is_empty() {
            debug!(task = %payload.task_name, "no notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = Instant::now();
            let result = channel.send(payload).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    info!(
                        task = %payload.task_name,
                        channel = channel.channel_name(),
                        duration_ms,
                        "notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    warn!(
                        task = %payload.task_name,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }

    /// Dispatch and report whether at least one channel delivered.
    pub async fn notify(&self, payload: &NotifyPayload) -> bool {
        self.dispatch(payload).await.iter().any(|r| r.success)
    }
}
