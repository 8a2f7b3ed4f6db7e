#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use querywatch::alert::{AnomalyClassifier, Classification, Notifier, NotifyPayload};
use querywatch::config::AnomalyThreshold;
use querywatch::errors::{QuerywatchError, Result};
use querywatch::exec::QueryExecutor;
use querywatch::generate::TextGenerator;

/// A fake executor that:
/// - records every question it was asked
/// - answers with a fixed reply, or fails for questions containing a marker
/// - optionally takes a while (use with paused tokio time)
#[derive(Clone)]
pub struct FakeExecutor {
    reply: String,
    fail_marker: Option<String>,
    delay: Option<Duration>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_marker: None,
            delay: None,
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn execute(&self, question: &str) -> Result<String> {
        self.executed.lock().unwrap().push(question.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.fail_marker {
            Some(marker) if question.contains(marker.as_str()) => Err(QuerywatchError::collaborator(
                "query executor",
                "backend unavailable",
            )),
            _ => Ok(self.reply.clone()),
        }
    }
}

/// A fake text generator that:
/// - returns scripted replies in order, then `exploratory question N`
/// - counts calls and remembers the history it was shown
/// - optionally takes a while (use with paused tokio time)
#[derive(Clone, Default)]
pub struct FakeTextGenerator {
    script: Arc<Mutex<VecDeque<std::result::Result<String, String>>>>,
    calls: Arc<AtomicUsize>,
    seen_history: Arc<Mutex<Vec<Vec<String>>>>,
    delay: Option<Duration>,
}

impl FakeTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: &[&str]) -> Self {
        let fake = Self::default();
        {
            let mut script = fake.script.lock().unwrap();
            script.extend(replies.iter().map(|r| Ok(r.to_string())));
        }
        fake
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_error(&self, message: &str) {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_history(&self) -> Vec<Vec<String>> {
        self.seen_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeTextGenerator {
    async fn generate(&self, _schema: &str, history: &[String]) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_history.lock().unwrap().push(history.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(QuerywatchError::collaborator("text generation", message)),
            None => Ok(format!("exploratory question {n}")),
        }
    }
}

/// A classifier that always returns the same verdict (or error).
#[derive(Clone)]
pub struct FakeClassifier {
    verdict: std::result::Result<Classification, String>,
    calls: Arc<Mutex<Vec<(String, AnomalyThreshold)>>>,
}

impl FakeClassifier {
    pub fn returning(verdict: Classification) -> Self {
        Self {
            verdict: Ok(verdict),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            verdict: Err(message.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(String, AnomalyThreshold)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnomalyClassifier for FakeClassifier {
    async fn classify(&self, result_text: &str, threshold: AnomalyThreshold) -> Result<Classification> {
        self.calls
            .lock()
            .unwrap()
            .push((result_text.to_string(), threshold));
        match &self.verdict {
            Ok(c) => Ok(c.clone()),
            Err(message) => Err(QuerywatchError::collaborator("anomaly classifier", message.clone())),
        }
    }
}

/// A notifier that records payloads, optionally failing every delivery.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Arc<Mutex<Vec<NotifyPayload>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<NotifyPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, payload: &NotifyPayload) -> Result<()> {
        self.sent.lock().unwrap().push(payload.clone());
        if self.fail {
            Err(QuerywatchError::collaborator("notifier", "transport down"))
        } else {
            Ok(())
        }
    }

    fn channel_name(&self) -> &str {
        if self.fail { "failing-recorder" } else { "recorder" }
    }
}
