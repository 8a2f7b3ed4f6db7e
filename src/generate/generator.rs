// src/generate/generator.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::TaskDefinition;
use crate::engine::queue::{BoundedQueue, EnqueueError};
use crate::engine::shutdown::ShutdownSignal;
use crate::engine::status::RuntimeStatus;
use crate::engine::work::WorkRequest;
use crate::generate::backend::TextGenerator;
use crate::generate::normalize::clean_generated;
use crate::history::HistoryStore;

/// A warning is logged every this many failed structured re-attempts.
const RETRY_WARN_EVERY: u64 = 10;

/// Result of the first, inline enqueue attempt for a structured firing.
#[derive(Debug)]
pub enum StructuredAdmission {
    Admitted { seq: u64 },
    /// The queue was full; the request must be retried.
    QueueFull(WorkRequest),
    /// The queue no longer accepts work (shutdown).
    Closed,
}

/// What happened to one exploratory firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreOutcome {
    Enqueued { seq: u64, question: String },
    /// Queue was full before generation; nothing was generated.
    SkippedQueueFull,
    /// The generated question was already in the history.
    Duplicate { question: String },
    GenerationFailed { reason: String },
    /// Queue filled up while the question was being generated.
    RejectedQueueFull { question: String },
    Closed,
    Cancelled,
}

/// Settings for the generator, taken from `[config]` and `[exploratory]`.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub schema: String,
    pub recent_history: usize,
    pub structured_retry_interval: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            schema: String::new(),
            recent_history: 10,
            structured_retry_interval: Duration::from_secs(1),
        }
    }
}

/// Turns due tasks into queued work.
///
/// - Structured firings are packaged directly from the fixed question and
///   always attempted; a full queue means retrying at a fixed interval until
///   admitted.
/// - Exploratory firings are abandoned when the queue is full *before*
///   calling the text generator, de-duplicated against the history, and
///   recorded in the history only once admitted.
pub struct QuestionGenerator {
    queue: Arc<BoundedQueue>,
    history: Arc<dyn HistoryStore>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    status: Arc<RuntimeStatus>,
    settings: GeneratorSettings,
}

impl QuestionGenerator {
    pub fn new(
        queue: Arc<BoundedQueue>,
        history: Arc<dyn HistoryStore>,
        status: Arc<RuntimeStatus>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            queue,
            history,
            text_generator: None,
            status,
            settings,
        }
    }

    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    pub fn queue(&self) -> &Arc<BoundedQueue> {
        &self.queue
    }

    /// First, non-blocking enqueue attempt for a structured firing.
    pub fn admit_structured(&self, task: &Arc<TaskDefinition>) -> StructuredAdmission {
        let Some(request) = WorkRequest::structured(task) else {
            warn!(task = %task.name, "structured admission requested for a task without a question");
            return StructuredAdmission::Closed;
        };

        match self.queue.try_enqueue(&request) {
            Ok(seq) => {
                info!(task = %task.name, seq, question = %request.question, "structured question queued");
                StructuredAdmission::Admitted { seq }
            }
            Err(EnqueueError::Full) => {
                debug!(
                    task = %task.name,
                    capacity = self.queue.capacity(),
                    "queue full; structured firing will be retried"
                );
                StructuredAdmission::QueueFull(request)
            }
            Err(EnqueueError::Closed) => {
                warn!(task = %task.name, "queue closed; structured firing dropped");
                StructuredAdmission::Closed
            }
        }
    }

    /// Keep re-attempting `request` every `structured_retry_interval` until
    /// it is admitted. Returns `false` if shutdown (or queue closure) ended
    /// the attempts first.
    pub async fn retry_structured(&self, request: WorkRequest, mut shutdown: ShutdownSignal) -> bool {
        let interval = self.settings.structured_retry_interval;
        let mut attempts: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    warn!(
                        task = %request.task.name,
                        attempts,
                        "shutdown while retrying structured firing; firing lost"
                    );
                    return false;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            attempts += 1;
            self.status.record_structured_retry();

            match self.queue.try_enqueue(&request) {
                Ok(seq) => {
                    info!(
                        task = %request.task.name,
                        seq,
                        attempts,
                        "structured question queued after retry"
                    );
                    return true;
                }
                Err(EnqueueError::Full) => {
                    if attempts % RETRY_WARN_EVERY == 0 {
                        warn!(
                            task = %request.task.name,
                            attempts,
                            capacity = self.queue.capacity(),
                            "queue still full; structured firing keeps waiting"
                        );
                    }
                }
                Err(EnqueueError::Closed) => {
                    warn!(
                        task = %request.task.name,
                        attempts,
                        "queue closed while retrying structured firing; firing lost"
                    );
                    return false;
                }
            }
        }
    }

    /// Admit a structured firing, retrying until admitted or shut down.
    pub async fn run_structured(&self, task: &Arc<TaskDefinition>, shutdown: ShutdownSignal) -> bool {
        match self.admit_structured(task) {
            StructuredAdmission::Admitted { .. } => true,
            StructuredAdmission::QueueFull(request) => self.retry_structured(request, shutdown).await,
            StructuredAdmission::Closed => false,
        }
    }

    /// Occupancy check made at firing time, before any generation work.
    ///
    /// Returns `true` (and counts the skip) when the queue is full.
    pub fn skip_when_full(&self, task: &TaskDefinition) -> bool {
        let occupancy = self.queue.len();
        if occupancy < self.queue.capacity() {
            return false;
        }

        self.status.record_skipped_full();
        info!(
            task = %task.name,
            occupancy,
            capacity = self.queue.capacity(),
            "queue full; skipping exploratory firing"
        );
        true
    }

    /// Handle one exploratory firing. At most one enqueue attempt is made.
    pub async fn explore(&self, task: &Arc<TaskDefinition>, mut shutdown: ShutdownSignal) -> ExploreOutcome {
        if self.queue.is_closed() {
            return ExploreOutcome::Closed;
        }

        if self.skip_when_full(task) {
            return ExploreOutcome::SkippedQueueFull;
        }

        let Some(text_generator) = self.text_generator.as_ref() else {
            self.status.record_generation_failure();
            warn!(task = %task.name, "no text generator configured; skipping exploratory firing");
            return ExploreOutcome::GenerationFailed {
                reason: "no text generator configured".to_string(),
            };
        };

        let recent = match self.history.recent(self.settings.recent_history) {
            Ok(r) => r,
            Err(e) => {
                warn!(task = %task.name, error = %e, "failed to read question history; generating without it");
                Vec::new()
            }
        };

        let generated = tokio::select! {
            biased;
            _ = shutdown.triggered() => {
                debug!(task = %task.name, "shutdown during question generation");
                return ExploreOutcome::Cancelled;
            }
            res = text_generator.generate(&self.settings.schema, &recent) => res,
        };

        let raw = match generated {
            Ok(raw) => raw,
            Err(e) => {
                self.status.record_generation_failure();
                warn!(task = %task.name, error = %e, "question generation failed; skipping firing");
                return ExploreOutcome::GenerationFailed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(question) = clean_generated(&raw) else {
            self.status.record_generation_failure();
            warn!(task = %task.name, "text generator returned an empty question");
            return ExploreOutcome::GenerationFailed {
                reason: "empty question".to_string(),
            };
        };

        match self.history.contains(&question) {
            Ok(true) => {
                self.status.record_duplicate();
                info!(task = %task.name, question = %question, "skipping duplicate question");
                return ExploreOutcome::Duplicate { question };
            }
            Ok(false) => {}
            Err(e) => {
                warn!(task = %task.name, error = %e, "history lookup failed; treating question as new");
            }
        }

        let request = WorkRequest::new(Arc::clone(task), question.clone());
        match self.queue.try_enqueue(&request) {
            Ok(seq) => {
                if let Err(e) = self.history.record(&question, Utc::now()) {
                    warn!(task = %task.name, error = %e, "failed to record question in history");
                } else {
                    self.status.record_question();
                }
                info!(task = %task.name, seq, question = %question, "exploratory question queued");
                ExploreOutcome::Enqueued { seq, question }
            }
            Err(EnqueueError::Full) => {
                self.status.record_skipped_full();
                info!(
                    task = %task.name,
                    question = %question,
                    "queue filled during generation; dropping exploratory question"
                );
                ExploreOutcome::RejectedQueueFull { question }
            }
            Err(EnqueueError::Closed) => ExploreOutcome::Closed,
        }
    }
}
