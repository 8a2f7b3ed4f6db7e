#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use querywatch::alert::{AlertEngine, AnomalyClassifier, Dispatcher, RuleClassifier};
use querywatch::config::TaskDefinition;
use querywatch::engine::{BoundedQueue, Runtime, RuntimeOptions, RuntimeStatus, ShutdownSignal};
use querywatch::exec::ExecutionWorker;
use querywatch::generate::{GeneratorSettings, QuestionGenerator};
use querywatch::history::{HistoryStore, MemoryHistory};
use querywatch::schedule::{CadenceScheduler, ScheduleOptions};

use crate::fakes::{FakeExecutor, FakeTextGenerator, RecordingNotifier};

/// Everything needed to run the orchestration core against fakes.
///
/// Fields are shared handles, so assertions can inspect the fakes after the
/// components built from them have run.
pub struct Harness {
    pub tasks: Vec<Arc<TaskDefinition>>,
    pub queue: Arc<BoundedQueue>,
    pub status: Arc<RuntimeStatus>,
    pub history: Arc<MemoryHistory>,
    pub text_generator: FakeTextGenerator,
    pub executor: FakeExecutor,
    pub notifier: RecordingNotifier,
    pub retry_interval: Duration,
}

impl Harness {
    pub fn new(tasks: Vec<Arc<TaskDefinition>>, capacity: usize) -> Self {
        let queue = Arc::new(BoundedQueue::new(capacity));
        let status = Arc::new(RuntimeStatus::new(Arc::clone(&queue), &tasks));
        Self {
            tasks,
            queue,
            status,
            history: Arc::new(MemoryHistory::new()),
            text_generator: FakeTextGenerator::new(),
            executor: FakeExecutor::new("ok"),
            notifier: RecordingNotifier::new(),
            retry_interval: Duration::from_secs(1),
        }
    }

    pub fn with_executor(mut self, executor: FakeExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_text_generator(mut self, generator: FakeTextGenerator) -> Self {
        self.text_generator = generator;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn history_store(&self) -> Arc<dyn HistoryStore> {
        self.history.clone()
    }

    pub fn generator(&self) -> QuestionGenerator {
        QuestionGenerator::new(
            Arc::clone(&self.queue),
            self.history_store(),
            Arc::clone(&self.status),
            GeneratorSettings {
                schema: "orders(id, amount, created_at)".to_string(),
                recent_history: 10,
                structured_retry_interval: self.retry_interval,
            },
        )
        .with_text_generator(Arc::new(self.text_generator.clone()))
    }

    pub fn alert_engine(&self, classifier: Arc<dyn AnomalyClassifier>) -> AlertEngine {
        let dispatcher = Dispatcher::new(vec![Box::new(self.notifier.clone())]);
        AlertEngine::new(classifier, Arc::new(dispatcher)).with_status(Arc::clone(&self.status))
    }

    pub fn worker(&self) -> ExecutionWorker {
        ExecutionWorker::new(
            Arc::clone(&self.queue),
            Arc::new(self.executor.clone()),
            self.alert_engine(Arc::new(RuleClassifier::new())),
            Arc::clone(&self.status),
        )
    }

    /// Runtime over all tasks, scheduled from `tokio::time::Instant::now()`.
    pub fn runtime(
        &self,
        schedule: ScheduleOptions,
        options: RuntimeOptions,
        shutdown: ShutdownSignal,
    ) -> Runtime {
        let scheduler = CadenceScheduler::new(&self.tasks, tokio::time::Instant::now(), schedule);
        Runtime::new(
            scheduler,
            Arc::new(self.generator()),
            self.worker(),
            Arc::clone(&self.status),
            shutdown,
            options,
        )
    }
}
