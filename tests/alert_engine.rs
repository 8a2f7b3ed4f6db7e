// tests/alert_engine.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use querywatch::alert::{
    AUTOMATIC_REASON, AlertEngine, Classification, Dispatcher, NO_ANOMALY_REASON, Notifier,
    RuleClassifier,
};
use querywatch::config::{DEFAULT_THRESHOLD, TaskDefinition};
use querywatch::engine::{ExecutionResult, WorkItem};
use querywatch::types::{AlertMode, Severity, TaskKind, ThresholdType};
use querywatch_test_utils::builders::{anomaly_task, structured_task};
use querywatch_test_utils::fakes::{FakeClassifier, RecordingNotifier};
use querywatch_test_utils::harness::Harness;
use querywatch_test_utils::init_tracing;

fn item(task: &Arc<TaskDefinition>, seq: u64) -> WorkItem {
    WorkItem {
        task: Arc::clone(task),
        question: task.question.clone().unwrap_or_default(),
        kind: task.kind,
        enqueued_at: Utc::now(),
        seq,
    }
}

fn engine_with(classifier: FakeClassifier, notifiers: Vec<Box<dyn Notifier>>) -> AlertEngine {
    AlertEngine::new(Arc::new(classifier), Arc::new(Dispatcher::new(notifiers)))
}

#[tokio::test]
async fn test_revenue_automatic_alert() {
    let revenue = structured_task("revenue", "What was revenue today vs yesterday?", Duration::from_secs(3600));
    assert_eq!(revenue.alert_mode, AlertMode::Automatic);

    let classifier = FakeClassifier::returning(Classification::normal("unused"));
    let engine = engine_with(classifier.clone(), vec![]);

    let decision = engine
        .decide(&revenue, &ExecutionResult::success("Revenue up 3%"))
        .await;

    assert!(decision.notify);
    assert_eq!(decision.reason, AUTOMATIC_REASON);
    assert_eq!(decision.reason, "automatic alert");
    assert_eq!(decision.severity, None);
    assert!(classifier.calls().is_empty(), "automatic mode never classifies");
}

#[tokio::test]
async fn test_vip_dropoff_anomaly_alert() {
    let vip = anomaly_task("vip", "How many VIP orders today vs yesterday?", ThresholdType::Dropoff, 0.10);
    let classifier = FakeClassifier::returning(Classification::anomaly(
        "dropped 15%, exceeds 10% threshold",
        Severity::High,
    ));
    let engine = engine_with(classifier.clone(), vec![]);

    let decision = engine
        .decide(&vip, &ExecutionResult::success("VIP orders: 85 today vs 100 yesterday (-15%)"))
        .await;

    assert!(decision.notify);
    assert_eq!(decision.reason, "dropped 15%, exceeds 10% threshold");
    assert_eq!(decision.severity, Some(Severity::High));

    let calls = classifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.kind, ThresholdType::Dropoff);
    assert!((calls[0].1.value - 0.10).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_anomaly_mode_without_anomaly_does_not_notify() {
    let vip = anomaly_task("vip", "VIP?", ThresholdType::Spike, 0.2);
    let engine = engine_with(FakeClassifier::returning(Classification::normal("")), vec![]);

    let decision = engine.decide(&vip, &ExecutionResult::success("flat")).await;

    assert!(!decision.notify);
    assert_eq!(decision.reason, NO_ANOMALY_REASON);
    assert_eq!(decision.severity, None);
}

#[tokio::test]
async fn test_execution_failure_always_notifies_high() {
    let automatic = structured_task("revenue", "Revenue?", Duration::from_secs(60));
    let anomaly = anomaly_task("vip", "VIP?", ThresholdType::General, 0.05);
    let classifier = FakeClassifier::returning(Classification::normal("fine"));
    let engine = engine_with(classifier.clone(), vec![]);

    for task in [&automatic, &anomaly] {
        let decision = engine
            .decide(task, &ExecutionResult::failure("backend unavailable"))
            .await;
        assert!(decision.notify);
        assert_eq!(decision.reason, "execution failed: backend unavailable");
        assert_eq!(decision.severity, Some(Severity::High));
    }
    assert!(classifier.calls().is_empty());
}

#[tokio::test]
async fn test_classifier_error_is_not_an_alert() {
    init_tracing();
    let vip = anomaly_task("vip", "VIP?", ThresholdType::Dropoff, 0.1);
    let engine = engine_with(FakeClassifier::failing("model timeout"), vec![]);

    let decision = engine.decide(&vip, &ExecutionResult::success("-50%")).await;

    assert!(!decision.notify);
    assert_eq!(decision.reason, "anomaly classification failed: model timeout");
}

#[tokio::test]
async fn test_default_threshold_used_when_none_configured() {
    let mut task = TaskDefinition::exploratory("explore", Duration::from_secs(60));
    task.alert_mode = AlertMode::Anomaly;
    let task = Arc::new(task);

    let classifier = FakeClassifier::returning(Classification::normal("fine"));
    let engine = engine_with(classifier.clone(), vec![]);
    engine.decide(&task, &ExecutionResult::success("x")).await;

    assert_eq!(classifier.calls()[0].1, DEFAULT_THRESHOLD);
}

#[tokio::test]
async fn test_handle_dispatches_payload_and_counts_notifications() {
    let revenue = structured_task("revenue", "What was revenue today?", Duration::from_secs(3600));
    let harness = Harness::new(vec![revenue.clone()], 10);
    let engine = harness.alert_engine(Arc::new(RuleClassifier::new()));

    let result = ExecutionResult::success("Revenue up 3%");
    let decision = engine.handle(&item(&revenue, 7), &result).await;
    assert!(decision.notify);

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].task_name, "revenue");
    assert_eq!(sent[0].kind, TaskKind::Structured);
    assert_eq!(sent[0].reason, "automatic alert");
    assert_eq!(sent[0].question, "What was revenue today?");
    assert_eq!(sent[0].timestamp, result.completed_at);
    assert_eq!(harness.status.notifications_sent(), 1);
}

#[tokio::test]
async fn test_negative_decision_sends_nothing() {
    let vip = anomaly_task("vip", "VIP?", ThresholdType::Dropoff, 0.10);
    let harness = Harness::new(vec![vip.clone()], 10);
    let engine = harness.alert_engine(Arc::new(RuleClassifier::new()));

    let decision = engine
        .handle(&item(&vip, 1), &ExecutionResult::success("VIP orders up 4%"))
        .await;

    assert!(!decision.notify);
    assert!(harness.notifier.sent().is_empty());
    assert_eq!(harness.status.notifications_sent(), 0);
}

#[tokio::test]
async fn test_failing_channel_does_not_block_others_or_raise() {
    init_tracing();
    let revenue = structured_task("revenue", "Revenue?", Duration::from_secs(3600));
    let broken = RecordingNotifier::failing();
    let working = RecordingNotifier::new();
    let engine = engine_with(
        FakeClassifier::returning(Classification::normal("unused")),
        vec![Box::new(broken.clone()), Box::new(working.clone())],
    );

    let decision = engine
        .handle(&item(&revenue, 1), &ExecutionResult::success("ok"))
        .await;

    assert!(decision.notify);
    assert_eq!(broken.sent().len(), 1);
    assert_eq!(working.sent().len(), 1);
}

#[tokio::test]
async fn test_all_channels_failing_is_logged_only() {
    let revenue = structured_task("revenue", "Revenue?", Duration::from_secs(3600));
    let harness = Harness::new(vec![revenue.clone()], 10);
    let broken = RecordingNotifier::failing();
    let engine = AlertEngine::new(
        Arc::new(RuleClassifier::new()),
        Arc::new(Dispatcher::new(vec![Box::new(broken.clone())])),
    )
    .with_status(Arc::clone(&harness.status));

    let first = engine.handle(&item(&revenue, 1), &ExecutionResult::success("a")).await;
    let second = engine.handle(&item(&revenue, 2), &ExecutionResult::success("b")).await;

    assert!(first.notify && second.notify);
    assert_eq!(broken.sent().len(), 2, "later alerts still attempted");
    assert_eq!(harness.status.notifications_sent(), 0);
}

#[tokio::test]
async fn test_classification_is_idempotent() {
    let vip = anomaly_task("vip", "VIP?", ThresholdType::Dropoff, 0.10);
    let engine = AlertEngine::new(Arc::new(RuleClassifier::new()), Arc::new(Dispatcher::empty()));
    let result = ExecutionResult::success("VIP orders dropped 35% vs yesterday");

    let first = engine.decide(&vip, &result).await;
    for _ in 0..5 {
        assert_eq!(engine.decide(&vip, &result).await, first);
    }
    assert!(first.notify);
    assert_eq!(first.severity, Some(Severity::High));
}
