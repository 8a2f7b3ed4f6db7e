// tests/runtime_fake_collaborators.rs

use std::sync::Arc;
use std::time::Duration;

use querywatch::alert::RuleClassifier;
use querywatch::engine::{RuntimeOptions, WorkRequest, shutdown_channel};
use querywatch::exec::{ExecutionWorker, LanePrefixes};
use querywatch::history::HistoryStore;
use querywatch::schedule::ScheduleOptions;
use querywatch::types::{Severity, TaskKind, ThresholdType};
use querywatch_test_utils::builders::{anomaly_task, exploratory_task, structured_task};
use querywatch_test_utils::fakes::{FakeExecutor, FakeTextGenerator};
use querywatch_test_utils::harness::Harness;
use querywatch_test_utils::init_tracing;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn once() -> (ScheduleOptions, RuntimeOptions) {
    (
        ScheduleOptions {
            fire_on_start: true,
            one_shot: true,
        },
        RuntimeOptions {
            exit_when_idle: true,
            ..RuntimeOptions::default()
        },
    )
}

#[tokio::test(start_paused = true)]
async fn test_single_pass_runs_every_lane_and_alerts() {
    init_tracing();
    let tasks = vec![
        structured_task("revenue", "What was revenue today vs yesterday?", secs(3600)),
        exploratory_task("explore", secs(3600)),
        anomaly_task("vip", "How many VIP orders today vs yesterday?", ThresholdType::Dropoff, 0.10),
        structured_task("broken", "BROKEN question", secs(3600)),
    ];
    let harness = Harness::new(tasks, 10)
        .with_executor(FakeExecutor::new("orders dropped 20% vs yesterday").failing_on("BROKEN"));

    let (schedule, options) = once();
    let (_trigger, signal) = shutdown_channel();
    let snapshot = harness.runtime(schedule, options, signal).run().await.unwrap();

    // Structured work is admitted inline at firing time, exploratory work
    // after its generation call.
    assert_eq!(
        harness.executor.executed(),
        vec![
            "What was revenue today vs yesterday?".to_string(),
            "How many VIP orders today vs yesterday?".to_string(),
            "BROKEN question".to_string(),
            "exploratory question 1".to_string(),
        ]
    );

    assert_eq!(snapshot.executions, 4);
    assert_eq!(snapshot.failed_executions, 1);
    assert_eq!(snapshot.questions_recorded, 1);
    assert_eq!(snapshot.queue_len, 0);

    let sent = harness.notifier.sent();
    let reasons: Vec<_> = sent.iter().map(|p| (p.task_name.as_str(), p.reason.as_str())).collect();
    assert!(reasons.contains(&("revenue", "automatic alert")));
    assert!(reasons.contains(&("vip", "dropped 20%, exceeds 10% threshold")));
    assert!(reasons.contains(&("broken", "execution failed: backend unavailable")));

    let broken = sent.iter().find(|p| p.task_name == "broken").unwrap();
    assert_eq!(broken.severity, Some(Severity::High));

    // Exploratory tasks alert automatically unless configured otherwise.
    let explore = sent.iter().find(|p| p.task_name == "explore").unwrap();
    assert_eq!(explore.kind, TaskKind::Exploratory);
    assert_eq!(explore.question, "exploratory question 1");

    assert_eq!(snapshot.notifications_sent, 4);
    assert_eq!(harness.history.len().unwrap(), 1);

    for task in &snapshot.tasks {
        assert_eq!(task.activity.firings, 1, "{} fired once", task.name);
        assert!(task.activity.last_fired.is_some());
        assert!(task.activity.last_completed.is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn test_tasks_fire_once_per_cadence() {
    let tasks = vec![
        structured_task("fast", "fast?", secs(10)),
        structured_task("slow", "slow?", secs(30)),
    ];
    let harness = Harness::new(tasks, 10);

    let (trigger, signal) = shutdown_channel();
    let runtime = harness.runtime(ScheduleOptions::default(), RuntimeOptions::default(), signal);
    let handle = tokio::spawn(runtime.run());

    tokio::time::sleep(Duration::from_millis(65_500)).await;
    trigger.trigger();
    let snapshot = handle.await.unwrap().unwrap();

    let firings = |name: &str| {
        snapshot
            .tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.activity.firings)
    };
    assert_eq!(firings("fast"), Some(6));
    assert_eq!(firings("slow"), Some(2));
    assert_eq!(snapshot.executions, 8);
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_retries_structured_and_skips_exploratory() {
    init_tracing();
    let tasks = vec![
        structured_task("first", "first?", secs(3600)),
        structured_task("second", "second?", secs(3600)),
        exploratory_task("explore", secs(3600)),
    ];
    let harness = Harness::new(tasks, 1)
        .with_executor(FakeExecutor::new("ok").with_delay(secs(5)))
        .with_retry_interval(secs(1));

    let (schedule, options) = once();
    let (_trigger, signal) = shutdown_channel();
    let snapshot = harness.runtime(schedule, options, signal).run().await.unwrap();

    assert_eq!(
        harness.executor.executed(),
        vec!["first?".to_string(), "second?".to_string()]
    );
    assert_eq!(harness.text_generator.calls(), 0, "no generation while the queue is full");
    assert_eq!(snapshot.exploratory_skipped_queue_full, 1);
    assert_eq!(snapshot.structured_retries, 1);
    assert_eq!(snapshot.executions, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_without_drain_discards_queued_work() {
    let tasks = vec![
        structured_task("a", "a?", secs(3600)),
        structured_task("b", "b?", secs(3600)),
        structured_task("c", "c?", secs(3600)),
    ];
    let harness = Harness::new(tasks, 5).with_executor(FakeExecutor::new("ok").with_delay(secs(10)));

    let (trigger, signal) = shutdown_channel();
    let runtime = harness.runtime(
        ScheduleOptions {
            fire_on_start: true,
            one_shot: false,
        },
        RuntimeOptions {
            drain_on_shutdown: false,
            ..RuntimeOptions::default()
        },
        signal,
    );
    let handle = tokio::spawn(runtime.run());

    tokio::time::sleep(secs(1)).await;
    trigger.trigger();
    let snapshot = handle.await.unwrap().unwrap();

    // The in-flight item completes; the two queued ones are dropped.
    assert_eq!(harness.executor.executed(), vec!["a?".to_string()]);
    assert_eq!(snapshot.executions, 1);
    assert_eq!(snapshot.queue_len, 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_with_drain_finishes_queued_work() {
    let tasks = vec![
        structured_task("a", "a?", secs(3600)),
        structured_task("b", "b?", secs(3600)),
    ];
    let harness = Harness::new(tasks, 5).with_executor(FakeExecutor::new("ok").with_delay(secs(10)));

    let (trigger, signal) = shutdown_channel();
    let runtime = harness.runtime(
        ScheduleOptions {
            fire_on_start: true,
            one_shot: false,
        },
        RuntimeOptions::default(),
        signal,
    );
    let handle = tokio::spawn(runtime.run());

    tokio::time::sleep(secs(1)).await;
    trigger.trigger();
    let snapshot = handle.await.unwrap().unwrap();

    assert_eq!(snapshot.executions, 2);
    assert!(harness.queue.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_admission_before_in_flight_generation_ends() {
    let tasks = vec![
        structured_task("revenue", "Revenue?", secs(3600)),
        exploratory_task("explore", secs(3600)),
    ];
    let harness = Harness::new(tasks, 10)
        .with_text_generator(FakeTextGenerator::new().with_delay(secs(5)));

    let (trigger, signal) = shutdown_channel();
    let runtime = harness.runtime(
        ScheduleOptions {
            fire_on_start: true,
            one_shot: false,
        },
        RuntimeOptions::default(),
        signal,
    );
    let handle = tokio::spawn(runtime.run());

    tokio::time::sleep(secs(1)).await;
    assert_eq!(harness.text_generator.calls(), 1, "generation in flight");
    trigger.trigger();
    let snapshot = handle.await.unwrap().unwrap();

    assert!(harness.queue.is_closed());
    assert_eq!(harness.executor.executed(), vec!["Revenue?".to_string()]);
    assert_eq!(harness.history.len().unwrap(), 0);
    assert_eq!(snapshot.questions_recorded, 0);
    assert_eq!(snapshot.executions, 1);
}

#[tokio::test]
async fn test_worker_applies_lane_prefixes() {
    let structured = structured_task("revenue", "Revenue today?", secs(60));
    let explore = exploratory_task("explore", secs(60));
    let harness = Harness::new(vec![structured.clone(), explore.clone()], 10);

    let worker = ExecutionWorker::new(
        Arc::clone(&harness.queue),
        Arc::new(harness.executor.clone()),
        harness.alert_engine(Arc::new(RuleClassifier::new())),
        Arc::clone(&harness.status),
    )
    .with_prefixes(LanePrefixes {
        structured: Some("hosted app".to_string()),
        exploratory: Some("  ".to_string()),
    });

    harness.queue.enqueue(&WorkRequest::structured(&structured).unwrap());
    harness.queue.enqueue(&WorkRequest::new(Arc::clone(&explore), "Top SKU?"));
    harness.queue.close();
    assert_eq!(worker.run().await, 2);

    assert_eq!(
        harness.executor.executed(),
        vec!["hosted app: Revenue today?".to_string(), "Top SKU?".to_string()]
    );

    // Alerts carry the question as configured, without the prefix.
    let sent = harness.notifier.sent();
    assert_eq!(sent[0].question, "Revenue today?");
}
