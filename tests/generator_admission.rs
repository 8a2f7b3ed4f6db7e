// tests/generator_admission.rs

use std::sync::Arc;
use std::time::Duration;

use querywatch::engine::{WorkRequest, shutdown_channel};
use querywatch::generate::{ExploreOutcome, StructuredAdmission, clean_generated, normalize_question};
use querywatch::history::HistoryStore;
use querywatch_test_utils::builders::{exploratory_task, structured_task};
use querywatch_test_utils::fakes::FakeTextGenerator;
use querywatch_test_utils::harness::Harness;
use querywatch_test_utils::{init_tracing, with_timeout};

fn hour() -> Duration {
    Duration::from_secs(3600)
}

#[tokio::test]
async fn test_exploratory_firing_on_full_queue_never_calls_generation() {
    init_tracing();
    let explore = exploratory_task("explore", hour());
    let revenue = structured_task("revenue", "Revenue today?", hour());
    let harness = Harness::new(vec![revenue.clone(), explore.clone()], 10);
    let generator = harness.generator();

    for _ in 0..10 {
        assert!(harness.queue.enqueue(&WorkRequest::structured(&revenue).unwrap()));
    }

    let (_trigger, signal) = shutdown_channel();
    let outcome = generator.explore(&explore, signal).await;

    assert_eq!(outcome, ExploreOutcome::SkippedQueueFull);
    assert_eq!(harness.text_generator.calls(), 0);
    assert_eq!(harness.history.len().unwrap(), 0);
    assert_eq!(harness.queue.len(), 10);
    assert_eq!(harness.status.snapshot().exploratory_skipped_queue_full, 1);
}

#[tokio::test]
async fn test_eleventh_exploratory_attempt_is_dropped_and_not_recorded() {
    init_tracing();
    let explore = exploratory_task("explore", hour());
    let harness = Harness::new(vec![explore.clone()], 10);
    let generator = harness.generator();
    let (_trigger, signal) = shutdown_channel();

    for i in 1..=10 {
        match generator.explore(&explore, signal.clone()).await {
            ExploreOutcome::Enqueued { question, .. } => {
                assert_eq!(question, format!("exploratory question {i}"))
            }
            other => panic!("attempt {i}: expected Enqueued, got {other:?}"),
        }
    }

    let outcome = generator.explore(&explore, signal.clone()).await;
    assert_eq!(outcome, ExploreOutcome::SkippedQueueFull);

    assert_eq!(harness.text_generator.calls(), 10);
    assert_eq!(harness.history.len().unwrap(), 10);
    assert!(!harness.history.contains("exploratory question 11").unwrap());
    assert_eq!(harness.queue.len(), 10);
}

#[tokio::test]
async fn test_duplicate_question_is_not_enqueued() {
    let explore = exploratory_task("explore", hour());
    let harness = Harness::new(vec![explore.clone()], 10).with_text_generator(
        FakeTextGenerator::with_replies(&["Which region grew fastest this week?", "which region grew fastest this week"]),
    );
    let generator = harness.generator();
    let (_trigger, signal) = shutdown_channel();

    let first = generator.explore(&explore, signal.clone()).await;
    assert!(matches!(first, ExploreOutcome::Enqueued { .. }));

    let second = generator.explore(&explore, signal).await;
    assert_eq!(
        second,
        ExploreOutcome::Duplicate {
            question: "which region grew fastest this week".to_string()
        }
    );

    assert_eq!(harness.queue.len(), 1);
    assert_eq!(harness.history.len().unwrap(), 1);
    assert_eq!(harness.status.snapshot().exploratory_duplicates, 1);
}

#[tokio::test]
async fn test_generation_failure_skips_firing() {
    let explore = exploratory_task("explore", hour());
    let fake = FakeTextGenerator::new();
    fake.push_error("model overloaded");
    let harness = Harness::new(vec![explore.clone()], 10).with_text_generator(fake);
    let generator = harness.generator();
    let (_trigger, signal) = shutdown_channel();

    match generator.explore(&explore, signal.clone()).await {
        ExploreOutcome::GenerationFailed { reason } => assert!(reason.contains("model overloaded")),
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
    assert!(harness.queue.is_empty());
    assert_eq!(harness.status.snapshot().generation_failures, 1);

    // The next firing works again.
    assert!(matches!(
        generator.explore(&explore, signal).await,
        ExploreOutcome::Enqueued { .. }
    ));
}

#[tokio::test]
async fn test_blank_generation_counts_as_failure() {
    let explore = exploratory_task("explore", hour());
    let harness = Harness::new(vec![explore.clone()], 10)
        .with_text_generator(FakeTextGenerator::with_replies(&["  \"\"  "]));
    let generator = harness.generator();
    let (_trigger, signal) = shutdown_channel();

    assert!(matches!(
        generator.explore(&explore, signal).await,
        ExploreOutcome::GenerationFailed { .. }
    ));
    assert!(harness.queue.is_empty());
}

#[tokio::test]
async fn test_generated_text_is_cleaned_before_enqueue() {
    let explore = exploratory_task("explore", hour());
    let harness = Harness::new(vec![explore.clone()], 10).with_text_generator(
        FakeTextGenerator::with_replies(&["\n\"Question: Which product sold most today?\"\n"]),
    );
    let generator = harness.generator();
    let (_trigger, signal) = shutdown_channel();

    generator.explore(&explore, signal).await;

    let item = harness.queue.try_dequeue().expect("item queued");
    assert_eq!(item.question, "Which product sold most today?");
    assert_eq!(item.task_name(), "explore");
}

#[tokio::test]
async fn test_generation_sees_recent_history_newest_first() {
    let explore = exploratory_task("explore", hour());
    let harness = Harness::new(vec![explore.clone()], 10);
    let generator = harness.generator();
    let (_trigger, signal) = shutdown_channel();

    for _ in 0..3 {
        generator.explore(&explore, signal.clone()).await;
    }

    let seen = harness.text_generator.seen_history();
    assert_eq!(seen[0], Vec::<String>::new());
    assert_eq!(
        seen[2],
        vec![
            "exploratory question 2".to_string(),
            "exploratory question 1".to_string()
        ]
    );
}

#[tokio::test]
async fn test_closed_queue_ends_exploration() {
    let explore = exploratory_task("explore", hour());
    let harness = Harness::new(vec![explore.clone()], 10);
    let generator = harness.generator();
    harness.queue.close();

    let (_trigger, signal) = shutdown_channel();
    assert_eq!(generator.explore(&explore, signal).await, ExploreOutcome::Closed);
    assert_eq!(harness.text_generator.calls(), 0);
}

#[tokio::test]
async fn test_structured_admission_uses_fixed_question() {
    let revenue = structured_task("revenue", "What was revenue today vs yesterday?", hour());
    let harness = Harness::new(vec![revenue.clone()], 1);
    let generator = harness.generator();

    assert!(matches!(
        generator.admit_structured(&revenue),
        StructuredAdmission::Admitted { seq: 1 }
    ));
    match generator.admit_structured(&revenue) {
        StructuredAdmission::QueueFull(request) => {
            assert_eq!(request.question, "What was revenue today vs yesterday?")
        }
        other => panic!("expected QueueFull, got {other:?}"),
    }
    assert_eq!(harness.text_generator.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_structured_retry_admits_once_space_frees() {
    init_tracing();
    let vip = structured_task("vip", "How many VIP orders today?", hour());
    let filler = structured_task("filler", "filler?", hour());
    let harness =
        Harness::new(vec![vip.clone(), filler.clone()], 2).with_retry_interval(Duration::from_secs(1));
    let generator = Arc::new(harness.generator());

    for _ in 0..2 {
        harness.queue.try_enqueue(&WorkRequest::structured(&filler).unwrap()).unwrap();
    }

    let StructuredAdmission::QueueFull(request) = generator.admit_structured(&vip) else {
        panic!("queue should be full");
    };

    let (_trigger, signal) = shutdown_channel();
    let retry = {
        let generator = Arc::clone(&generator);
        tokio::spawn(async move { generator.retry_structured(request, signal).await })
    };

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(harness.status.snapshot().structured_retries, 3);
    assert!(!retry.is_finished());

    harness.queue.try_dequeue().unwrap();
    assert!(with_timeout(retry).await.unwrap());

    assert_eq!(harness.status.snapshot().structured_retries, 4);
    let questions: Vec<_> = std::iter::from_fn(|| harness.queue.try_dequeue())
        .map(|i| i.question)
        .collect();
    assert_eq!(questions, vec!["filler?".to_string(), "How many VIP orders today?".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_structured_retry_is_abandoned_on_shutdown() {
    let vip = structured_task("vip", "VIP?", hour());
    let harness = Harness::new(vec![vip.clone()], 1);
    let generator = Arc::new(harness.generator());
    harness.queue.try_enqueue(&WorkRequest::structured(&vip).unwrap()).unwrap();

    let StructuredAdmission::QueueFull(request) = generator.admit_structured(&vip) else {
        panic!("queue should be full");
    };

    let (trigger, signal) = shutdown_channel();
    let retry = {
        let generator = Arc::clone(&generator);
        tokio::spawn(async move { generator.retry_structured(request, signal).await })
    };

    tokio::time::sleep(Duration::from_millis(2500)).await;
    trigger.trigger();

    assert!(!with_timeout(retry).await.unwrap());
    assert_eq!(harness.queue.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_structured_admits_or_waits_for_room() {
    let vip = structured_task("vip", "VIP?", hour());
    let harness = Harness::new(vec![vip.clone()], 1).with_retry_interval(Duration::from_millis(500));
    let generator = Arc::new(harness.generator());
    let (_trigger, signal) = shutdown_channel();

    assert!(generator.run_structured(&vip, signal.clone()).await);
    assert_eq!(harness.status.snapshot().structured_retries, 0);

    let waiting = {
        let generator = Arc::clone(&generator);
        let vip = Arc::clone(&vip);
        tokio::spawn(async move { generator.run_structured(&vip, signal).await })
    };
    tokio::time::sleep(Duration::from_millis(1200)).await;
    harness.queue.try_dequeue().unwrap();

    assert!(with_timeout(waiting).await.unwrap());
    assert_eq!(harness.queue.len(), 1);

    harness.queue.close();
    let (_trigger, signal) = shutdown_channel();
    assert!(!generator.run_structured(&vip, signal).await);
}

#[test]
fn test_clean_and_normalize() {
    assert_eq!(clean_generated("  1. What sold best?  ").as_deref(), Some("What sold best?"));
    assert_eq!(clean_generated("Q: 'Top region?'").as_deref(), Some("Top region?"));
    assert_eq!(clean_generated("\"\u{201c}  \u{201d}\""), None);

    assert_eq!(
        normalize_question("  What's   the TOP region, today? "),
        "whats the top region today"
    );
}
