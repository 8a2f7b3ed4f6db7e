// src/lib.rs

pub mod alert;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod generate;
pub mod history;
pub mod logging;
pub mod schedule;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::alert::{
    AlertEngine, AnomalyClassifier, CommandClassifier, CommandNotifier, Dispatcher,
    RuleClassifier, TerminalNotifier,
};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::{ConfigFile, NotifySettings};
use crate::engine::{
    BoundedQueue, Runtime, RuntimeOptions, RuntimeStatus, StatusSnapshot, shutdown_channel,
};
use crate::exec::{CommandQueryExecutor, ExecutionWorker, LanePrefixes};
use crate::generate::{CommandTextGenerator, GeneratorSettings, QuestionGenerator};
use crate::history::open_store;
use crate::schedule::{CadenceScheduler, ScheduleOptions, describe_cadence};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - history store, queue, status board
/// - collaborators (executor, generator, classifier, notifiers)
/// - scheduler / worker / runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root_dir = config_root_dir(&config_path);

    let tasks = cfg.active_tasks();
    if tasks.len() < cfg.tasks.len() {
        warn!(
            skipped = cfg.tasks.len() - tasks.len(),
            "exploratory lane disabled; skipping exploratory tasks"
        );
    }
    if tasks.is_empty() {
        bail!("no tasks left to run");
    }

    let Some(executor_settings) = cfg.executor.clone() else {
        bail!("[executor].cmd is required to run tasks");
    };
    if tasks.iter().any(|t| t.is_exploratory()) && cfg.generator.is_none() {
        bail!("exploratory tasks require a [generator] command");
    }

    let queue = Arc::new(BoundedQueue::new(cfg.settings.queue_capacity));
    let status = Arc::new(RuntimeStatus::new(Arc::clone(&queue), &tasks));

    let history_path = resolve_path(&root_dir, &cfg.history.path);
    let history = open_store(cfg.history.storage, &history_path)
        .with_context(|| format!("opening question history at {}", history_path.display()))?;
    let history_before = history.len()?;
    info!(
        storage = ?cfg.history.storage,
        recorded = history_before,
        "question history loaded"
    );

    let schema = match &cfg.exploratory.schema {
        Some(path) => {
            let path = resolve_path(&root_dir, path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("reading schema file {}", path.display()))?
        }
        None => String::new(),
    };

    let mut generator = QuestionGenerator::new(
        Arc::clone(&queue),
        Arc::clone(&history),
        Arc::clone(&status),
        GeneratorSettings {
            schema,
            recent_history: cfg.exploratory.recent_history,
            structured_retry_interval: cfg.settings.structured_retry_interval,
        },
    );
    if let Some(settings) = cfg.generator.clone() {
        generator = generator.with_text_generator(Arc::new(CommandTextGenerator::new(settings)));
    }

    let classifier: Arc<dyn AnomalyClassifier> = match cfg.classifier.clone() {
        Some(settings) => Arc::new(CommandClassifier::new(settings)),
        None => {
            debug!("no [classifier] command; using built-in rule classifier");
            Arc::new(RuleClassifier::new())
        }
    };

    let dispatcher = build_dispatcher(&cfg.notify);
    if dispatcher.is_empty() {
        warn!("no notification channels enabled; alerts will only be logged");
    } else {
        info!(channels = ?dispatcher.channel_names(), "notification channels ready");
    }

    let alerts = AlertEngine::new(classifier, Arc::new(dispatcher)).with_status(Arc::clone(&status));
    let worker = ExecutionWorker::new(
        Arc::clone(&queue),
        Arc::new(CommandQueryExecutor::new(executor_settings.clone())),
        alerts,
        Arc::clone(&status),
    )
    .with_prefixes(LanePrefixes::from_settings(&executor_settings));

    let scheduler = CadenceScheduler::new(
        &tasks,
        Instant::now(),
        ScheduleOptions {
            fire_on_start: cfg.settings.run_on_startup || args.once,
            one_shot: args.once,
        },
    );

    // Ctrl-C → cooperative shutdown.
    let (trigger, signal) = shutdown_channel();
    let trigger = Arc::new(trigger);
    {
        let trigger = Arc::clone(&trigger);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received; shutting down");
                    trigger.trigger();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl+C"),
            }
        });
    }

    let options = RuntimeOptions {
        drain_on_shutdown: cfg.settings.drain_on_shutdown,
        status_interval: cfg.settings.status_interval,
        exit_when_idle: args.once,
    };

    let runtime = Runtime::new(
        scheduler,
        Arc::new(generator),
        worker,
        status,
        signal,
        options,
    );
    let snapshot = runtime.run().await?;
    drop(trigger);

    let history_after = history.len()?;
    print_summary(&snapshot, history_before, history_after);
    Ok(())
}

/// Directory relative paths in the config are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Querywatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Querywatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn build_dispatcher(notify: &NotifySettings) -> Dispatcher {
    let mut dispatcher = Dispatcher::empty();
    if notify.terminal {
        dispatcher.push(Box::new(TerminalNotifier));
    }
    if let Some(settings) = &notify.command {
        dispatcher.push(Box::new(CommandNotifier::new(settings.clone())));
    }
    dispatcher
}

/// Simple dry-run output: print settings and the task table.
fn print_dry_run(cfg: &ConfigFile) {
    println!("querywatch dry-run");
    println!("  config.queue_capacity = {}", cfg.settings.queue_capacity);
    println!(
        "  config.structured_retry_interval = {}",
        describe_cadence(cfg.settings.structured_retry_interval)
    );
    println!("  config.run_on_startup = {}", cfg.settings.run_on_startup);
    println!("  config.drain_on_shutdown = {}", cfg.settings.drain_on_shutdown);
    println!("  exploratory.enabled = {}", cfg.exploratory.enabled);
    println!("  history.storage = {:?}", cfg.history.storage);
    match &cfg.executor {
        Some(exec) => println!("  executor.cmd = {}", exec.cmd),
        None => println!("  executor.cmd = (not set)"),
    }
    if let Some(generator) = &cfg.generator {
        println!("  generator.cmd = {}", generator.cmd);
    }
    match &cfg.classifier {
        Some(classifier) => println!("  classifier.cmd = {}", classifier.cmd),
        None => println!("  classifier = built-in rules"),
    }
    println!();

    println!("tasks ({}):", cfg.tasks.len());
    for task in &cfg.tasks {
        println!("  - {}", task.name);
        println!("      kind: {}", task.kind);
        println!("      cadence: {}", describe_cadence(task.cadence));
        if let Some(question) = &task.question {
            println!("      question: {question}");
        }
        println!("      alert_mode: {}", task.alert_mode);
        if let Some(threshold) = task.threshold {
            println!("      threshold: {} {}", threshold.kind, threshold.value);
        }
        if task.is_exploratory() && !cfg.exploratory.enabled {
            println!("      (skipped: exploratory lane disabled)");
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_summary(snapshot: &StatusSnapshot, history_before: usize, history_after: usize) {
    println!();
    println!("querywatch session summary");
    println!(
        "  questions recorded this session: {}",
        history_after.saturating_sub(history_before)
    );
    println!("  total questions in history: {history_after}");
    println!("  executions: {} ({} failed)", snapshot.executions, snapshot.failed_executions);
    println!("  notifications sent: {}", snapshot.notifications_sent);
    println!(
        "  exploratory skipped: {} queue full, {} duplicate, {} generation failures",
        snapshot.exploratory_skipped_queue_full,
        snapshot.exploratory_duplicates,
        snapshot.generation_failures
    );
    println!("  structured retries: {}", snapshot.structured_retries);
}
