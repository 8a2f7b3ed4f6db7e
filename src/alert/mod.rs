// src/alert/mod.rs

//! Alert pipeline: classify results, decide, notify.

pub mod classifier;
pub mod command;
pub mod engine;
pub mod notifier;
pub mod rules;

pub use classifier::{AnomalyClassifier, Classification};
pub use command::{CommandClassifier, CommandNotifier};
pub use engine::{AUTOMATIC_REASON, AlertDecision, AlertEngine, NO_ANOMALY_REASON};
pub use notifier::{DispatchResult, Dispatcher, Notifier, NotifyPayload, TerminalNotifier};
pub use rules::RuleClassifier;
