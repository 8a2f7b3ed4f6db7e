// src/config/mod.rs

//! Configuration loading and validation for querywatch.
//!
//! - `model.rs` holds the TOML-backed raw model and the validated [`ConfigFile`].
//! - `definition.rs` holds the immutable [`TaskDefinition`]s handed to the core.
//! - `loader.rs` reads files; `validate.rs` converts raw into validated.

pub mod definition;
pub mod loader;
pub mod model;
pub mod validate;

pub use definition::{AnomalyThreshold, DEFAULT_THRESHOLD, TaskDefinition};
pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    ClassifierSection, CommandSettings, ConfigFile, ConfigSection, ExecutorSection,
    ExecutorSettings, ExploratorySection, GeneratorSection, HistorySection, NotifySection,
    NotifySettings, RawConfigFile, Settings, TaskConfig, ThresholdConfig,
};
