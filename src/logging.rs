// src/logging.rs

//! Logging setup for `querywatch` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. the `--log-level` CLI flag
//! 2. the `QUERYWATCH_LOG` environment variable, which takes full
//!    `EnvFilter` directives (e.g. `info,querywatch::alert=debug`)
//! 3. `info`
//!
//! Logs go to STDERR; stdout carries only terminal alerts.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV_VAR: &str = "QUERYWATCH_LOG";

/// Directive used when neither the flag nor the environment sets one.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Build the subscriber filter.
///
/// `env_value` is the raw `QUERYWATCH_LOG` value. An unparsable value falls
/// back to [`DEFAULT_DIRECTIVE`]; the parse error is returned alongside so
/// it can be reported once a subscriber is installed.
pub fn resolve_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(directive(level)), None);
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match EnvFilter::try_new(raw) {
            Ok(filter) => (filter, None),
            Err(e) => (
                EnvFilter::new(DEFAULT_DIRECTIVE),
                Some(format!("invalid {LOG_ENV_VAR} value '{raw}': {e}")),
            ),
        },
        None => (EnvFilter::new(DEFAULT_DIRECTIVE), None),
    }
}

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = resolve_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    if let Some(reason) = rejected {
        warn!("{reason}; using '{DEFAULT_DIRECTIVE}'");
    }
    Ok(())
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
