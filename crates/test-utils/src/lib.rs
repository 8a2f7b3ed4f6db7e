pub mod builders;
pub mod fakes;
pub mod harness;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use querywatch::logging::{LOG_ENV_VAR, resolve_filter};
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// Upper bound for anything a test awaits through [`with_timeout`].
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialise tracing for tests with the binary's filter rules.
///
/// Output goes through the test writer, so the harness only shows it for
/// failing tests (or with `-- --nocapture`). Raise the level with e.g.
/// `QUERYWATCH_LOG=querywatch::engine=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_value = std::env::var(LOG_ENV_VAR).ok();
        let (filter, rejected) = resolve_filter(None, env_value.as_deref());

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();

        if let Some(reason) = rejected {
            tracing::warn!("{reason}");
        }
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
///
/// Under `start_paused` time the clock auto-advances, so this bounds
/// simulated time rather than wall time.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}
