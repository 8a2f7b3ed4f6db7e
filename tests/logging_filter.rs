// tests/logging_filter.rs

use tracing::level_filters::LevelFilter;

use querywatch::cli::LogLevel;
use querywatch::logging::resolve_filter;

#[test]
fn test_cli_level_wins_over_environment() {
    let (filter, rejected) = resolve_filter(Some(LogLevel::Debug), Some("error"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    assert!(rejected.is_none());
}

#[test]
fn test_environment_takes_full_directives() {
    let (filter, rejected) = resolve_filter(None, Some("warn,querywatch::alert=trace"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    assert!(rejected.is_none());
}

#[test]
fn test_missing_or_blank_environment_defaults_to_info() {
    for env in [None, Some(""), Some("   ")] {
        let (filter, rejected) = resolve_filter(None, env);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO), "{env:?}");
        assert!(rejected.is_none());
    }
}

#[test]
fn test_invalid_environment_falls_back_and_reports() {
    let (filter, rejected) = resolve_filter(None, Some("querywatch=loud"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    let reason = rejected.expect("parse error reported");
    assert!(reason.contains("QUERYWATCH_LOG"), "{reason}");
}
