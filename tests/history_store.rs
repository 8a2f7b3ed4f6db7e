// tests/history_store.rs

use std::fs;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use querywatch::history::{FileHistory, HistoryStore, MemoryHistory, open_store};
use querywatch::types::HistoryStorageMode;

#[test]
fn test_memory_history_dedups_on_normalized_text() {
    let history = MemoryHistory::new();
    history.record("What is the top region today?", Utc::now()).unwrap();

    assert!(history.contains("what is the TOP region today").unwrap());
    assert!(history.contains("  What is the top   region, today?? ").unwrap());
    assert!(!history.contains("What is the top region this week?").unwrap());
    assert_eq!(history.len().unwrap(), 1);
}

#[test]
fn test_recent_is_newest_first_and_limited() {
    let history = MemoryHistory::new();
    for i in 1..=5 {
        history.record(&format!("question {i}"), Utc::now()).unwrap();
    }

    assert_eq!(
        history.recent(3).unwrap(),
        vec!["question 5", "question 4", "question 3"]
    );
    assert_eq!(history.recent(50).unwrap().len(), 5);
    assert!(history.recent(0).unwrap().is_empty());
}

#[test]
fn test_file_history_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("history");
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    {
        let history = FileHistory::open(&path).unwrap();
        assert_eq!(history.len().unwrap(), 0);
        history.record("Which SKU sold most\nyesterday?", at).unwrap();
        history.record("How many refunds today?", at).unwrap();
    }

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], format!("{}\tWhich SKU sold most yesterday?", at.to_rfc3339()));

    let reopened = FileHistory::open(&path).unwrap();
    assert_eq!(reopened.len().unwrap(), 2);
    assert!(reopened.contains("which sku sold most yesterday").unwrap());
    assert_eq!(reopened.recent(1).unwrap(), vec!["How many refunds today?"]);
}

#[test]
fn test_file_history_skips_malformed_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history");
    fs::write(
        &path,
        "2025-03-01T12:00:00+00:00\tgood question?\n\
         not a record\n\
         yesterday\tbad timestamp?\n\
         \n",
    )
    .unwrap();

    let history = FileHistory::open(&path).unwrap();
    assert_eq!(history.len().unwrap(), 1);
    assert!(history.contains("good question").unwrap());
}

#[test]
fn test_open_store_by_mode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history");

    let memory = open_store(HistoryStorageMode::Memory, &path).unwrap();
    memory.record("q?", Utc::now()).unwrap();
    assert!(!path.exists(), "memory mode never touches disk");

    let file = open_store(HistoryStorageMode::File, &path).unwrap();
    file.record("q?", Utc::now()).unwrap();
    assert!(path.exists());
}
