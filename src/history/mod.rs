// src/history/mod.rs

//! Durable record of exploratory questions, used for duplicate suppression
//! and as context for generating the next question.
//!
//! Questions are compared by fingerprint (blake3 over the normalized text),
//! so "What is X?" and "  what is x " count as the same question.

pub mod file;
pub mod memory;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::generate::normalize::fingerprint;
use crate::types::HistoryStorageMode;

pub use file::FileHistory;
pub use memory::MemoryHistory;

/// Abstract storage for question history.
pub trait HistoryStore: Send + Sync {
    /// Whether an equivalent question was already recorded.
    fn contains(&self, question: &str) -> Result<bool>;

    /// Record a question. Recording an equivalent question twice is allowed.
    fn record(&self, question: &str, at: DateTime<Utc>) -> Result<()>;

    /// Up to `limit` most recent questions, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<String>>;

    /// Number of recorded questions.
    fn len(&self) -> Result<usize>;
}

/// Build the configured history store.
pub fn open_store(mode: HistoryStorageMode, path: &Path) -> Result<Arc<dyn HistoryStore>> {
    match mode {
        HistoryStorageMode::Memory => Ok(Arc::new(MemoryHistory::new())),
        HistoryStorageMode::File => Ok(Arc::new(FileHistory::open(path)?)),
    }
}

/// One recorded question.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub question: String,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory index shared by both store implementations.
#[derive(Debug, Default)]
pub(crate) struct HistoryIndex {
    fingerprints: HashSet<String>,
    entries: Vec<HistoryEntry>,
}

impl HistoryIndex {
    pub(crate) fn contains(&self, question: &str) -> bool {
        self.fingerprints.contains(&fingerprint(question))
    }

    pub(crate) fn insert(&mut self, entry: HistoryEntry) {
        self.fingerprints.insert(fingerprint(&entry.question));
        self.entries.push(entry);
    }

    pub(crate) fn recent(&self, limit: usize) -> Vec<String> {
        self.entries
            .iter()
            .rev()
            .take(limit)
            .map(|e| e.question.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
