// src/history/memory.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{HistoryEntry, HistoryIndex, HistoryStore};
use crate::errors::Result;

/// Stores questions in memory only.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    index: Mutex<HistoryIndex>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self) -> MutexGuard<'_, HistoryIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryStore for MemoryHistory {
    fn contains(&self, question: &str) -> Result<bool> {
        Ok(self.index().contains(question))
    }

    fn record(&self, question: &str, at: DateTime<Utc>) -> Result<()> {
        self.index().insert(HistoryEntry {
            question: question.to_string(),
            recorded_at: at,
        });
        debug!(question = %question, "recorded question (memory)");
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self.index().recent(limit))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.index().len())
    }
}
