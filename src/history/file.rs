// src/history/file.rs

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{HistoryEntry, HistoryIndex, HistoryStore};
use crate::errors::Result;

/// Append-only question log on disk.
///
/// One line per question: `<rfc3339 timestamp>\t<question>`. Whitespace in
/// the question (including newlines) is collapsed to single spaces before
/// writing so that every record stays on one line.
#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
    index: Mutex<HistoryIndex>,
}

impl FileHistory {
    /// Open (or create) the log at `path`, loading existing entries.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let index = load_entries(&path)?;
        info!(path = ?path, entries = index.len(), "opened question history");

        Ok(Self {
            path,
            index: Mutex::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn index(&self) -> MutexGuard<'_, HistoryIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryStore for FileHistory {
    fn contains(&self, question: &str) -> Result<bool> {
        Ok(self.index().contains(question))
    }

    fn record(&self, question: &str, at: DateTime<Utc>) -> Result<()> {
        let question = single_line(question);

        // Hold the lock across the append so lines from concurrent
        // generators never interleave.
        let mut index = self.index();
        append_line(&self.path, &question, at)?;
        index.insert(HistoryEntry {
            question: question.clone(),
            recorded_at: at,
        });
        debug!(question = %question, "recorded question (file)");
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self.index().recent(limit))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.index().len())
    }
}

fn single_line(question: &str) -> String {
    question.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn load_entries(path: &Path) -> Result<HistoryIndex> {
    let mut index = HistoryIndex::default();

    if !path.exists() {
        return Ok(index);
    }

    let file = File::open(path)
        .with_context(|| format!("opening history file at {:?}", path))?;
    let reader = BufReader::new(file);

    for (lineno, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((ts, question)) = trimmed.split_once('\t') else {
            warn!(line = lineno + 1, "skipping malformed history line");
            continue;
        };

        let recorded_at = match DateTime::parse_from_rfc3339(ts) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "skipping history line with bad timestamp");
                continue;
            }
        };

        index.insert(HistoryEntry {
            question: question.trim().to_string(),
            recorded_at,
        });
    }

    Ok(index)
}

fn append_line(path: &Path, question: &str, at: DateTime<Utc>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating history directory at {:?}", parent))?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening history file at {:?}", path))?;

    writeln!(file, "{}\t{}", at.to_rfc3339(), question)?;
    Ok(())
}
