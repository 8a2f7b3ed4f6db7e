// src/generate/normalize.rs

//! Question cleanup and duplicate fingerprints.

use std::sync::LazyLock;

use blake3::Hasher;
use regex::Regex;

/// Leading labels generators like to emit: `Question:`, `Q:`, `1.`, `2)`.
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:q(?:uestion)?\s*[:\-]\s*|\d+[.)]\s+)").expect("valid label regex")
});

/// Anything that is not a letter, digit or whitespace.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("valid punctuation regex"));

const QUOTES: &[char] = &['"', '\'', '`', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Tidy raw generator output into a single question.
///
/// Trims, strips surrounding quotes and leading labels, and collapses
/// whitespace. Returns `None` when nothing usable is left.
pub fn clean_generated(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(QUOTES).trim();
    let unlabelled = LEADING_LABEL.replace(trimmed, "");
    let cleaned = unlabelled
        .trim()
        .trim_matches(QUOTES)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Canonical form used for duplicate detection: lowercase, punctuation
/// removed, whitespace collapsed.
pub fn normalize_question(question: &str) -> String {
    let lowered = question.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable fingerprint of the normalized question.
pub fn fingerprint(question: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(normalize_question(question).as_bytes());
    hasher.finalize().to_hex().to_string()
}
