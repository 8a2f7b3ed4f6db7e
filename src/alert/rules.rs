// src/alert/rules.rs

//! Built-in deterministic classifier.
//!
//! Reads changes straight out of the result text:
//! - percentages carrying a sign or a direction word ("dropped 15%", "-15%",
//!   "12.5% higher") are changes as written;
//! - otherwise two or more bare percentages, or failing that plain numbers,
//!   are read as levels and compared. Period words next to a value ("today",
//!   "this week" versus "yesterday", "last week", "previous") decide which
//!   level is current and which is prior; without them the text order is
//!   used, earlier value first.
//!
//! The same input always yields the same verdict.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};

use crate::alert::classifier::{AnomalyClassifier, Classification};
use crate::config::AnomalyThreshold;
use crate::errors::Result;
use crate::types::{Severity, ThresholdType};

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?:\b(?P<pre>up|down|rose|rise|rising|fell|fall|falling|grew|grow|gained?|lost|
            increased?|decreased?|dropped|drops?|declined?|declining|spiked?|jumped|plunged?|surged?)
            \b[^\d%+\-]{0,12})?
        (?P<sign>[+\-\x{2212}])?\s*
        (?P<num>\d+(?:\.\d+)?)\s*%
        (?:\s*(?P<post>higher|lower|more|less|up|down|increase|decrease|drop|decline|growth)\b)?",
    )
    .expect("valid percent regex")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+\-]?\d[\d,]*(?:\.\d+)?").expect("valid number regex"));

static PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:
            (?P<current>today|tonight|this\s+(?:hour|day|week|month|quarter|year)|current(?:ly)?|now|latest)
          | (?P<prior>yesterday|last\s+(?:hour|day|week|month|quarter|year)|previous(?:ly)?|prior|earlier|before
              |a\s+(?:day|week|month|year)\s+ago)
        )\b",
    )
    .expect("valid period regex")
});

/// Words and punctuation that separate one value's context from another's.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:vs|versus|compared|against|than|while|whereas|and|then|but)\b|[,;|]")
        .expect("valid separator regex")
});

/// A period word used as a label, as in "yesterday: 100".
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[:=]").expect("valid label regex"));

/// Longest stretch of text allowed between a value and its period word.
const MAX_PERIOD_GAP: usize = 40;

const DOWN_WORDS: &[&str] = &[
    "down", "fell", "fall", "falling", "lost", "decrease", "decreased", "dropped", "drop", "drops",
    "decline", "declined", "declining", "plunge", "plunged", "lower", "less",
];

/// Deterministic [`AnomalyClassifier`] used when no classifier command is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of [`AnomalyClassifier::classify`].
    pub fn evaluate(&self, result_text: &str, threshold: AnomalyThreshold) -> Classification {
        let changes = extract_changes(result_text);
        if changes.is_empty() {
            return Classification::normal("no comparable values found");
        }

        let candidate = match threshold.kind {
            ThresholdType::Dropoff => changes.iter().copied().filter(|c| *c < 0.0).reduce(f64::min),
            ThresholdType::Spike => changes.iter().copied().filter(|c| *c > 0.0).reduce(f64::max),
            ThresholdType::PercentChange | ThresholdType::General => changes
                .iter()
                .copied()
                .reduce(|a, b| if b.abs() > a.abs() { b } else { a }),
        };

        let Some(change) = candidate else {
            let direction = match threshold.kind {
                ThresholdType::Dropoff => "decrease",
                _ => "increase",
            };
            return Classification::normal(format!("no {direction} detected"));
        };

        let magnitude = change.abs();
        let noun = match threshold.kind {
            ThresholdType::General => "sensitivity",
            _ => "threshold",
        };
        let summary = format!("{} {}%", verb(change), format_pct(magnitude));
        let limit = format!("{}% {noun}", format_pct(threshold.value));

        if magnitude > threshold.value {
            Classification::anomaly(
                format!("{summary}, exceeds {limit}"),
                severity_for(magnitude, threshold.value),
            )
        } else {
            Classification::normal(format!("{summary}, within {limit}"))
        }
    }
}

#[async_trait]
impl AnomalyClassifier for RuleClassifier {
    async fn classify(&self, result_text: &str, threshold: AnomalyThreshold) -> Result<Classification> {
        Ok(self.evaluate(result_text, threshold))
    }
}

/// Relative changes (as fractions, signed) found in `text`.
pub fn extract_changes(text: &str) -> Vec<f64> {
    let mut changes = Vec::new();
    let mut levels = Vec::new();

    for caps in PERCENT.captures_iter(text) {
        let (Some(whole), Some(num)) = (caps.get(0), caps.name("num")) else {
            continue;
        };
        let Ok(value) = num.as_str().parse::<f64>() else {
            continue;
        };
        let fraction = value / 100.0;

        if is_directional(&caps) {
            changes.push(if is_downward(&caps) { -fraction } else { fraction });
        } else {
            levels.push(Reading {
                value: fraction,
                start: num.start(),
                end: whole.end(),
            });
        }
    }

    if !changes.is_empty() {
        return changes;
    }
    if levels.len() >= 2 {
        return compare_levels(text, &levels);
    }

    let numbers: Vec<Reading> = NUMBER
        .find_iter(text)
        .filter_map(|m| {
            let value = m.as_str().replace(',', "").parse::<f64>().ok()?;
            Some(Reading {
                value,
                start: m.start(),
                end: m.end(),
            })
        })
        .collect();
    compare_levels(text, &numbers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Current,
    Prior,
}

/// A level value and where it sits in the text.
#[derive(Debug, Clone, Copy)]
struct Reading {
    value: f64,
    start: usize,
    end: usize,
}

/// Pair prior and current levels and return their relative changes.
fn compare_levels(text: &str, readings: &[Reading]) -> Vec<f64> {
    let periods: Vec<Option<Period>> = readings.iter().map(|r| period_of(text, r)).collect();
    let tagged = |want: Period| -> Vec<f64> {
        readings
            .iter()
            .zip(&periods)
            .filter(|(_, p)| **p == Some(want))
            .map(|(r, _)| r.value)
            .collect()
    };
    let current = tagged(Period::Current);
    let prior = tagged(Period::Prior);

    let pairs: Vec<(f64, f64)> = if !current.is_empty() && !prior.is_empty() {
        prior.into_iter().zip(current).collect()
    } else if let ([first, second], [p0, p1]) = (readings, periods.as_slice()) {
        // At most one side is labelled; the other value is its counterpart.
        if *p0 == Some(Period::Current) || *p1 == Some(Period::Prior) {
            vec![(second.value, first.value)]
        } else {
            vec![(first.value, second.value)]
        }
    } else {
        match readings {
            [.., previous, latest] => vec![(previous.value, latest.value)],
            _ => Vec::new(),
        }
    };

    pairs
        .into_iter()
        .filter(|(previous, _)| *previous != 0.0)
        .map(|(previous, latest)| (latest - previous) / previous.abs())
        .collect()
}

/// Period word attached to a value: the closest one not cut off by another
/// value or a separator. A labelling word ("yesterday: 100") only applies
/// forward.
fn period_of(text: &str, reading: &Reading) -> Option<Period> {
    PERIOD
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let period = if caps.name("current").is_some() {
                Period::Current
            } else {
                Period::Prior
            };

            let (gap, after) = if m.end() <= reading.start {
                (&text[m.end()..reading.start], false)
            } else if m.start() >= reading.end && !LABEL.is_match(&text[m.end()..]) {
                (&text[reading.end..m.start()], true)
            } else {
                return None;
            };

            let attached = gap.len() <= MAX_PERIOD_GAP
                && !gap.chars().any(|c| c.is_ascii_digit())
                && !SEPARATOR.is_match(gap);
            attached.then_some((gap.len(), after, period))
        })
        .min_by_key(|(len, after, _)| (*len, *after))
        .map(|(_, _, period)| period)
}

fn is_directional(caps: &Captures<'_>) -> bool {
    ["sign", "pre", "post"].iter().any(|group| caps.name(group).is_some())
}

fn is_downward(caps: &Captures<'_>) -> bool {
    let explicit_minus = caps
        .name("sign")
        .is_some_and(|s| s.as_str() == "-" || s.as_str() == "\u{2212}");
    let worded_down = ["pre", "post"].iter().any(|group| {
        caps.name(group)
            .is_some_and(|w| DOWN_WORDS.contains(&w.as_str().to_lowercase().as_str()))
    });
    explicit_minus || worded_down
}

/// Severity by how far the change overshoots the threshold:
/// 3x or more is high, 2x or more medium, anything else low.
pub fn severity_for(magnitude: f64, threshold: f64) -> Severity {
    if threshold <= 0.0 {
        return Severity::High;
    }
    // Rounded so that e.g. 0.30 / 0.10 counts as exactly 3.
    let ratio = (magnitude / threshold * 1e6).round() / 1e6;
    if ratio >= 3.0 {
        Severity::High
    } else if ratio >= 2.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn verb(change: f64) -> &'static str {
    if change < 0.0 { "dropped" } else { "rose" }
}

fn format_pct(fraction: f64) -> String {
    let pct = format!("{:.1}", fraction * 100.0);
    pct.strip_suffix(".0").map(str::to_string).unwrap_or(pct)
}
