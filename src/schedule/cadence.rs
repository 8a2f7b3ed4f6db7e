// src/schedule/cadence.rs

//! Parsing and display of cadence durations such as `"90s"`, `"1h"`, `"7d"`.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Parse a duration string of the form `<integer><unit>`.
///
/// Supported units: `ms`, `s`, `m`, `h`, `d`, `w`. A zero duration parses
/// successfully; callers that need a strictly positive cadence must check.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    if num_part.is_empty() {
        return Err(format!("duration '{s}' must start with a non-negative integer"));
    }
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs = |mult: u64| {
        value
            .checked_mul(mult)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large"))
    };

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => secs(1),
        "m" => secs(MINUTE),
        "h" => secs(HOUR),
        "d" => secs(DAY),
        "w" => secs(WEEK),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, h, d or w",
            unit
        )),
    }
}

/// Parse a duration that must be strictly positive.
pub fn parse_positive_duration(s: &str) -> Result<Duration, String> {
    let d = parse_duration(s)?;
    if d.is_zero() {
        return Err(format!("duration '{}' must be greater than zero", s.trim()));
    }
    Ok(d)
}

/// Human-readable cadence for dry-run and startup logs ("every 2.0 days").
pub fn describe_cadence(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= WEEK {
        format!("{:.1} weeks", secs as f64 / WEEK as f64)
    } else if secs >= DAY {
        format!("{:.1} days", secs as f64 / DAY as f64)
    } else if secs >= HOUR {
        format!("{:.1} hours", secs as f64 / HOUR as f64)
    } else if secs >= MINUTE {
        format!("{:.1} minutes", secs as f64 / MINUTE as f64)
    } else if secs >= 1 {
        format!("{secs} seconds")
    } else {
        format!("{} ms", d.as_millis())
    }
}
