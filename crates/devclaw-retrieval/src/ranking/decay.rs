//! Exponential temporal decay for dated files.
//!
//! A file ID carrying a `YYYY-MM-DD` date decays by
//! `exp(-ln2 · age_days / half_life)`. Files with `MEMORY.md` anywhere in
//! their path are evergreen, as is anything without a parseable date.
//! Negative ages clamp to zero.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use devclaw_core::models::SearchResult;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid date regex"));

/// Extract the decay-relevant date from a file ID, if any.
pub fn file_date(file_id: &str) -> Option<NaiveDate> {
    if file_id
        .split(['/', '\\'])
        .any(|component| component == "MEMORY.md")
    {
        return None;
    }
    let captures = DATE_PATTERN.captures(file_id)?;
    let year = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let day = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decay multiplier for a file at `now`. Evergreen files return 1.
pub fn decay_factor(file_id: &str, half_life_days: f64, now: DateTime<Utc>) -> f64 {
    let Some(date) = file_date(file_id) else {
        return 1.0;
    };
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let age_days = (now.date_naive() - date).num_days().max(0) as f64;
    (-std::f64::consts::LN_2 * age_days / half_life_days).exp()
}

/// Apply decay in place. The caller re-sorts afterwards.
pub fn apply(results: &mut [SearchResult], half_life_days: f64, now: DateTime<Utc>) {
    for result in results.iter_mut() {
        result.score *= decay_factor(&result.file_id, half_life_days, now);
    }
}
