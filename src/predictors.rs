//! Parsing rules for predictor outputs found in VEP `Extra` fields.

use crate::table::{is_missing, NA};
use once_cell::sync::Lazy;
use regex::Regex;

/// `label(score)`, e.g. `tolerated(0.24)` or `probably_damaging(0.998)`.
static LABEL_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^()]+)\(([\d.]+)\)").expect("label/score pattern is valid"));

/// Split a `label(score)` prediction into its label and score.
///
/// A missing value gives `("NA", "NA")`. A value that does not look like
/// `label(score)` is kept whole as the label with an `NA` score.
pub fn split_label_score(value: &str) -> (String, String) {
    if is_missing(value) {
        return (NA.to_string(), NA.to_string());
    }

    match LABEL_SCORE.captures(value) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (value.to_string(), NA.to_string()),
    }
}

/// Highest score in a comma-separated per-transcript list.
///
/// Entries that are not finite numbers (`.`, `NA`, blanks) count as 0, so a
/// list with no numeric entry at all reduces to 0.
pub fn max_score(value: &str) -> f64 {
    value
        .split(',')
        .map(|entry| {
            entry
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|score| score.is_finite())
                .unwrap_or(0.0)
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Render a score in its shortest round-trip form (`0.9`, `0`).
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}
