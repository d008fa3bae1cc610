//! Salvage parsing of structured records from free-form generated text
//!
//! The content service returns advisory free text with no guarantee of being
//! valid JSON. This module recovers an array of records from such text in
//! three escalating steps:
//!
//! 1. Strict parse of the whole text as a JSON array.
//! 2. Scan for bracket-delimited regions and strict-parse each candidate in
//!    order of appearance; the earliest candidate that parses wins. A later
//!    region is still found when earlier ones fail, so prose containing a
//!    bracketed example before the real payload does not mask it.
//! 3. Repair mode for the truncated/fence-wrapped shape typical of generative
//!    output: strip a leading code fence, force a leading `[`, cut everything
//!    after the last `}` and close the array. Only the last *complete* object
//!    survives repair; a partially emitted trailing object is discarded.
//!
//! Extraction is total: unrecoverable input yields an empty batch, never an
//! error. Callers log the condition and continue.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A single extracted record: an ordered field-name to value mapping.
///
/// No schema is enforced at parse time; consumers degrade missing fields to
/// defaults instead of failing.
pub type Record = serde_json::Map<String, Value>;

/// An ordered sequence of records, the unit persisted per report or
/// message type. Order is insertion order from the source text.
pub type RecordBatch = Vec<Record>;

fn bracket_region_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Non-greedy so adjacent regions are tried separately.
    RE.get_or_init(|| Regex::new(r"(?s)\[.*?\]").expect("bracket region regex"))
}

/// Coerce a parsed JSON value into a record batch.
///
/// Arrays keep their object elements (non-object elements are dropped so a
/// batch is always records); anything else yields an empty batch.
fn coerce_batch(value: Value) -> RecordBatch {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract a record batch from free text.
///
/// Tries a strict parse of the whole text first, then scans for bracketed
/// regions. Returns an empty batch when nothing parses; never errors.
pub fn extract(text: &str) -> RecordBatch {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        let batch = coerce_batch(value);
        if !batch.is_empty() {
            return batch;
        }
    }

    for candidate in bracket_region_re().find_iter(text) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate.as_str()) {
            let batch = coerce_batch(value);
            if !batch.is_empty() {
                return batch;
            }
        }
    }

    Vec::new()
}

/// Extract with a repair fallback for the almost-JSON shape of generative
/// output.
///
/// Runs [`extract`] first; when that comes back empty, repairs the text and
/// re-attempts a strict parse. A still-empty result is an extraction failure
/// for this one call, reported by the caller rather than raised.
pub fn extract_with_repair(text: &str) -> RecordBatch {
    let batch = extract(text);
    if !batch.is_empty() {
        return batch;
    }

    match repair(text) {
        Some(repaired) => serde_json::from_str::<Value>(&repaired)
            .map(coerce_batch)
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

/// Repair a potentially truncated or fence-wrapped JSON array string.
///
/// Assumes the payload is a JSON array of objects. Returns `None` when no
/// closing brace exists, in which case nothing can be recovered.
pub fn repair(text: &str) -> Option<String> {
    let mut text = text.trim();

    // Strip a leading markdown code fence marker if present.
    for fence in ["```json", "[```json", "```"] {
        if let Some(rest) = text.strip_prefix(fence) {
            text = rest.trim_start();
            break;
        }
    }

    let mut repaired = text.to_string();
    if !repaired.starts_with('[') {
        repaired.insert(0, '[');
    }

    // Keep only content up to the last complete object.
    let last_brace = repaired.rfind('}')?;
    repaired.truncate(last_brace + 1);

    let trimmed = repaired.trim_end_matches([',', ' ', '\n', '\r', '\t']);
    Some(format!("{}]", trimmed))
}
