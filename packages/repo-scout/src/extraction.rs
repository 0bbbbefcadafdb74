//! Extraction validator: final engine payload → batch of records.
//!
//! Validation is all-or-nothing per batch. A payload that does not parse, a
//! batch with zero entries, or a batch with any invalid entry fails as a
//! whole, so partially curated results never reach the store.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EntryViolations, ExtractionFailure, SchemaViolation};
use crate::schema::Record;

/// Parse and validate a final payload.
pub fn validate(payload: &str) -> Result<Vec<Record>, ExtractionFailure> {
    let malformed = |reason: String| ExtractionFailure::Malformed {
        reason,
        payload: payload.to_string(),
    };

    let value = parse_json(payload).map_err(malformed)?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut batch) => match batch.remove("repositories") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(malformed("'repositories' is not an array".to_string())),
            None => return Err(malformed("missing 'repositories' array".to_string())),
        },
        _ => return Err(malformed("expected a JSON object or array".to_string())),
    };

    if entries.is_empty() {
        warn!("Final payload contains no records");
        return Err(ExtractionFailure::Empty {
            payload: payload.to_string(),
        });
    }

    let mut records = Vec::with_capacity(entries.len());
    let mut invalid = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(candidate) = entry else {
            invalid.push(EntryViolations {
                index,
                identifier: None,
                violations: vec![SchemaViolation::new("entry", "expected an object")],
            });
            continue;
        };

        match Record::from_candidate(candidate) {
            Ok(record) => records.push(record),
            Err(violations) => invalid.push(EntryViolations {
                index,
                identifier: identifier_hint(candidate),
                violations,
            }),
        }
    }

    if !invalid.is_empty() {
        warn!(
            entries = entries.len(),
            invalid = invalid.len(),
            "Rejecting batch with invalid entries"
        );
        return Err(ExtractionFailure::InvalidEntries {
            entries: invalid,
            payload: payload.to_string(),
        });
    }

    debug!(records = records.len(), "Batch validated");
    Ok(records)
}

/// Parse JSON, tolerating a Markdown code fence or prose around the value.
fn parse_json(payload: &str) -> Result<Value, String> {
    let body = strip_code_fence(payload);

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(first_error) => embedded_json(body).ok_or_else(|| first_error.to_string()),
    }
}

fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// First batch-shaped JSON value embedded in prose.
///
/// Every `{` and `[` is tried as a start, so brackets in the prose ("top [5]")
/// do not hide the batch. Without a batch-shaped value, the first value that
/// parses at all is returned.
fn embedded_json(text: &str) -> Option<Value> {
    let mut first = None;

    for (start, _) in text.match_indices(['{', '[']) {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(value)) = values.next() else {
            continue;
        };
        if is_batch_shaped(&value) {
            return Some(value);
        }
        first.get_or_insert(value);
    }

    first
}

fn is_batch_shaped(value: &Value) -> bool {
    match value {
        Value::Object(batch) => batch.contains_key("repositories"),
        Value::Array(entries) => !entries.is_empty() && entries.iter().all(Value::is_object),
        _ => false,
    }
}

fn identifier_hint(candidate: &serde_json::Map<String, Value>) -> Option<String> {
    ["identifier", "repo_name"]
        .iter()
        .filter_map(|key| candidate.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
