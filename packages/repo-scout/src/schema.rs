//! Record shape and field-level validation.
//!
//! A [`Record`] is one qualified repository. Candidates arrive as loosely
//! typed JSON objects from the reasoning engine; [`Record::from_candidate`]
//! checks every field and returns either a record or the full list of
//! violations for that candidate.
//!
//! The JSON schema of [`RecordBatch`] (generated with `schemars`, descriptions
//! taken from the field docs below) is the only thing the orchestration layer
//! knows about records.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::SchemaViolation;

/// Largest popularity value the store can hold.
pub const MAX_POPULARITY: u64 = i64::MAX as u64;

/// One qualified repository entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Record {
    /// The repository identifier in "owner/name" form (e.g., "rust-lang/rust").
    pub identifier: String,

    /// The full URL of the repository.
    pub url: String,

    /// A one-sentence summary of the repository's purpose.
    pub summary: String,

    /// The number of stars the repository has.
    pub popularity: u64,

    /// The primary programming language of the repository, empty if unknown.
    pub primary_language: String,

    /// A brief analysis explaining why this repository matches the query.
    pub rationale: String,
}

/// The batch shape the engine is asked to produce.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordBatch {
    /// The qualified repositories, best match first.
    pub repositories: Vec<Record>,
}

/// Accepted spellings for each field, canonical name first.
const IDENTIFIER: &[&str] = &["identifier", "repo_name"];
const URL: &[&str] = &["url"];
const SUMMARY: &[&str] = &["summary", "description"];
const POPULARITY: &[&str] = &["popularity", "stars"];
const PRIMARY_LANGUAGE: &[&str] = &["primary_language"];
const RATIONALE: &[&str] = &["rationale", "why_it_matches"];

/// Machine-readable description of the batch shape, for engine prompts.
pub fn shape_description() -> String {
    let schema = schema_for!(RecordBatch);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

impl Record {
    /// Validate and coerce a candidate mapping into a record.
    ///
    /// Every field is checked; all violations are returned together.
    pub fn from_candidate(candidate: &Map<String, Value>) -> Result<Self, Vec<SchemaViolation>> {
        let mut violations = Vec::new();

        let identifier = collect(
            validate_identifier(lookup(candidate, IDENTIFIER)),
            &mut violations,
        );
        let url = collect(validate_url(lookup(candidate, URL)), &mut violations);
        let summary = collect(
            required_text("summary", lookup(candidate, SUMMARY)),
            &mut violations,
        );
        let popularity = collect(
            coerce_popularity(lookup(candidate, POPULARITY)),
            &mut violations,
        );
        let primary_language = collect(
            optional_text("primary_language", lookup(candidate, PRIMARY_LANGUAGE)),
            &mut violations,
        );
        let rationale = collect(
            optional_text("rationale", lookup(candidate, RATIONALE)),
            &mut violations,
        );

        match (identifier, url, summary, popularity, primary_language, rationale) {
            (
                Some(identifier),
                Some(url),
                Some(summary),
                Some(popularity),
                Some(primary_language),
                Some(rationale),
            ) if violations.is_empty() => Ok(Self {
                identifier,
                url,
                summary,
                popularity,
                primary_language,
                rationale,
            }),
            _ => Err(violations),
        }
    }
}

fn collect<T>(
    result: Result<T, SchemaViolation>,
    violations: &mut Vec<SchemaViolation>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(violation) => {
            violations.push(violation);
            None
        }
    }
}

fn lookup<'a>(candidate: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| candidate.get(*name))
        .find(|value| !value.is_null())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn required_text(field: &'static str, value: Option<&Value>) -> Result<String, SchemaViolation> {
    match value {
        None => Err(SchemaViolation::new(field, "is required")),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(SchemaViolation::new(field, "must not be empty"))
        }
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(SchemaViolation::new(
            field,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

fn optional_text(field: &'static str, value: Option<&Value>) -> Result<String, SchemaViolation> {
    match value {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(other) => Err(SchemaViolation::new(
            field,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

fn validate_identifier(value: Option<&Value>) -> Result<String, SchemaViolation> {
    let identifier = required_text("identifier", value)?;

    let parts: Vec<&str> = identifier.split('/').collect();
    let well_formed = parts.len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && !p.chars().any(char::is_whitespace));

    if !well_formed {
        return Err(SchemaViolation::new(
            "identifier",
            format!("'{}' is not in owner/name form", identifier),
        ));
    }
    Ok(identifier)
}

fn validate_url(value: Option<&Value>) -> Result<String, SchemaViolation> {
    let raw = required_text("url", value)?;

    let parsed = Url::parse(&raw).map_err(|e| {
        SchemaViolation::new("url", format!("'{}' is not an absolute URL ({})", raw, e))
    })?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(raw),
        _ => Err(SchemaViolation::new(
            "url",
            format!("'{}' has no host", raw),
        )),
    }
}

fn coerce_popularity(value: Option<&Value>) -> Result<u64, SchemaViolation> {
    let violation = |reason: String| SchemaViolation::new("popularity", reason);

    let popularity = match value {
        None => return Err(violation("is required".to_string())),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                v
            } else if n.as_i64().is_some() {
                return Err(violation(format!("{} is negative", n)));
            } else {
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= MAX_POPULARITY as f64 => {
                        f as u64
                    }
                    _ => return Err(violation(format!("{} is not a non-negative integer", n))),
                }
            }
        }
        Some(Value::String(s)) => parse_numeral(s).map_err(violation)?,
        Some(other) => {
            return Err(violation(format!(
                "expected an integer, got {}",
                type_name(other)
            )))
        }
    };

    if popularity > MAX_POPULARITY {
        return Err(violation(format!("{} is out of range", popularity)));
    }
    Ok(popularity)
}

/// Parse a string-encoded numeral, tolerating thousands separators.
fn parse_numeral(raw: &str) -> Result<u64, String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect();

    if let Ok(v) = cleaned.parse::<u64>() {
        return Ok(v);
    }
    if cleaned.parse::<i64>().is_ok() {
        return Err(format!("'{}' is negative", raw));
    }
    Err(format!("'{}' is not a non-negative integer", raw))
}
