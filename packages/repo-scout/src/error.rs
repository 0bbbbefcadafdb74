//! Typed errors for repository scouting.
//!
//! Uses `thiserror` for library errors (not `anyhow`); the binary wraps them
//! with context at the top level.

use std::fmt;

use thiserror::Error;

use crate::orchestrator::Transcript;

/// Configuration or credential problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is absent or empty
    #[error("{name} must be set")]
    Missing { name: &'static str },

    /// Environment variable is present but unusable
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failures talking to the reasoning engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// API error (non-2xx response, rate limit, invalid request)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (unexpected response format)
    #[error("parse error: {0}")]
    Parse(String),
}

/// Terminal failures of the orchestration loop other than exhaustion.
#[derive(Debug, Error)]
pub enum LoopError {
    /// The engine itself failed; it is not retried
    #[error("reasoning engine failed: {0}")]
    Engine(#[from] EngineError),

    /// The engine asked for an action outside the closed set
    #[error("reasoning engine requested unknown action '{name}'")]
    UnknownAction { name: String },
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct SchemaViolation {
    pub field: &'static str,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// All violations found in one batch entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryViolations {
    /// Zero-based position of the entry in the batch
    pub index: usize,
    /// Identifier of the entry, when it had a usable one
    pub identifier: Option<String>,
    pub violations: Vec<SchemaViolation>,
}

impl EntryViolations {
    /// Whether any violation names the given field.
    pub fn names(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for EntryViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry #{}", self.index + 1)?;
        if let Some(identifier) = &self.identifier {
            write!(f, " ({})", identifier)?;
        }
        let reasons: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, ": {}", reasons.join("; "))
    }
}

/// The final payload could not be turned into a batch of records.
///
/// Every variant carries the raw payload so callers can surface it.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    /// Payload is not a structured batch
    #[error("payload is not a record batch: {reason}")]
    Malformed { reason: String, payload: String },

    /// Engine claimed completion but returned no records
    #[error("payload contains no records")]
    Empty { payload: String },

    /// One or more entries failed schema validation
    #[error("invalid entries: {}", format_entries(.entries))]
    InvalidEntries {
        entries: Vec<EntryViolations>,
        payload: String,
    },
}

impl ExtractionFailure {
    /// The raw payload that failed to validate.
    pub fn payload(&self) -> &str {
        match self {
            Self::Malformed { payload, .. }
            | Self::Empty { payload }
            | Self::InvalidEntries { payload, .. } => payload,
        }
    }
}

fn format_entries(entries: &[EntryViolations]) -> String {
    entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Storage-layer failures. Not part of normal control flow.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Popularity does not fit the storage column
    #[error("popularity {value} for {identifier} is out of range")]
    OutOfRange { identifier: String, value: String },
}

/// Top-level failures of a scouting run.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error(transparent)]
    Loop(#[from] LoopError),

    /// Iteration budget spent without a final payload
    #[error("orchestration loop exhausted after {iterations} iterations without a final answer")]
    LoopExhausted {
        iterations: usize,
        transcript: Transcript,
    },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionFailure),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for scouting runs.
pub type Result<T> = std::result::Result<T, ScoutError>;
