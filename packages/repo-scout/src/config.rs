use std::env;

use crate::error::ConfigError;

/// Default iteration budget for the orchestration loop.
pub const DEFAULT_MAX_ITERATIONS: usize = 40;

/// Sampling temperature used for the reasoning engine.
pub const ENGINE_TEMPERATURE: f32 = 0.2;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub max_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://repositories.db".to_string(),
            openai_model: "gpt-4o".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `.env` is expected to have been loaded by the caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_iterations = match lookup("REPO_SCOUT_MAX_ITERATIONS") {
            Some(raw) => parse_budget(&raw)?,
            None => defaults.max_iterations,
        };

        Ok(Self {
            database_url: lookup("REPO_SCOUT_DATABASE_URL").unwrap_or(defaults.database_url),
            openai_model: lookup("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            max_iterations,
        })
    }
}

fn parse_budget(raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "REPO_SCOUT_MAX_ITERATIONS",
        reason,
    };

    let budget: usize = raw
        .trim()
        .parse()
        .map_err(|e| invalid(format!("'{}' is not a number ({})", raw, e)))?;

    if budget == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_iterations, 40);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(|name| match name {
            "REPO_SCOUT_DATABASE_URL" => Some("sqlite::memory:".into()),
            "OPENAI_MODEL" => Some("gpt-4o-mini".into()),
            "REPO_SCOUT_MAX_ITERATIONS" => Some(" 12 ".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.max_iterations, 12);
    }

    #[test]
    fn test_rejects_zero_budget() {
        let err = Config::from_lookup(|name| {
            (name == "REPO_SCOUT_MAX_ITERATIONS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_non_numeric_budget() {
        let err = Config::from_lookup(|name| {
            (name == "REPO_SCOUT_MAX_ITERATIONS").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("REPO_SCOUT_MAX_ITERATIONS"));
    }
}
