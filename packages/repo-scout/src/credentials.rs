//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate so API keys never end up in logs or debug output.

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretBox};

use crate::error::ConfigError;

const REDACTED: &str = "[REDACTED]";

/// An API key held in zeroized memory; formatting never shows it.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// The raw key, for request headers only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// Keys for the reasoning engine and the search provider.
///
/// Both are required before the orchestration loop may start.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub openai_api_key: SecretString,
    pub tavily_api_key: SecretString,
}

impl Credentials {
    pub const OPENAI_API_KEY: &'static str = "OPENAI_API_KEY";
    pub const TAVILY_API_KEY: &'static str = "TAVILY_API_KEY";

    /// Load credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load credentials through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::new)
                .ok_or(ConfigError::Missing { name })
        };

        Ok(Self {
            openai_api_key: require(Self::OPENAI_API_KEY)?,
            tavily_api_key: require(Self::TAVILY_API_KEY)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = SecretString::new("sk-very-secret");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose(), "sk-very-secret");
    }

    #[test]
    fn test_credentials_loaded() {
        let creds = Credentials::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("TAVILY_API_KEY", "tvly-1"),
        ]))
        .unwrap();

        assert_eq!(creds.openai_api_key.expose(), "sk-1");
        assert_eq!(creds.tavily_api_key.expose(), "tvly-1");
        assert!(!format!("{:?}", creds).contains("sk-1"));
    }

    #[test]
    fn test_missing_search_key_is_fatal() {
        let err = Credentials::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                name: "TAVILY_API_KEY"
            }
        ));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let err = Credentials::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "  "),
            ("TAVILY_API_KEY", "tvly-1"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                name: "OPENAI_API_KEY"
            }
        ));
    }
}
