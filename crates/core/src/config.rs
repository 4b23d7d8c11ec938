//! Shared configuration loader for the movie recommender
//!
//! Configuration is read from environment variables using the `RECOMMENDER_`
//! prefix, with optional `.env` support via dotenvy. The override hierarchy is
//! defaults < .env < environment.
//!
//! # Example
//!
//! ```no_run
//! use movie_recommender_core::config::{load_dotenv, ConfigLoader};
//! use movie_recommender_core::observability::LogConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! load_dotenv();
//!
//! let log_config = LogConfig::from_env()?;
//! log_config.validate()?;
//! # Ok(())
//! # }
//! ```

use crate::error::RecommenderError;

/// Prefix shared by every recognised environment variable
pub const ENV_PREFIX: &str = "RECOMMENDER_";

/// Configuration loader trait
///
/// Provides standardized methods for loading and validating configuration from
/// environment variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables
    ///
    /// Missing optional values fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if a variable is present but cannot be
    /// parsed.
    fn from_env() -> Result<Self, RecommenderError>;

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if any validation check fails.
    fn validate(&self) -> Result<(), RecommenderError>;
}

/// Parse an environment variable, falling back to `default` when unset
///
/// # Errors
///
/// Returns a `ConfigurationError` if the value is set but cannot be parsed
pub fn parse_env_var<T>(key: &str, default: T) -> Result<T, RecommenderError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| {
                    RecommenderError::configuration(format!("Failed to parse {}: {}", key, e), key)
                })
        })
        .unwrap_or(Ok(default))
}

/// Parse an optional environment variable with no default
///
/// # Errors
///
/// Returns a `ConfigurationError` if the value is set but cannot be parsed
pub fn parse_optional_env_var<T>(key: &str) -> Result<Option<T>, RecommenderError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| {
                RecommenderError::configuration(format!("Failed to parse {}: {}", key, e), key)
            }),
        _ => Ok(None),
    }
}

/// Load .env file if present
///
/// Does not fail when the file is missing.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_parse_env_var_with_default() {
        let result: u32 = parse_env_var("RECOMMENDER_TEST_NON_EXISTENT_VAR", 42).unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_env_var_with_value() {
        env::set_var("RECOMMENDER_TEST_PARSE_VAR", "100");
        let result: u32 = parse_env_var("RECOMMENDER_TEST_PARSE_VAR", 42).unwrap();
        assert_eq!(result, 100);
        env::remove_var("RECOMMENDER_TEST_PARSE_VAR");
    }

    #[test]
    fn test_parse_env_var_invalid_value() {
        env::set_var("RECOMMENDER_TEST_INVALID_VAR", "not-a-number");
        let result: Result<u32, _> = parse_env_var("RECOMMENDER_TEST_INVALID_VAR", 42);
        match result.unwrap_err() {
            RecommenderError::ConfigurationError { key, .. } => {
                assert_eq!(key.as_deref(), Some("RECOMMENDER_TEST_INVALID_VAR"));
            }
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
        env::remove_var("RECOMMENDER_TEST_INVALID_VAR");
    }

    #[test]
    fn test_parse_optional_env_var() {
        let missing: Option<u64> =
            parse_optional_env_var("RECOMMENDER_TEST_OPTIONAL_MISSING").unwrap();
        assert!(missing.is_none());

        env::set_var("RECOMMENDER_TEST_OPTIONAL_SET", "7");
        let set: Option<u64> = parse_optional_env_var("RECOMMENDER_TEST_OPTIONAL_SET").unwrap();
        assert_eq!(set, Some(7));
        env::remove_var("RECOMMENDER_TEST_OPTIONAL_SET");
    }
}
