//! Structured logging initialisation

use crate::config::{parse_env_var, ConfigLoader};
use crate::error::RecommenderError;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// Single-line human-readable output
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
///
/// # Environment Variables
///
/// - `RECOMMENDER_LOG_LEVEL` (optional): default filter directive (default: info).
///   `RUST_LOG` takes precedence when set.
/// - `RECOMMENDER_LOG_FORMAT` (optional): pretty, compact or json (default: compact)
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            with_target: true,
        }
    }
}

impl ConfigLoader for LogConfig {
    fn from_env() -> Result<Self, RecommenderError> {
        let defaults = LogConfig::default();
        Ok(Self {
            level: parse_env_var("RECOMMENDER_LOG_LEVEL", defaults.level)?,
            format: parse_env_var("RECOMMENDER_LOG_FORMAT", defaults.format)?,
            with_target: defaults.with_target,
        })
    }

    fn validate(&self) -> Result<(), RecommenderError> {
        if !VALID_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(RecommenderError::configuration(
                format!(
                    "Invalid log_level '{}', expected one of: {}",
                    self.level,
                    VALID_LEVELS.join(", ")
                ),
                "RECOMMENDER_LOG_LEVEL",
            ));
        }
        Ok(())
    }
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns a `ConfigurationError` if the config is invalid or a global
/// subscriber has already been installed.
pub fn init_logging(config: &LogConfig) -> Result<(), RecommenderError> {
    config.validate()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(config.with_target),
            )
            .try_init(),
    };

    result.map_err(|e| {
        RecommenderError::configuration(
            format!("Failed to initialize tracing subscriber: {}", e),
            "RECOMMENDER_LOG_FORMAT",
        )
    })?;

    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}
