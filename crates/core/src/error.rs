//! Error taxonomy shared by the catalog, the training engine and the hosts
//!
//! Every engine-level failure surfaces as a [`RecommenderError`]. The variants
//! split into three groups:
//!
//! - data problems (`DataFormatError`, `InsufficientDataError`, `ValidationError`)
//! - numerical problems (`TrainingDivergedError`)
//! - host/runtime problems (`ConfigurationError`, `IoError`, `Cancelled`,
//!   `TrainingInProgress`, `TrainingFailed`)

use thiserror::Error;

/// Errors produced by the movie recommender
#[derive(Debug, Error)]
pub enum RecommenderError {
    /// The catalog source could not be parsed
    #[error("Malformed catalog data{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    DataFormatError {
        message: String,
        /// 1-based line of the offending record, when known
        line: Option<usize>,
    },

    /// Training was requested without a single observed rating
    #[error("At least one rated movie is required before training")]
    InsufficientDataError,

    /// Gradient descent produced a non-finite cost
    #[error("Training diverged at iteration {iteration} (cost = {cost})")]
    TrainingDivergedError { iteration: usize, cost: f64 },

    #[error("Validation failed: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError {
        message: String,
        key: Option<String>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Training was cancelled")]
    Cancelled,

    #[error("A training run is already in progress")]
    TrainingInProgress,

    /// The training task ended abnormally without producing a result
    #[error("Training failed: {message}")]
    TrainingFailed { message: String },
}

impl RecommenderError {
    /// Build a `DataFormatError` for a specific record line
    pub fn data_format(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::DataFormatError {
            message: message.into(),
            line,
        }
    }

    /// Build a `ValidationError` tied to a named field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Build a `ConfigurationError` tied to an environment key
    pub fn configuration(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether the same request may succeed when retried with adjusted
    /// hyperparameters or after the current run finishes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TrainingDivergedError { .. } | Self::TrainingInProgress | Self::Cancelled
        )
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataFormatError { .. } => "data_format",
            Self::InsufficientDataError => "insufficient_data",
            Self::TrainingDivergedError { .. } => "training_diverged",
            Self::ValidationError { .. } => "validation",
            Self::ConfigurationError { .. } => "configuration",
            Self::IoError(_) => "io",
            Self::Cancelled => "cancelled",
            Self::TrainingInProgress => "training_in_progress",
            Self::TrainingFailed { .. } => "training_failed",
        }
    }
}

impl From<csv::Error> for RecommenderError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line() as usize);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Self::IoError(io),
            _ => Self::DataFormatError { message, line },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_format_display_with_line() {
        let err = RecommenderError::data_format("movieId is not an integer", Some(7));
        assert_eq!(
            err.to_string(),
            "Malformed catalog data at line 7: movieId is not an integer"
        );
    }

    #[test]
    fn test_data_format_display_without_line() {
        let err = RecommenderError::data_format("empty source", None);
        assert_eq!(err.to_string(), "Malformed catalog data: empty source");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(RecommenderError::TrainingDivergedError {
            iteration: 3,
            cost: f64::NAN
        }
        .is_retryable());
        assert!(RecommenderError::TrainingInProgress.is_retryable());
        assert!(!RecommenderError::InsufficientDataError.is_retryable());
        assert!(!RecommenderError::data_format("bad", None).is_retryable());
        assert!(!RecommenderError::TrainingFailed {
            message: "panicked".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_csv_io_error_stays_io() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "disk went away");
        let err = RecommenderError::from(csv::Error::from(io));
        assert!(matches!(err, RecommenderError::IoError(_)));
    }

    #[test]
    fn test_csv_utf8_error_is_data_format() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&b"ok,\xff\xfe\n"[..]);
        let mut record = csv::StringRecord::new();
        let err = reader.read_record(&mut record).unwrap_err();
        assert!(matches!(
            RecommenderError::from(err),
            RecommenderError::DataFormatError { .. }
        ));
    }

    #[test]
    fn test_validation_field() {
        match RecommenderError::validation_field("out of range", "rating") {
            RecommenderError::ValidationError { field, .. } => {
                assert_eq!(field.as_deref(), Some("rating"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(RecommenderError::InsufficientDataError.kind(), "insufficient_data");
        assert_eq!(RecommenderError::Cancelled.kind(), "cancelled");
    }
}
