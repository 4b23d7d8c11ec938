//! # Movie Recommender Core
//!
//! Shared building blocks for the movie recommender workspace.
//!
//! ## Modules
//!
//! - `error`: Error taxonomy surfaced by the engine and its hosts
//! - `models`: Domain model (`Movie`)
//! - `validation`: Validation of user-supplied engine inputs
//! - `config`: Environment-based configuration loading
//! - `observability`: Structured logging initialisation

pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod validation;

// Re-export commonly used types
pub use config::{load_dotenv, parse_env_var, parse_optional_env_var, ConfigLoader};
pub use error::RecommenderError;
pub use models::{Movie, MovieId, MAX_RATING, MIN_RATING, UNKNOWN_GENRE};
pub use observability::{init_logging, LogConfig, LogFormat};
pub use validation::{
    validate_feature_count, validate_rating, validate_top_n, MAX_FEATURE_COUNT, MIN_FEATURE_COUNT,
};

/// Result type alias for recommender operations
pub type Result<T> = std::result::Result<T, RecommenderError>;
