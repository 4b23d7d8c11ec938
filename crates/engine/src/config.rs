//! Engine configuration
//!
//! # Environment Variables
//!
//! - `RECOMMENDER_CATALOG_PATH` (optional): movies CSV (default: data/movies.csv)
//! - `RECOMMENDER_COMMUNITY_RATINGS_PATH` (optional): MovieLens ratings CSV of other users
//! - `RECOMMENDER_FEATURE_COUNT` (optional): latent features k (default: 50)
//! - `RECOMMENDER_LEARNING_RATE` (optional): gradient step α (default: 0.005)
//! - `RECOMMENDER_REGULARIZATION` (optional): λ (default: 10.0)
//! - `RECOMMENDER_ITERATIONS` (optional): gradient-descent iterations (default: 100)
//! - `RECOMMENDER_TOP_N` (optional): recommendations returned (default: 10)
//! - `RECOMMENDER_SEED` (optional): RNG seed for reproducible runs

use crate::recommender::DEFAULT_TOP_N;
use crate::trainer::TrainerConfig;
use movie_recommender_core::config::{parse_env_var, parse_optional_env_var, ConfigLoader};
use movie_recommender_core::validation::{validate_feature_count, validate_top_n};
use movie_recommender_core::RecommenderError;
use std::path::PathBuf;

/// Default latent feature count
pub const DEFAULT_FEATURE_COUNT: usize = 50;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub catalog_path: PathBuf,
    pub community_ratings_path: Option<PathBuf>,
    pub feature_count: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    pub iterations: usize,
    pub top_n: usize,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let trainer = TrainerConfig::default();
        Self {
            catalog_path: PathBuf::from("data/movies.csv"),
            community_ratings_path: None,
            feature_count: DEFAULT_FEATURE_COUNT,
            learning_rate: trainer.learning_rate,
            regularization: trainer.regularization,
            iterations: trainer.iterations,
            top_n: DEFAULT_TOP_N,
            seed: trainer.seed,
        }
    }
}

impl EngineConfig {
    /// Hyperparameters handed to the trainer
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            learning_rate: self.learning_rate,
            regularization: self.regularization,
            iterations: self.iterations,
            seed: self.seed,
        }
    }
}

impl ConfigLoader for EngineConfig {
    fn from_env() -> Result<Self, RecommenderError> {
        let defaults = EngineConfig::default();
        Ok(Self {
            catalog_path: parse_env_var("RECOMMENDER_CATALOG_PATH", defaults.catalog_path)?,
            community_ratings_path: parse_optional_env_var("RECOMMENDER_COMMUNITY_RATINGS_PATH")?,
            feature_count: parse_env_var("RECOMMENDER_FEATURE_COUNT", defaults.feature_count)?,
            learning_rate: parse_env_var("RECOMMENDER_LEARNING_RATE", defaults.learning_rate)?,
            regularization: parse_env_var("RECOMMENDER_REGULARIZATION", defaults.regularization)?,
            iterations: parse_env_var("RECOMMENDER_ITERATIONS", defaults.iterations)?,
            top_n: parse_env_var("RECOMMENDER_TOP_N", defaults.top_n)?,
            seed: parse_optional_env_var("RECOMMENDER_SEED")?,
        })
    }

    fn validate(&self) -> Result<(), RecommenderError> {
        validate_feature_count(self.feature_count).map_err(|e| {
            RecommenderError::configuration(e.to_string(), "RECOMMENDER_FEATURE_COUNT")
        })?;

        validate_top_n(self.top_n)
            .map_err(|e| RecommenderError::configuration(e.to_string(), "RECOMMENDER_TOP_N"))?;

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RecommenderError::configuration(
                format!("learning_rate must be positive, got {}", self.learning_rate),
                "RECOMMENDER_LEARNING_RATE",
            ));
        }

        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(RecommenderError::configuration(
                format!(
                    "regularization must be non-negative, got {}",
                    self.regularization
                ),
                "RECOMMENDER_REGULARIZATION",
            ));
        }

        if self.iterations == 0 {
            return Err(RecommenderError::configuration(
                "iterations must be greater than 0",
                "RECOMMENDER_ITERATIONS",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.feature_count, 50);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.regularization, 10.0);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_config_from_env() {
        env::set_var("RECOMMENDER_FEATURE_COUNT", "20");
        env::set_var("RECOMMENDER_SEED", "1234");
        env::set_var("RECOMMENDER_ITERATIONS", "250");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.feature_count, 20);
        assert_eq!(config.seed, Some(1234));
        assert_eq!(config.iterations, 250);

        env::remove_var("RECOMMENDER_FEATURE_COUNT");
        env::remove_var("RECOMMENDER_SEED");
        env::remove_var("RECOMMENDER_ITERATIONS");
    }

    #[test]
    fn test_validation_rejects_feature_count_out_of_range() {
        let config = EngineConfig {
            feature_count: 200,
            ..EngineConfig::default()
        };
        match config.validate().unwrap_err() {
            RecommenderError::ConfigurationError { key, .. } => {
                assert_eq!(key.as_deref(), Some("RECOMMENDER_FEATURE_COUNT"));
            }
            other => panic!("Expected ConfigurationError, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_non_positive_learning_rate() {
        let config = EngineConfig {
            learning_rate: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_regularization() {
        let config = EngineConfig {
            regularization: -1.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trainer_config_mirrors_engine_config() {
        let config = EngineConfig {
            learning_rate: 0.02,
            seed: Some(3),
            ..EngineConfig::default()
        };
        let trainer = config.trainer_config();
        assert_eq!(trainer.learning_rate, 0.02);
        assert_eq!(trainer.seed, Some(3));
    }
}
