//! Movie Recommender Engine
//!
//! Learns latent taste factors from a handful of star ratings with regularized
//! matrix factorization trained by batch gradient descent, then ranks the
//! movies the user has not rated yet.
//!
//! Control flow: [`RatingMatrix`] → [`Trainer`] (owning a
//! [`FactorizationModel`]) → [`GenerateRecommendations`]. [`RecommenderSession`]
//! ties these to a [`CatalogStore`], and [`TrainingWorker`] moves a run off the
//! caller's thread.

pub mod catalog;
pub mod config;
pub mod factorization;
pub mod rating_matrix;
pub mod ratings;
pub mod recommender;
pub mod session;
pub mod trainer;
pub mod worker;

// Re-export key types
pub use catalog::{CatalogSource, CatalogStore};
pub use config::{EngineConfig, DEFAULT_FEATURE_COUNT};
pub use factorization::{FactorizationModel, Gradients};
pub use rating_matrix::RatingMatrix;
pub use ratings::{parse_user_ratings, read_user_ratings, CommunityRatings, UserRatings};
pub use recommender::{GenerateRecommendations, Recommendation, DEFAULT_TOP_N, SESSION_USER};
pub use session::{RecommenderSession, SuggestedMovie, Suggestions, TrainingRequest};
pub use trainer::{MeanNormalization, TrainedModel, Trainer, TrainerConfig};
pub use worker::{TrainingHandle, TrainingWorker};

pub use movie_recommender_core::{Movie, MovieId, RecommenderError, Result};
