//! Recommender session
//!
//! The explicit per-user state a host holds: the catalog with the user's
//! ratings, optional community ratings and the engine configuration. A reset
//! reloads the catalog and drops every rating. Training works on a snapshot
//! ([`TrainingRequest`]) so it can run on another thread while the session
//! stays usable.

use crate::catalog::{CatalogSource, CatalogStore};
use crate::config::EngineConfig;
use crate::rating_matrix::RatingMatrix;
use crate::ratings::{CommunityRatings, UserRatings};
use crate::recommender::GenerateRecommendations;
use crate::trainer::{Trainer, TrainerConfig};
use movie_recommender_core::validation::validate_feature_count;
use movie_recommender_core::{Movie, MovieId, RecommenderError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

/// A recommended movie as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub predicted_rating: f64,
}

/// Complete result of one training request
#[derive(Debug, Clone, Serialize)]
pub struct Suggestions {
    /// Best first, at most `top_n` entries, none rated by the user
    pub recommendations: Vec<SuggestedMovie>,
    /// RMSE over the rated cells
    pub prediction_error: f64,
    pub final_cost: f64,
    pub cost_history: Vec<f64>,
    pub feature_count: usize,
}

/// Snapshot of everything one training run needs
#[derive(Debug, Clone)]
pub struct TrainingRequest {
    movies: Vec<Movie>,
    community: Option<Arc<CommunityRatings>>,
    feature_count: usize,
    trainer: TrainerConfig,
    top_n: usize,
}

impl TrainingRequest {
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Build the matrix, train and rank
    ///
    /// Blocking; `cancel` is checked between gradient-descent iterations.
    pub fn run(self, cancel: &AtomicBool) -> Result<Suggestions> {
        let others: Vec<&UserRatings> = self
            .community
            .as_deref()
            .map(|c| c.users().collect())
            .unwrap_or_default();

        let matrix = RatingMatrix::build_for_users(&self.movies, &others)?;
        let trained =
            Trainer::new(self.trainer).train_with_cancel(&matrix, self.feature_count, cancel)?;
        let ranked = GenerateRecommendations::execute(&trained, self.top_n);

        let by_id: HashMap<MovieId, &Movie> = self.movies.iter().map(|m| (m.id, m)).collect();
        let recommendations = ranked
            .into_iter()
            .filter_map(|rec| {
                by_id.get(&rec.movie_id).map(|movie| SuggestedMovie {
                    movie_id: rec.movie_id,
                    title: movie.title.clone(),
                    genres: movie.genres.clone(),
                    predicted_rating: rec.predicted_rating,
                })
            })
            .collect();

        Ok(Suggestions {
            recommendations,
            prediction_error: trained.prediction_error(),
            final_cost: trained.final_cost(),
            cost_history: trained.cost_history().to_vec(),
            feature_count: self.feature_count,
        })
    }
}

/// Session state owned by the presentation layer
#[derive(Debug, Clone)]
pub struct RecommenderSession {
    catalog: CatalogStore,
    community: Option<Arc<CommunityRatings>>,
    config: EngineConfig,
}

impl RecommenderSession {
    pub fn new(catalog: CatalogStore, config: EngineConfig) -> Self {
        Self {
            catalog,
            community: None,
            config,
        }
    }

    /// Load the catalog (and community ratings, when configured) named by `config`
    pub fn open(config: EngineConfig) -> Result<Self> {
        let catalog = CatalogStore::load(CatalogSource::file(&config.catalog_path))?;
        let community = match &config.community_ratings_path {
            Some(path) => Some(Arc::new(CommunityRatings::from_path(path)?)),
            None => None,
        };
        Ok(Self {
            catalog,
            community,
            config,
        })
    }

    pub fn with_community(mut self, community: CommunityRatings) -> Self {
        self.community = Some(Arc::new(community));
        self
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn community(&self) -> Option<&CommunityRatings> {
        self.community.as_deref()
    }

    /// True when no other users' ratings are loaded
    ///
    /// Mean normalization then zeroes every rated cell, so predictions for
    /// unrated movies all sit near 0.
    pub fn is_single_user(&self) -> bool {
        self.community.as_ref().map_or(true, |c| c.is_empty())
    }

    pub fn genres(&self) -> &[String] {
        self.catalog.genres()
    }

    pub fn movies_by_genre(&self, genre: &str) -> Vec<&Movie> {
        self.catalog.movies_by_genre(genre)
    }

    pub fn rate(&mut self, movie_id: MovieId, rating: f64) -> Result<()> {
        self.catalog.rate(movie_id, rating)
    }

    /// Apply a batch of ratings, stopping at the first invalid one
    pub fn rate_all(&mut self, ratings: &UserRatings) -> Result<()> {
        let mut ordered: Vec<(&MovieId, &f64)> = ratings.iter().collect();
        ordered.sort_by_key(|(id, _)| **id);
        for (&movie_id, &rating) in ordered {
            self.catalog.rate(movie_id, rating)?;
        }
        Ok(())
    }

    pub fn clear_rating(&mut self, movie_id: MovieId) -> Result<()> {
        self.catalog.clear_rating(movie_id)
    }

    /// Reload the catalog from source, discarding all ratings
    pub fn reset(&mut self) -> Result<()> {
        self.catalog.reset()
    }

    /// Snapshot the current ratings for a training run with `feature_count` features
    ///
    /// # Errors
    ///
    /// - `ValidationError` when `feature_count` is outside [10, 150]
    /// - `InsufficientDataError` when the user has not rated anything
    pub fn training_request(&self, feature_count: usize) -> Result<TrainingRequest> {
        validate_feature_count(feature_count)?;
        if self.catalog.rated_count() == 0 {
            return Err(RecommenderError::InsufficientDataError);
        }

        if self.is_single_user() {
            warn!("No community ratings loaded, suggestions will not be informative");
        }

        info!(
            rated = self.catalog.rated_count(),
            community_users = self.community.as_ref().map_or(0, |c| c.user_count()),
            feature_count,
            "Preparing training request"
        );

        Ok(TrainingRequest {
            movies: self.catalog.movies().to_vec(),
            community: self.community.clone(),
            feature_count,
            trainer: self.config.trainer_config(),
            top_n: self.config.top_n,
        })
    }

    /// Train and recommend on the calling thread
    pub fn suggest(&self, feature_count: usize) -> Result<Suggestions> {
        self.training_request(feature_count)?
            .run(&AtomicBool::new(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "movieId,title,genres\n\
        1,Alpha,Drama\n\
        2,Bravo,Comedy\n\
        3,Charlie,Drama|Comedy\n";

    fn session() -> RecommenderSession {
        let config = EngineConfig {
            seed: Some(5),
            ..EngineConfig::default()
        };
        RecommenderSession::new(CatalogStore::from_csv(CATALOG).unwrap(), config)
    }

    #[test]
    fn test_training_request_requires_a_rating() {
        let session = session();
        assert!(matches!(
            session.training_request(10),
            Err(RecommenderError::InsufficientDataError)
        ));
    }

    #[test]
    fn test_training_request_validates_feature_count() {
        let mut session = session();
        session.rate(1, 4.0).unwrap();
        assert!(matches!(
            session.training_request(5),
            Err(RecommenderError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_request_is_a_snapshot() {
        let mut session = session();
        session.rate(1, 4.0).unwrap();
        let request = session.training_request(10).unwrap();

        session.rate(2, 1.0).unwrap();
        let suggestions = request.run(&AtomicBool::new(false)).unwrap();

        let ids: Vec<MovieId> = suggestions
            .recommendations
            .iter()
            .map(|s| s.movie_id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&2));
    }

    #[test]
    fn test_single_user_until_community_is_attached() {
        assert!(session().is_single_user());

        let empty = CommunityRatings::from_csv("userId,movieId,rating\n").unwrap();
        assert!(session().with_community(empty).is_single_user());

        let community = CommunityRatings::from_csv("userId,movieId,rating\n9,2,4.0\n").unwrap();
        assert!(!session().with_community(community).is_single_user());
    }

    #[test]
    fn test_rate_all_applies_every_rating() {
        let mut session = session();
        let mut ratings = UserRatings::new();
        ratings.insert(1, 5.0);
        ratings.insert(3, 2.0);
        session.rate_all(&ratings).unwrap();
        assert_eq!(session.catalog().rated_count(), 2);
    }
}
