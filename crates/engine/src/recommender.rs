//! Top-N recommendation from a trained model

use crate::factorization::FactorizationModel;
use crate::trainer::TrainedModel;
use movie_recommender_core::{MovieId, RecommenderError, Result};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::cmp::Ordering;

/// Number of recommendations returned when the caller has no preference
pub const DEFAULT_TOP_N: usize = 10;

/// Column of the session user in every rating matrix
pub const SESSION_USER: usize = 0;

/// A predicted rating for a movie the user has not rated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub predicted_rating: f64,
}

/// Generate recommendations
///
/// Steps:
/// 1. Reconstruct X_i · Θ_u + mean_i for every movie
/// 2. Drop movies the user already rated
/// 3. Sort descending by prediction, ties by ascending movie id
/// 4. Keep the first `top_n`
pub struct GenerateRecommendations;

impl GenerateRecommendations {
    /// Recommendations for the session user
    pub fn execute(model: &TrainedModel, top_n: usize) -> Vec<Recommendation> {
        Self::rank(
            model.model(),
            model.means(),
            model.mask(),
            model.movie_ids(),
            SESSION_USER,
            top_n,
        )
    }

    /// Recommendations for any user column of the trained matrix
    ///
    /// # Errors
    ///
    /// `ValidationError` when `user` is not a column of the model.
    pub fn execute_for_user(
        model: &TrainedModel,
        user: usize,
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        Self::from_factors(
            model.model(),
            model.means(),
            model.mask(),
            model.movie_ids(),
            user,
            top_n,
        )
    }

    /// Recommendations straight from factor matrices, means and mask
    ///
    /// # Errors
    ///
    /// `ValidationError` when the shapes disagree or `user` is out of range.
    pub fn from_factors(
        factors: &FactorizationModel,
        means: &Array1<f64>,
        mask: &Array2<bool>,
        movie_ids: &[MovieId],
        user: usize,
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let num_movies = factors.num_movies();
        if means.len() != num_movies
            || movie_ids.len() != num_movies
            || mask.dim() != (num_movies, factors.num_users())
        {
            return Err(RecommenderError::validation_field(
                format!(
                    "inconsistent shapes: {} movies in factors, {} means, {} ids, mask {:?}",
                    num_movies,
                    means.len(),
                    movie_ids.len(),
                    mask.dim()
                ),
                "factors",
            ));
        }
        if user >= factors.num_users() {
            return Err(RecommenderError::validation_field(
                format!(
                    "user column {} out of range (model has {} users)",
                    user,
                    factors.num_users()
                ),
                "user",
            ));
        }
        Ok(Self::rank(factors, means, mask, movie_ids, user, top_n))
    }

    fn rank(
        factors: &FactorizationModel,
        means: &Array1<f64>,
        mask: &Array2<bool>,
        movie_ids: &[MovieId],
        user: usize,
        top_n: usize,
    ) -> Vec<Recommendation> {
        let mut candidates: Vec<Recommendation> = movie_ids
            .iter()
            .enumerate()
            .filter(|&(row, _)| !mask[[row, user]])
            .map(|(row, &movie_id)| Recommendation {
                movie_id,
                predicted_rating: factors.predict(row, user) + means[row],
            })
            .collect();

        candidates.sort_by(Self::compare);
        candidates.truncate(top_n);
        candidates
    }

    fn compare(a: &Recommendation, b: &Recommendation) -> Ordering {
        b.predicted_rating
            .total_cmp(&a.predicted_rating)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    }
}
