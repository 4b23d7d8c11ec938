//! Validation utilities for user-supplied engine inputs

use crate::error::RecommenderError;
use crate::models::{MAX_RATING, MIN_RATING};

/// Smallest latent feature count accepted from a caller
pub const MIN_FEATURE_COUNT: usize = 10;

/// Largest latent feature count accepted from a caller
pub const MAX_FEATURE_COUNT: usize = 150;

/// Validate the requested latent feature count
///
/// # Examples
///
/// ```
/// use movie_recommender_core::validation::validate_feature_count;
///
/// assert!(validate_feature_count(50).is_ok());
/// assert!(validate_feature_count(5).is_err());
/// ```
pub fn validate_feature_count(k: usize) -> Result<(), RecommenderError> {
    if (MIN_FEATURE_COUNT..=MAX_FEATURE_COUNT).contains(&k) {
        Ok(())
    } else {
        Err(RecommenderError::validation_field(
            format!(
                "feature count {} outside [{}, {}]",
                k, MIN_FEATURE_COUNT, MAX_FEATURE_COUNT
            ),
            "feature_count",
        ))
    }
}

/// Validate a star rating
///
/// # Examples
///
/// ```
/// use movie_recommender_core::validation::validate_rating;
///
/// assert!(validate_rating(3.5).is_ok());
/// assert!(validate_rating(5.5).is_err());
/// assert!(validate_rating(f64::NAN).is_err());
/// ```
pub fn validate_rating(rating: f64) -> Result<(), RecommenderError> {
    if rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(RecommenderError::validation_field(
            format!(
                "rating {} outside [{}, {}]",
                rating, MIN_RATING, MAX_RATING
            ),
            "rating",
        ))
    }
}

/// Validate the number of recommendations requested
pub fn validate_top_n(top_n: usize) -> Result<(), RecommenderError> {
    if top_n == 0 {
        return Err(RecommenderError::validation_field(
            "top_n must be greater than 0",
            "top_n",
        ));
    }
    Ok(())
}
