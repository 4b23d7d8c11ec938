//! Integration tests for the shared validation and error surface

use movie_recommender_core::{
    validate_feature_count, validate_rating, validate_top_n, Movie, RecommenderError, MAX_RATING,
    MIN_RATING,
};

#[test]
fn test_feature_count_bounds_are_inclusive() {
    assert!(validate_feature_count(10).is_ok());
    assert!(validate_feature_count(150).is_ok());

    for k in [0, 9, 151, 1000] {
        match validate_feature_count(k) {
            Err(RecommenderError::ValidationError { field, .. }) => {
                assert_eq!(field.as_deref(), Some("feature_count"));
            }
            other => panic!("Expected ValidationError for k={}, got {:?}", k, other),
        }
    }
}

#[test]
fn test_rating_scale() {
    assert!(validate_rating(MIN_RATING).is_ok());
    assert!(validate_rating(MAX_RATING).is_ok());
    assert!(validate_rating(3.5).is_ok());
    assert!(validate_rating(-0.5).is_err());
    assert!(validate_rating(5.5).is_err());
    assert!(validate_rating(f64::NAN).is_err());
    assert!(validate_rating(f64::INFINITY).is_err());
}

#[test]
fn test_top_n_must_be_positive() {
    assert!(validate_top_n(1).is_ok());
    assert!(validate_top_n(0).is_err());
}

#[test]
fn test_movie_rating_lifecycle() {
    let movie = Movie::new(7, "Seven", vec!["Thriller".to_string()]);
    assert!(!movie.is_rated());
    assert!(movie.has_genre("Thriller"));
    assert!(!movie.has_genre("Comedy"));

    let rated = movie.with_rating(4.0);
    assert!(rated.is_rated());
    assert_eq!(rated.rating, Some(4.0));
}

#[test]
fn test_error_messages_carry_context() {
    let err = RecommenderError::data_format("missing title", Some(12));
    assert_eq!(err.to_string(), "Malformed catalog data at line 12: missing title");

    let err = RecommenderError::data_format("empty file", None);
    assert_eq!(err.to_string(), "Malformed catalog data: empty file");

    let err = RecommenderError::TrainingDivergedError {
        iteration: 3,
        cost: f64::INFINITY,
    };
    assert!(err.to_string().contains("iteration 3"));
}

#[test]
fn test_retryable_errors() {
    assert!(RecommenderError::TrainingInProgress.is_retryable());
    assert!(RecommenderError::Cancelled.is_retryable());
    assert!(!RecommenderError::InsufficientDataError.is_retryable());
    assert!(!RecommenderError::data_format("bad", None).is_retryable());
}
