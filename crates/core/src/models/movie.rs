//! Movie catalog entry

use serde::{Deserialize, Serialize};

/// Stable catalog identifier of a movie
pub type MovieId = u32;

/// Genre assigned to movies whose source record lists none
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Lowest star rating a user can give
pub const MIN_RATING: f64 = 0.0;

/// Highest star rating a user can give
pub const MAX_RATING: f64 = 5.0;

/// A movie together with the current user's rating, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Genres in source order, without duplicates
    pub genres: Vec<String>,
    /// User rating on the 0-5 scale; `None` means unrated
    pub rating: Option<f64>,
}

impl Movie {
    pub fn new(id: MovieId, title: impl Into<String>, genres: Vec<String>) -> Self {
        Self {
            id,
            title: title.into(),
            genres,
            rating: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_new_is_unrated() {
        let movie = Movie::new(1, "Toy Story (1995)", vec!["Animation".to_string()]);
        assert!(!movie.is_rated());
        assert!(movie.has_genre("Animation"));
        assert!(!movie.has_genre("Drama"));
    }

    #[test]
    fn test_movie_with_rating() {
        let movie = Movie::new(2, "Heat (1995)", vec![]).with_rating(4.5);
        assert_eq!(movie.rating, Some(4.5));
    }
}
