//! Rating Matrix Builder
//!
//! Converts catalog ratings into a dense (movies x users) matrix and a boolean
//! mask of observed entries.

use crate::ratings::UserRatings;
use movie_recommender_core::{Movie, MovieId, RecommenderError, Result};
use ndarray::Array2;
use tracing::debug;

/// Dense ratings with their observation mask
///
/// Rows follow ascending movie id. Column 0 is the catalog user; further
/// columns are any additional users supplied to [`RatingMatrix::build_for_users`].
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    /// [num_movies x num_users]; unobserved cells hold 0 and are never read
    ratings: Array2<f64>,
    /// [num_movies x num_users]; true iff the user rated the movie
    mask: Array2<bool>,
    movie_ids: Vec<MovieId>,
}

impl RatingMatrix {
    /// Build the single-user matrix from the ratings stored on each movie
    ///
    /// # Errors
    ///
    /// `InsufficientDataError` when no movie is rated.
    pub fn build(movies: &[Movie]) -> Result<Self> {
        Self::build_for_users(movies, &[])
    }

    /// Build a matrix whose first column comes from the movies' own ratings and
    /// whose remaining columns come from `other_users`
    ///
    /// Ratings for movies absent from `movies` are ignored.
    ///
    /// # Errors
    ///
    /// `InsufficientDataError` when no cell at all is observed.
    pub fn build_for_users(movies: &[Movie], other_users: &[&UserRatings]) -> Result<Self> {
        let mut ordered: Vec<&Movie> = movies.iter().collect();
        ordered.sort_by_key(|m| m.id);

        let num_movies = ordered.len();
        let num_users = 1 + other_users.len();
        let mut ratings = Array2::<f64>::zeros((num_movies, num_users));
        let mut mask = Array2::<bool>::from_elem((num_movies, num_users), false);

        for (i, movie) in ordered.iter().enumerate() {
            if let Some(rating) = movie.rating {
                ratings[[i, 0]] = rating;
                mask[[i, 0]] = true;
            }
            for (u, user) in other_users.iter().enumerate() {
                if let Some(&rating) = user.get(&movie.id) {
                    ratings[[i, u + 1]] = rating;
                    mask[[i, u + 1]] = true;
                }
            }
        }

        let matrix = Self {
            ratings,
            mask,
            movie_ids: ordered.iter().map(|m| m.id).collect(),
        };

        if matrix.observed_count() == 0 {
            return Err(RecommenderError::InsufficientDataError);
        }

        debug!(
            movies = num_movies,
            users = num_users,
            observed = matrix.observed_count(),
            "Rating matrix built"
        );
        Ok(matrix)
    }

    pub fn ratings(&self) -> &Array2<f64> {
        &self.ratings
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Movie id of every row
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn num_movies(&self) -> usize {
        self.ratings.nrows()
    }

    pub fn num_users(&self) -> usize {
        self.ratings.ncols()
    }

    pub fn observed_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Number of movies rated by `user`
    pub fn observed_for_user(&self, user: usize) -> usize {
        self.mask.column(user).iter().filter(|&&m| m).count()
    }

    pub fn is_observed(&self, movie_row: usize, user: usize) -> bool {
        self.mask[[movie_row, user]]
    }
}
