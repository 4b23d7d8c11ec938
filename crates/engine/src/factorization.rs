//! Regularized matrix factorization
//!
//! Learns movie features X [num_movies x k] and user weights Θ [num_users x k]
//! such that X Θᵀ approximates the mean-normalized ratings on observed cells.
//!
//! Cost over observed entries only:
//!
//! ```text
//! J = ½ Σ_mask (X_i · Θ_u − R(i,u))² + λ/2 (Σ X² + Σ Θ²)
//! ```
//!
//! with gradients `dJ/dX = (E ∘ M) Θ + λX` and `dJ/dΘ = (E ∘ M)ᵀ X + λΘ`,
//! where `E = X Θᵀ − R` and `M` is the mask.

use movie_recommender_core::{RecommenderError, Result};
use ndarray::{Array2, Zip};
use rand::Rng;

/// Half-width of the uniform interval used for random initialization
pub const INIT_SCALE: f64 = 0.1;

/// Gradients of the cost with respect to both factor matrices
#[derive(Debug, Clone)]
pub struct Gradients {
    /// dJ/dX, [num_movies x k]
    pub features: Array2<f64>,
    /// dJ/dΘ, [num_users x k]
    pub weights: Array2<f64>,
}

impl Gradients {
    /// Frobenius norm of both gradients together
    pub fn norm(&self) -> f64 {
        self.features
            .iter()
            .chain(self.weights.iter())
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt()
    }
}

/// Latent factor model
#[derive(Debug, Clone, PartialEq)]
pub struct FactorizationModel {
    /// Movie features X: [num_movies x k]
    features: Array2<f64>,
    /// User preference weights Θ: [num_users x k]
    weights: Array2<f64>,
}

impl FactorizationModel {
    /// Wrap existing factor matrices
    ///
    /// # Errors
    ///
    /// `ValidationError` when the latent dimensions differ or are zero.
    pub fn new(features: Array2<f64>, weights: Array2<f64>) -> Result<Self> {
        if features.ncols() != weights.ncols() {
            return Err(RecommenderError::validation_field(
                format!(
                    "features have {} latent factors but weights have {}",
                    features.ncols(),
                    weights.ncols()
                ),
                "latent_factors",
            ));
        }
        if features.ncols() == 0 {
            return Err(RecommenderError::validation_field(
                "at least one latent factor is required",
                "latent_factors",
            ));
        }
        Ok(Self { features, weights })
    }

    /// Initialize both matrices uniformly in (-INIT_SCALE, INIT_SCALE)
    ///
    /// Non-zero values break the symmetry that would otherwise leave every
    /// gradient at zero.
    pub fn random<R: Rng + ?Sized>(
        num_movies: usize,
        num_users: usize,
        latent_factors: usize,
        rng: &mut R,
    ) -> Self {
        let features = Array2::from_shape_fn((num_movies, latent_factors), |_| {
            rng.gen_range(-INIT_SCALE..INIT_SCALE)
        });
        let weights = Array2::from_shape_fn((num_users, latent_factors), |_| {
            rng.gen_range(-INIT_SCALE..INIT_SCALE)
        });
        Self { features, weights }
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn latent_factors(&self) -> usize {
        self.features.ncols()
    }

    pub fn num_movies(&self) -> usize {
        self.features.nrows()
    }

    pub fn num_users(&self) -> usize {
        self.weights.nrows()
    }

    /// Reconstructed (normalized) ratings X Θᵀ
    pub fn predictions(&self) -> Array2<f64> {
        self.features.dot(&self.weights.t())
    }

    /// Reconstructed (normalized) rating of one cell
    pub fn predict(&self, movie_row: usize, user: usize) -> f64 {
        self.features.row(movie_row).dot(&self.weights.row(user))
    }

    /// E = X Θᵀ − R on observed cells, 0 elsewhere
    fn masked_residuals(&self, normalized: &Array2<f64>, mask: &Array2<bool>) -> Array2<f64> {
        let mut residuals = self.predictions();
        Zip::from(&mut residuals)
            .and(normalized)
            .and(mask)
            .for_each(|e, &r, &observed| {
                *e = if observed { *e - r } else { 0.0 };
            });
        residuals
    }

    /// Regularized squared error over observed entries
    pub fn cost(&self, normalized: &Array2<f64>, mask: &Array2<bool>, lambda: f64) -> f64 {
        let residuals = self.masked_residuals(normalized, mask);
        let squared_error: f64 = residuals.iter().map(|e| e * e).sum();
        let penalty: f64 = self
            .features
            .iter()
            .chain(self.weights.iter())
            .map(|v| v * v)
            .sum();
        0.5 * squared_error + 0.5 * lambda * penalty
    }

    /// Gradients of [`cost`](Self::cost) at the current factors
    pub fn gradients(
        &self,
        normalized: &Array2<f64>,
        mask: &Array2<bool>,
        lambda: f64,
    ) -> Gradients {
        let residuals = self.masked_residuals(normalized, mask);

        let mut features = residuals.dot(&self.weights);
        features.scaled_add(lambda, &self.features);

        let mut weights = residuals.t().dot(&self.features);
        weights.scaled_add(lambda, &self.weights);

        Gradients { features, weights }
    }

    /// One batch gradient-descent update: X -= αdX, Θ -= αdΘ
    pub fn step(&mut self, gradients: &Gradients, learning_rate: f64) {
        self.features.scaled_add(-learning_rate, &gradients.features);
        self.weights.scaled_add(-learning_rate, &gradients.weights);
    }

    /// Whether every factor value is finite
    pub fn is_finite(&self) -> bool {
        self.features
            .iter()
            .chain(self.weights.iter())
            .all(|v| v.is_finite())
    }
}
