//! Trainer
//!
//! Mean-normalizes the observed ratings, then runs a fixed number of batch
//! gradient-descent iterations over the [`FactorizationModel`].

use crate::factorization::FactorizationModel;
use crate::rating_matrix::RatingMatrix;
use movie_recommender_core::{MovieId, RecommenderError, Result};
use ndarray::{Array1, Array2, Zip};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

const LOG_EVERY: usize = 10;

/// Gradient descent hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Step size α
    pub learning_rate: f64,
    /// Regularization strength λ
    pub regularization: f64,
    /// Number of gradient-descent iterations
    pub iterations: usize,
    /// RNG seed for factor initialization; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.005,
            regularization: 10.0,
            iterations: 100,
            seed: None,
        }
    }
}

/// Per-movie mean of observed ratings and the mean-centered matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MeanNormalization {
    /// Mean of the observed ratings of each movie; 0 for movies nobody rated
    pub means: Array1<f64>,
    /// R − mean on observed cells, 0 elsewhere
    pub normalized: Array2<f64>,
}

impl MeanNormalization {
    pub fn compute(ratings: &Array2<f64>, mask: &Array2<bool>) -> Self {
        let mut means = Array1::<f64>::zeros(ratings.nrows());
        for (i, mean) in means.iter_mut().enumerate() {
            let (sum, count) = ratings
                .row(i)
                .iter()
                .zip(mask.row(i).iter())
                .filter(|&(_, &observed)| observed)
                .fold((0.0, 0usize), |(sum, count), (&r, _)| (sum + r, count + 1));
            if count > 0 {
                *mean = sum / count as f64;
            }
        }

        let mut normalized = ratings.clone();
        for ((i, _), value) in normalized.indexed_iter_mut() {
            *value -= means[i];
        }
        Zip::from(&mut normalized)
            .and(mask)
            .for_each(|value, &observed| {
                if !observed {
                    *value = 0.0;
                }
            });

        Self { means, normalized }
    }
}

/// Outcome of one training run
///
/// Owns everything recommendation needs; nothing is shared with later runs.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    model: FactorizationModel,
    means: Array1<f64>,
    mask: Array2<bool>,
    movie_ids: Vec<MovieId>,
    cost_history: Vec<f64>,
    rmse: f64,
}

impl TrainedModel {
    pub fn model(&self) -> &FactorizationModel {
        &self.model
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn num_users(&self) -> usize {
        self.model.num_users()
    }

    /// Cost after every iteration, in order
    pub fn cost_history(&self) -> &[f64] {
        &self.cost_history
    }

    /// Cost after the last iteration
    pub fn final_cost(&self) -> f64 {
        self.cost_history.last().copied().unwrap_or(f64::NAN)
    }

    /// Root-mean-squared error of the reconstructed ratings over rated cells
    ///
    /// This is the scalar surfaced to users as the prediction error.
    pub fn prediction_error(&self) -> f64 {
        self.rmse
    }

    /// Predicted rating on the original scale: X_i · Θ_u + mean_i
    pub fn predicted_rating(&self, movie_row: usize, user: usize) -> f64 {
        self.model.predict(movie_row, user) + self.means[movie_row]
    }
}

/// Gradient-descent trainer
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train a `latent_factors`-dimensional model on `matrix`
    ///
    /// # Errors
    ///
    /// - `ValidationError` when `latent_factors` or `iterations` is zero
    /// - `TrainingDivergedError` when the cost becomes non-finite
    pub fn train(&self, matrix: &RatingMatrix, latent_factors: usize) -> Result<TrainedModel> {
        self.train_with_cancel(matrix, latent_factors, &AtomicBool::new(false))
    }

    /// Same as [`train`](Self::train), checking `cancel` between iterations
    ///
    /// # Errors
    ///
    /// Additionally returns `Cancelled` once `cancel` is observed set.
    pub fn train_with_cancel(
        &self,
        matrix: &RatingMatrix,
        latent_factors: usize,
        cancel: &AtomicBool,
    ) -> Result<TrainedModel> {
        if latent_factors == 0 {
            return Err(RecommenderError::validation_field(
                "at least one latent factor is required",
                "latent_factors",
            ));
        }

        let started = Instant::now();
        let TrainerConfig {
            learning_rate,
            regularization: lambda,
            iterations,
            seed,
        } = self.config;
        if iterations == 0 {
            return Err(RecommenderError::validation_field(
                "at least one iteration is required",
                "iterations",
            ));
        }

        let MeanNormalization { means, normalized } =
            MeanNormalization::compute(matrix.ratings(), matrix.mask());
        let mask = matrix.mask();

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut model = FactorizationModel::random(
            matrix.num_movies(),
            matrix.num_users(),
            latent_factors,
            &mut rng,
        );

        info!(
            movies = matrix.num_movies(),
            users = matrix.num_users(),
            observed = matrix.observed_count(),
            latent_factors,
            iterations,
            learning_rate,
            lambda,
            "Starting matrix factorization training"
        );

        let mut cost_history = Vec::with_capacity(iterations);
        for iteration in 0..iterations {
            if cancel.load(Ordering::Relaxed) {
                info!(iteration, "Training cancelled");
                return Err(RecommenderError::Cancelled);
            }

            let gradients = model.gradients(&normalized, mask, lambda);
            model.step(&gradients, learning_rate);

            let cost = model.cost(&normalized, mask, lambda);
            if !cost.is_finite() {
                warn!(iteration, cost, "Training diverged");
                return Err(RecommenderError::TrainingDivergedError { iteration, cost });
            }
            cost_history.push(cost);

            if iteration % LOG_EVERY == 0 {
                debug!(iteration, cost, "Gradient descent iteration");
            }
        }

        if !model.is_finite() {
            return Err(RecommenderError::TrainingDivergedError {
                iteration: iterations,
                cost: f64::NAN,
            });
        }

        let rmse = reconstruction_rmse(&model, &normalized, mask);
        info!(
            final_cost = cost_history.last().copied().unwrap_or(f64::NAN),
            rmse,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Training complete"
        );

        Ok(TrainedModel {
            model,
            means,
            mask: mask.clone(),
            movie_ids: matrix.movie_ids().to_vec(),
            cost_history,
            rmse,
        })
    }
}

/// RMSE over observed cells
///
/// Adding the means back to both prediction and target cancels, so the error
/// is measured on the normalized values.
fn reconstruction_rmse(
    model: &FactorizationModel,
    normalized: &Array2<f64>,
    mask: &Array2<bool>,
) -> f64 {
    let predictions = model.predictions();
    let mut squared_error = 0.0;
    let mut count = 0usize;
    Zip::from(&predictions)
        .and(normalized)
        .and(mask)
        .for_each(|&p, &r, &observed| {
            if observed {
                squared_error += (p - r).powi(2);
                count += 1;
            }
        });

    if count > 0 {
        (squared_error / count as f64).sqrt()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movie_recommender_core::Movie;
    use ndarray::array;

    fn seeded(learning_rate: f64, regularization: f64, iterations: usize) -> Trainer {
        Trainer::new(TrainerConfig {
            learning_rate,
            regularization,
            iterations,
            seed: Some(11),
        })
    }

    #[test]
    fn test_mean_of_single_rating_is_that_rating() {
        let ratings = array![[4.5], [0.0]];
        let mask = array![[true], [false]];
        let norm = MeanNormalization::compute(&ratings, &mask);

        assert_eq!(norm.means[0], 4.5);
        assert_eq!(norm.normalized[[0, 0]], 0.0);
    }

    #[test]
    fn test_mean_ignores_unobserved_and_defaults_to_zero() {
        let ratings = array![[4.0, 0.0, 2.0], [0.0, 0.0, 0.0]];
        let mask = array![[true, false, true], [false, false, false]];
        let norm = MeanNormalization::compute(&ratings, &mask);

        assert_eq!(norm.means, array![3.0, 0.0]);
        assert_eq!(norm.normalized, array![[1.0, 0.0, -1.0], [0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_cost_history_has_one_entry_per_iteration() {
        let movies = vec![
            Movie::new(1, "A", vec![]).with_rating(4.0),
            Movie::new(2, "B", vec![]),
        ];
        let matrix = RatingMatrix::build(&movies).unwrap();
        let trained = seeded(0.01, 1.0, 25).train(&matrix, 3).unwrap();

        assert_eq!(trained.cost_history().len(), 25);
        assert_eq!(trained.final_cost(), *trained.cost_history().last().unwrap());
        assert!(trained.prediction_error().is_finite());
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let movies = vec![
            Movie::new(1, "A", vec![]).with_rating(4.0),
            Movie::new(2, "B", vec![]).with_rating(2.0),
            Movie::new(3, "C", vec![]),
        ];
        let matrix = RatingMatrix::build(&movies).unwrap();
        let trainer = seeded(0.01, 1.0, 20);

        let first = trainer.train(&matrix, 4).unwrap();
        let second = trainer.train(&matrix, 4).unwrap();
        assert_eq!(first.model(), second.model());
        assert_eq!(first.cost_history(), second.cost_history());
    }

    #[test]
    fn test_zero_latent_factors_is_rejected() {
        let movies = vec![Movie::new(1, "A", vec![]).with_rating(4.0)];
        let matrix = RatingMatrix::build(&movies).unwrap();
        assert!(matches!(
            Trainer::default().train(&matrix, 0),
            Err(RecommenderError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_zero_iterations_is_rejected() {
        let movies = vec![Movie::new(1, "A", vec![]).with_rating(4.0)];
        let matrix = RatingMatrix::build(&movies).unwrap();
        match seeded(0.01, 1.0, 0).train(&matrix, 2) {
            Err(RecommenderError::ValidationError { field, .. }) => {
                assert_eq!(field.as_deref(), Some("iterations"));
            }
            other => panic!("Expected ValidationError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_preset_cancel_flag_stops_training() {
        let movies = vec![Movie::new(1, "A", vec![]).with_rating(4.0)];
        let matrix = RatingMatrix::build(&movies).unwrap();
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            seeded(0.01, 1.0, 10).train_with_cancel(&matrix, 2, &cancel),
            Err(RecommenderError::Cancelled)
        ));
    }
}
