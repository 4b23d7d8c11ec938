//! Background training worker
//!
//! Runs a [`TrainingRequest`] on tokio's blocking pool so the caller's thread
//! stays responsive, and hands the complete result back through a oneshot
//! channel. At most one run is in flight per worker.

use crate::session::{Suggestions, TrainingRequest};
use movie_recommender_core::{RecommenderError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Serializes training runs for one session
#[derive(Debug, Clone, Default)]
pub struct TrainingWorker {
    in_flight: Arc<AtomicBool>,
}

/// Handle to a submitted run
#[derive(Debug)]
pub struct TrainingHandle {
    receiver: oneshot::Receiver<Result<Suggestions>>,
    cancel: Arc<AtomicBool>,
}

impl TrainingHandle {
    /// Ask the run to stop at the next iteration boundary
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Wait for the run to finish
    ///
    /// # Errors
    ///
    /// The run's own error, or `TrainingFailed` if the task ended without
    /// delivering a result.
    pub async fn wait(self) -> Result<Suggestions> {
        self.receiver.await.unwrap_or_else(|_| {
            Err(RecommenderError::TrainingFailed {
                message: "training task ended without a result".to_string(),
            })
        })
    }
}

/// Clears the in-flight flag even if the run panics
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TrainingWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start `request` on the blocking pool
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `TrainingInProgress` when a previous run has not finished.
    pub fn submit(&self, request: TrainingRequest) -> Result<TrainingHandle> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected training request while another run is active");
            return Err(RecommenderError::TrainingInProgress);
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let cancel = Arc::new(AtomicBool::new(false));
        let run_cancel = Arc::clone(&cancel);
        let (sender, receiver) = oneshot::channel();

        info!(
            feature_count = request.feature_count(),
            "Submitting training run"
        );
        tokio::task::spawn_blocking(move || {
            let result = run_guarded(|| request.run(&run_cancel));
            drop(guard);
            if sender.send(result).is_err() {
                info!("Training result dropped, handle no longer awaited");
            }
        });

        Ok(TrainingHandle { receiver, cancel })
    }
}

/// Run `train`, turning a panic into `TrainingFailed`
fn run_guarded<F>(train: F) -> Result<Suggestions>
where
    F: FnOnce() -> Result<Suggestions>,
{
    panic::catch_unwind(AssertUnwindSafe(train)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "training panicked".to_string());
        error!(%message, "Training task panicked");
        Err(RecommenderError::TrainingFailed { message })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_becomes_training_failed() {
        let result = run_guarded(|| panic!("factor matrix exploded"));
        match result {
            Err(RecommenderError::TrainingFailed { message }) => {
                assert_eq!(message, "factor matrix exploded");
            }
            other => panic!("Expected TrainingFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_formatted_panic_message_is_kept() {
        let stage = 3;
        let result = run_guarded(|| panic!("failed at stage {}", stage));
        match result {
            Err(RecommenderError::TrainingFailed { message }) => {
                assert_eq!(message, "failed at stage 3");
            }
            other => panic!("Expected TrainingFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_dropped_sender_is_not_reported_as_cancelled() {
        let (sender, receiver) = oneshot::channel::<Result<Suggestions>>();
        drop(sender);
        let handle = TrainingHandle {
            receiver,
            cancel: Arc::new(AtomicBool::new(false)),
        };

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, RecommenderError::TrainingFailed { .. }));
        assert!(!err.is_retryable());
    }
}
