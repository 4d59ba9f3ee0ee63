//! Fit error types.

use thiserror::Error;

/// Errors produced while fitting or evaluating one topic count.
///
/// During a sweep these are recorded against their `k`; they never abort
/// the remaining fits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Fitter refused the topic count (e.g. k >= number of documents)
    #[error("Topic count rejected: {0}")]
    Rejected(String),

    /// Inference stopped without converging
    #[error("Did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    /// Any other fitter failure
    #[error("Fit failed: {0}")]
    Failed(String),

    /// Fit exceeded the configured timeout
    #[error("Fit timed out after {0} ms")]
    Timeout(u64),

    /// Fitter output does not match the matrix or is not stochastic
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Fit worker panicked
    #[error("Fit worker panicked: {0}")]
    Panicked(String),
}
