//! Topic-model fitter capability.
//!
//! Topic-model inference is supplied from outside this crate. A fitter takes
//! a document-term matrix, a topic count and a seed and returns a
//! [`FittedModel`]. The sweep validates every returned model before using
//! it.

use tracing::{debug, instrument};

use lda_corpus::DocumentTermMatrix;
use lda_types::PipelineError;

use crate::error::FitError;
use crate::model::FittedModel;

/// Fits a topic model with `k` topics.
///
/// Implementations must be deterministic for a given matrix, `k` and seed,
/// and must not keep state between calls that changes later results. Fits
/// for different `k` may run concurrently on separate threads.
pub trait TopicModelFitter: Send + Sync {
    /// Fit a `k`-topic model on `dtm`.
    fn fit(&self, dtm: &DocumentTermMatrix, k: usize, seed: u64) -> Result<FittedModel, FitError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "fitter"
    }
}

/// Fit a single model and check it against the matrix.
///
/// # Errors
/// - `EmptyInput` if the matrix has no rows
/// - `AllWordsFiltered` if the matrix has no columns
/// - `FitterFailure` if the fitter fails or returns an invalid model
#[instrument(skip(fitter, dtm), fields(name = fitter.name()))]
pub fn fit_model(
    fitter: &dyn TopicModelFitter,
    dtm: &DocumentTermMatrix,
    k: usize,
    seed: u64,
) -> Result<FittedModel, PipelineError> {
    if dtm.n_rows() == 0 {
        return Err(PipelineError::EmptyInput);
    }
    if dtm.n_cols() == 0 {
        return Err(PipelineError::AllWordsFiltered(
            "document-term matrix has no columns".to_string(),
        ));
    }

    let to_failure = |e: FitError| PipelineError::FitterFailure {
        k,
        reason: e.to_string(),
    };
    let model = fitter.fit(dtm, k, seed).map_err(to_failure)?;
    model.validate(dtm, k).map_err(to_failure)?;
    debug!(k, "Model fitted");
    Ok(model)
}
