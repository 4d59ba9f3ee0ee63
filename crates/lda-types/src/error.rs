//! Error types for the lda-notebook pipeline.

use thiserror::Error;

/// Unified error type for pipeline stages.
///
/// Input-shape errors (`EmptyInput`, `SchemaMismatch`, `InvalidThreshold`)
/// are raised before any processing starts. `FitterFailure` is raised only
/// when a single model is fitted directly; during a sweep fit failures are
/// recorded per topic count instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No documents were supplied
    #[error("Empty input: no documents supplied")]
    EmptyInput,

    /// Threshold outside its valid range
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Every word of the corpus was removed by the vocabulary filter
    #[error("All words filtered: {0}")]
    AllWordsFiltered(String),

    /// External topic model fit failed or rejected k
    #[error("Fitter failure for k={k}: {reason}")]
    FitterFailure { k: usize, reason: String },

    /// Input table is missing required columns or has malformed keys
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Delimited table read/write error
    #[error("Table error: {0}")]
    Table(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether this error is an input-shape error that must abort the run
    /// before any stage executes.
    pub fn is_input_shape(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyInput
                | PipelineError::SchemaMismatch(_)
                | PipelineError::InvalidThreshold(_)
        )
    }
}
