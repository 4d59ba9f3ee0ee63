//! # lda-sweep
//!
//! Topic-count selection by coherence sweep.
//!
//! For each candidate topic count `k` an external topic-model fitter is run
//! on a shared document-term matrix with a reproducible seed. The top terms
//! of every topic are scored with a coherence metric and averaged, giving a
//! coherence-per-k curve for a human to judge. No best `k` is picked.
//!
//! ## Features
//! - `TopicModelFitter` and `CoherenceScorer` capability traits
//! - UMass coherence over document co-occurrence
//! - Per-k seeds derived up front from one top-level seed
//! - Parallel fits with a concurrency limit and optional per-fit timeout
//! - Failed fits are recorded per k; the sweep always completes
//! - CSV export of word-topic, document-topic and coherence tables

pub mod coherence;
pub mod error;
pub mod fitter;
pub mod mock;
pub mod model;
pub mod seed;
pub mod sweep;
pub mod tables;

pub use coherence::{
    score_topics, score_word_topic_table, CoherenceScorer, TopicCoherence, UMassCoherence,
};
pub use error::FitError;
pub use fitter::{fit_model, TopicModelFitter};
pub use mock::MockFitter;
pub use model::{select_top_terms, validate_word_topic_rows, FittedModel, TopicTerms};
pub use seed::{derive_seeds, seeds_for};
pub use sweep::{CoherencePoint, ModelSweep, SweepEntry, SweepOutcome, SweepReport};
pub use tables::{
    read_word_topic_file, read_word_topic_table, topic_coherence_rows, topic_term_rows,
    write_table, write_table_file, TopicCoherenceRow, TopicTermRow,
};
