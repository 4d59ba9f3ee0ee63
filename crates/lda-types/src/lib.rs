//! # lda-types
//!
//! Shared domain types for the lda-notebook pipeline.
//!
//! This crate defines the records passed between pipeline stages:
//! - Documents: `(document_id, full_text)` rows read from the input table
//! - Token occurrences: `(document_id, word, count)` triples
//! - Vocabulary entries: words with their document frequency
//! - Topic weights: `beta` and `gamma` rows of a fitted topic model
//! - Settings: layered configuration for every stage
//!
//! ## Usage
//!
//! ```rust
//! use lda_types::{Document, TokenOccurrence};
//!
//! let doc = Document::new("rec-1", "Salmon farming and water quality");
//! let occ = TokenOccurrence::new(doc.document_id.clone(), "salmon", 1);
//! assert_eq!(occ.count, 1);
//! ```

pub mod config;
pub mod document;
pub mod error;

pub use config::{
    FilterConfig, InputConfig, Settings, SweepConfig, TokenizerConfig, DEFAULT_TOPIC_COUNTS,
};
pub use document::{
    Document, DocumentId, DocumentTopicWeight, TokenOccurrence, VocabularyEntry, WordTopicWeight,
};
pub use error::PipelineError;
