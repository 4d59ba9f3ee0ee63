//! # lda-corpus
//!
//! Corpus preparation for topic modelling of bibliographic records.
//!
//! This crate turns `(document_id, full_text)` records into a sparse
//! document-term matrix ready for an LDA fitter.
//!
//! ## Features
//! - CSV ingest with configurable column names and delimiter
//! - Unicode word-boundary tokenization with stop-word removal
//! - Vocabulary filtering by document frequency, junk list and numeric tokens
//! - Compressed sparse document-term matrix with stable row/column identities
//!
//! ## Stages
//! `ingest` -> `tokenize` -> `filter` -> `dtm`, chained by [`prepare_corpus`].

pub mod dtm;
pub mod filter;
pub mod ingest;
pub mod numeric;
pub mod pipeline;
pub mod stopwords;
pub mod table;
pub mod tokenize;

pub use dtm::{Cell, DocumentTermMatrix};
pub use filter::{ExclusionReason, FilterOutcome, FilterReport, VocabularyFilter};
pub use ingest::{load_documents, read_documents};
pub use numeric::is_numeric_token;
pub use pipeline::{prepare_corpus, PreparedCorpus};
pub use stopwords::DEFAULT_STOP_WORDS;
pub use table::TokenTable;
pub use tokenize::{count_tokens, normalize_word, Tokenizer};
