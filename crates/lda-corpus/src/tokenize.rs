//! Tokenizer and per-document word counter.
//!
//! Words are split with the Unicode word-boundary rules (UAX #29), which keep
//! decimals (`3.14`), grouped numbers (`1,000`) and contractions (`don't`)
//! as single tokens. Each token is lower-cased and stripped of surrounding
//! punctuation; stop words are removed before counting.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, instrument};
use unicode_segmentation::UnicodeSegmentation;

use lda_types::{Document, PipelineError, TokenOccurrence, TokenizerConfig};

use crate::stopwords::DEFAULT_STOP_WORDS;
use crate::table::TokenTable;

/// Stop-word aware tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
    min_token_length: usize,
}

impl Tokenizer {
    /// Create a tokenizer with the given stop words only.
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .filter_map(|w| normalize_word(w.as_ref()))
                .collect(),
            min_token_length: 1,
        }
    }

    /// Create a tokenizer from configuration.
    pub fn from_config(config: &TokenizerConfig) -> Self {
        let configured = config.stop_words.iter().map(String::as_str);
        let tokenizer = if config.include_default_stop_words {
            Self::new(DEFAULT_STOP_WORDS.iter().copied().chain(configured))
        } else {
            Self::new(configured)
        };
        tokenizer.with_min_token_length(config.min_token_length)
    }

    /// Drop tokens shorter than `min` characters.
    pub fn with_min_token_length(mut self, min: usize) -> Self {
        self.min_token_length = min.max(1);
        self
    }

    /// Check if a normalized word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Number of distinct stop words.
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }

    /// Split text into normalized tokens, stop words removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(normalize_word)
            .filter(|w| w.chars().count() >= self.min_token_length)
            .filter(|w| !self.is_stop_word(w))
            .collect()
    }

    /// Count normalized tokens of one text, sorted by word.
    pub fn count(&self, text: &str) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for token in self.tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::from_config(&TokenizerConfig::default())
    }
}

/// Normalize a raw word: lower-case, typographic apostrophes to `'`,
/// leading and trailing punctuation removed.
///
/// Returns `None` when nothing alphanumeric is left.
pub fn normalize_word(raw: &str) -> Option<String> {
    let lowered: String = raw
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '\u{02bc}' => '\'',
            other => other,
        })
        .collect();
    let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Turn documents into a token-occurrence table.
///
/// Documents with empty or whitespace-only text contribute no rows but stay
/// in the table's document list.
///
/// # Errors
/// - `EmptyInput` if `documents` is empty
/// - `SchemaMismatch` if two documents share an id
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn count_tokens(
    documents: &[Document],
    tokenizer: &Tokenizer,
) -> Result<TokenTable, PipelineError> {
    if documents.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let mut ids = Vec::with_capacity(documents.len());
    let mut occurrences = Vec::new();
    let mut blank = 0usize;

    for doc in documents {
        ids.push(doc.document_id.clone());
        if doc.is_blank() {
            blank += 1;
            debug!(document_id = %doc.document_id, "Document has no text");
            continue;
        }
        for (word, count) in tokenizer.count(&doc.full_text) {
            occurrences.push(TokenOccurrence {
                document_id: doc.document_id.clone(),
                word,
                count,
            });
        }
    }

    let table = TokenTable::new(ids, occurrences)?;
    info!(
        documents = table.document_count(),
        blank_documents = blank,
        occurrences = table.len(),
        tokens = table.total_tokens(),
        "Tokenized corpus"
    );
    Ok(table)
}
