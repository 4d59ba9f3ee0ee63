//! Vocabulary filtering.
//!
//! Four exclusion rules are evaluated against the document frequency of
//! every word:
//! - singleton: `n_documents <= singleton_threshold`
//! - over-common: `n_documents > common_fraction_threshold * D` (strict)
//! - junk: the word is on the configured exclusion list
//! - numeric: the word parses entirely as a number
//!
//! The rules only decide membership of a single exclusion set, so the order
//! in which they are evaluated does not change the result. An excluded word
//! is removed from every document.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use lda_types::{DocumentId, FilterConfig, PipelineError};

use crate::numeric::is_numeric_token;
use crate::table::TokenTable;
use crate::tokenize::normalize_word;

/// Why a word was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Singleton,
    OverCommon,
    Junk,
    Numeric,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::Singleton => write!(f, "singleton"),
            ExclusionReason::OverCommon => write!(f, "over-common"),
            ExclusionReason::Junk => write!(f, "junk"),
            ExclusionReason::Numeric => write!(f, "numeric"),
        }
    }
}

/// Diagnostics of one filter run.
///
/// Per-rule counts overlap: a word matched by two rules is counted under both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Corpus size `D` used by the over-common rule
    pub total_documents: usize,
    pub vocabulary_before: usize,
    pub vocabulary_after: usize,
    /// Distinct words removed by any rule
    pub excluded_words: usize,
    pub removed_singleton: usize,
    pub removed_over_common: usize,
    pub removed_junk: usize,
    pub removed_numeric: usize,
    pub occurrences_before: usize,
    pub occurrences_after: usize,
    /// Documents that had tokens before filtering and none after
    pub emptied_documents: Vec<DocumentId>,
    /// Documents that had no tokens even before filtering
    pub documents_without_tokens: usize,
}

impl FilterReport {
    /// Fail with `AllWordsFiltered` when no word survived.
    ///
    /// An empty vocabulary is a valid outcome of the filter itself; callers
    /// that need at least one column use this check.
    pub fn ensure_vocabulary(&self) -> Result<(), PipelineError> {
        if self.vocabulary_after == 0 {
            return Err(PipelineError::AllWordsFiltered(format!(
                "all {} words of {} documents were excluded",
                self.vocabulary_before, self.total_documents
            )));
        }
        Ok(())
    }

    /// Number of documents with an all-zero row after filtering.
    pub fn empty_rows(&self) -> usize {
        self.emptied_documents.len() + self.documents_without_tokens
    }
}

/// Result of a filter run: the restricted table and its diagnostics.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: TokenTable,
    pub report: FilterReport,
}

/// Document-frequency vocabulary filter.
#[derive(Debug, Clone)]
pub struct VocabularyFilter {
    config: FilterConfig,
    junk: HashSet<String>,
}

impl VocabularyFilter {
    /// Create a filter, validating its thresholds.
    ///
    /// # Errors
    /// `InvalidThreshold` if `singleton_threshold < 1` or
    /// `common_fraction_threshold` is outside `[0, 1]`.
    pub fn new(config: FilterConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let junk = config
            .junk_words
            .iter()
            .filter_map(|w| normalize_word(w))
            .collect();
        Ok(Self { config, junk })
    }

    /// Get configuration.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Rules excluding `word`, given its document frequency and the corpus
    /// size. Empty when the word survives.
    pub fn exclusion_reasons(
        &self,
        word: &str,
        n_documents: usize,
        total_documents: usize,
    ) -> Vec<ExclusionReason> {
        let mut reasons = Vec::new();
        if n_documents <= self.config.singleton_threshold {
            reasons.push(ExclusionReason::Singleton);
        }
        if n_documents as f64 > self.config.common_fraction_threshold * total_documents as f64 {
            reasons.push(ExclusionReason::OverCommon);
        }
        if self.junk.contains(word) {
            reasons.push(ExclusionReason::Junk);
        }
        if is_numeric_token(word) {
            reasons.push(ExclusionReason::Numeric);
        }
        reasons
    }

    /// Apply the filter to a token table.
    ///
    /// `D` is the table's document count, which includes documents without
    /// tokens. Documents emptied by filtering keep their place in the
    /// document list and are reported, not rejected.
    ///
    /// # Errors
    /// `EmptyInput` if the table lists no documents.
    #[instrument(skip_all, fields(documents = table.document_count()))]
    pub fn apply(&self, table: &TokenTable) -> Result<FilterOutcome, PipelineError> {
        let total_documents = table.document_count();
        if total_documents == 0 {
            return Err(PipelineError::EmptyInput);
        }

        let mut report = FilterReport {
            total_documents,
            occurrences_before: table.len(),
            ..Default::default()
        };

        let mut excluded: BTreeSet<String> = BTreeSet::new();
        for (word, n_documents) in table.document_frequencies() {
            report.vocabulary_before += 1;
            let reasons = self.exclusion_reasons(&word, n_documents, total_documents);
            if reasons.is_empty() {
                continue;
            }
            for reason in &reasons {
                match reason {
                    ExclusionReason::Singleton => report.removed_singleton += 1,
                    ExclusionReason::OverCommon => report.removed_over_common += 1,
                    ExclusionReason::Junk => report.removed_junk += 1,
                    ExclusionReason::Numeric => report.removed_numeric += 1,
                }
            }
            debug!(word = %word, n_documents, ?reasons, "Excluding word");
            excluded.insert(word);
        }

        let filtered = table.retain_words(|w| !excluded.contains(w));

        let before = table.documents_with_tokens();
        let after = filtered.documents_with_tokens();
        report.emptied_documents = table
            .documents()
            .iter()
            .filter(|d| before.contains(d.as_str()) && !after.contains(d.as_str()))
            .cloned()
            .collect();
        report.documents_without_tokens = total_documents - before.len();
        report.excluded_words = excluded.len();
        report.vocabulary_after = report.vocabulary_before - report.excluded_words;
        report.occurrences_after = filtered.len();

        if !report.emptied_documents.is_empty() {
            warn!(
                emptied = report.emptied_documents.len(),
                "Filtering left documents without any word; they become all-zero rows"
            );
        }
        if report.vocabulary_after == 0 {
            warn!(
                vocabulary_before = report.vocabulary_before,
                "Filtering removed every word of the corpus"
            );
        }
        info!(
            vocabulary_before = report.vocabulary_before,
            vocabulary_after = report.vocabulary_after,
            singleton = report.removed_singleton,
            over_common = report.removed_over_common,
            junk = report.removed_junk,
            numeric = report.removed_numeric,
            "Filtered vocabulary"
        );

        Ok(FilterOutcome {
            table: filtered,
            report,
        })
    }
}

impl Default for VocabularyFilter {
    fn default() -> Self {
        Self {
            config: FilterConfig::default(),
            junk: HashSet::new(),
        }
    }
}
