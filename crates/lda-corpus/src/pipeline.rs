//! Corpus preparation pipeline.
//!
//! Chains tokenization, vocabulary filtering and matrix construction. Each
//! stage receives everything it needs as arguments; no corpus statistic is
//! held between calls.

use tracing::{info, instrument};

use lda_types::{Document, FilterConfig, PipelineError, TokenizerConfig};

use crate::dtm::DocumentTermMatrix;
use crate::filter::{FilterReport, VocabularyFilter};
use crate::table::TokenTable;
use crate::tokenize::{count_tokens, Tokenizer};

/// Output of every preparation stage.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    /// Token occurrences before filtering
    pub tokens: TokenTable,
    /// Token occurrences after filtering
    pub filtered: TokenTable,
    pub filter_report: FilterReport,
    pub matrix: DocumentTermMatrix,
}

/// Tokenize, filter and build the document-term matrix.
///
/// # Errors
/// - `InvalidThreshold` for bad filter settings, checked before any work
/// - `EmptyInput` if `documents` is empty
/// - `SchemaMismatch` for duplicate document ids
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn prepare_corpus(
    documents: &[Document],
    tokenizer_config: &TokenizerConfig,
    filter_config: &FilterConfig,
) -> Result<PreparedCorpus, PipelineError> {
    tokenizer_config.validate()?;
    let filter = VocabularyFilter::new(filter_config.clone())?;
    if documents.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let tokenizer = Tokenizer::from_config(tokenizer_config);
    let tokens = count_tokens(documents, &tokenizer)?;
    let outcome = filter.apply(&tokens)?;
    let matrix = DocumentTermMatrix::from_table(&outcome.table);

    info!(
        rows = matrix.n_rows(),
        cols = matrix.n_cols(),
        empty_rows = outcome.report.empty_rows(),
        "Corpus prepared"
    );

    Ok(PreparedCorpus {
        tokens,
        filtered: outcome.table,
        filter_report: outcome.report,
        matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_stop_words() -> TokenizerConfig {
        TokenizerConfig {
            include_default_stop_words: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_all_filtered_example() {
        let docs = vec![
            Document::new("A", "fish fish water"),
            Document::new("B", "fish farm water pen"),
            Document::new("C", "farm pen policy"),
        ];
        let prepared = prepare_corpus(&docs, &no_stop_words(), &FilterConfig::default()).unwrap();
        assert_eq!(prepared.matrix.n_rows(), 3);
        assert_eq!(prepared.matrix.n_cols(), 0);
        assert_eq!(prepared.tokens.len(), 9);
        assert!(prepared.filtered.is_empty());
    }

    #[test]
    fn test_prepare_rows_match_input_documents() {
        let docs = vec![
            Document::new("1", "reef fish reef"),
            Document::new("2", "reef kelp"),
            Document::new("3", ""),
            Document::new("4", "kelp fish"),
            Document::new("5", "unique"),
        ];
        let prepared = prepare_corpus(&docs, &no_stop_words(), &FilterConfig::default()).unwrap();
        assert_eq!(prepared.matrix.n_rows(), docs.len());
        assert_eq!(prepared.matrix.terms(), &["fish", "kelp", "reef"]);
        assert_eq!(prepared.matrix.get(0, 2), 2);
        assert_eq!(prepared.filter_report.emptied_documents, vec!["5".to_string()]);
    }

    #[test]
    fn test_prepare_checks_thresholds_first() {
        let filter = FilterConfig {
            common_fraction_threshold: 2.0,
            ..Default::default()
        };
        let result = prepare_corpus(&[], &no_stop_words(), &filter);
        assert!(matches!(result, Err(PipelineError::InvalidThreshold(_))));
    }

    #[test]
    fn test_prepare_empty_input() {
        let result = prepare_corpus(&[], &no_stop_words(), &FilterConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }
}
