//! Token-occurrence table.
//!
//! Holds the `(document_id, word, count)` triples of a corpus together with
//! the ordered list of every document in it. Documents without any
//! occurrence stay in the list, so the corpus size `D` travels with the
//! table instead of being recomputed from the surviving rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use lda_types::{DocumentId, PipelineError, TokenOccurrence, VocabularyEntry};

/// Immutable table of token occurrences for an ordered set of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenTable {
    /// Every document of the corpus in first-appearance order
    documents: Vec<DocumentId>,
    /// Occurrences sorted by document order, then word
    occurrences: Vec<TokenOccurrence>,
}

impl TokenTable {
    /// Build a table, checking that:
    /// - document ids are unique
    /// - every occurrence refers to a listed document
    /// - counts are >= 1
    /// - each `(document, word)` pair appears once
    pub fn new(
        documents: Vec<DocumentId>,
        mut occurrences: Vec<TokenOccurrence>,
    ) -> Result<Self, PipelineError> {
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(documents.len());
        for (idx, doc) in documents.iter().enumerate() {
            if positions.insert(doc.as_str(), idx).is_some() {
                return Err(PipelineError::SchemaMismatch(format!(
                    "duplicate document_id '{}'",
                    doc
                )));
            }
        }

        for occ in &occurrences {
            if !positions.contains_key(occ.document_id.as_str()) {
                return Err(PipelineError::SchemaMismatch(format!(
                    "occurrence of '{}' refers to unknown document '{}'",
                    occ.word, occ.document_id
                )));
            }
            if occ.count == 0 {
                return Err(PipelineError::SchemaMismatch(format!(
                    "zero count for '{}' in document '{}'",
                    occ.word, occ.document_id
                )));
            }
        }

        occurrences.sort_by(|a, b| {
            positions[a.document_id.as_str()]
                .cmp(&positions[b.document_id.as_str()])
                .then_with(|| a.word.cmp(&b.word))
        });

        if let Some(dup) = occurrences
            .windows(2)
            .find(|w| w[0].document_id == w[1].document_id && w[0].word == w[1].word)
        {
            return Err(PipelineError::SchemaMismatch(format!(
                "word '{}' listed twice for document '{}'",
                dup[0].word, dup[0].document_id
            )));
        }

        drop(positions);
        Ok(Self {
            documents,
            occurrences,
        })
    }

    /// Documents of the corpus, in order.
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    /// Total number of documents `D`, including those without tokens.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// All occurrences, sorted by document order then word.
    pub fn occurrences(&self) -> &[TokenOccurrence] {
        &self.occurrences
    }

    /// Number of occurrence rows.
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    /// Check whether the table has no occurrence rows.
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Sum of all counts.
    pub fn total_tokens(&self) -> u64 {
        self.occurrences.iter().map(|o| o.count as u64).sum()
    }

    /// Number of distinct documents containing each word.
    pub fn document_frequencies(&self) -> BTreeMap<String, usize> {
        let mut frequencies: BTreeMap<String, usize> = BTreeMap::new();
        // One row per (document, word), so each row adds one document
        for occ in &self.occurrences {
            *frequencies.entry(occ.word.clone()).or_insert(0) += 1;
        }
        frequencies
    }

    /// Vocabulary with document frequencies, sorted by word.
    pub fn vocabulary(&self) -> Vec<VocabularyEntry> {
        self.document_frequencies()
            .into_iter()
            .map(|(word, n_documents)| VocabularyEntry { word, n_documents })
            .collect()
    }

    /// Ids of documents with at least one occurrence.
    pub fn documents_with_tokens(&self) -> HashSet<&str> {
        self.occurrences
            .iter()
            .map(|o| o.document_id.as_str())
            .collect()
    }

    /// Ids of documents with no occurrence, in corpus order.
    pub fn documents_without_tokens(&self) -> Vec<DocumentId> {
        let with_tokens = self.documents_with_tokens();
        self.documents
            .iter()
            .filter(|d| !with_tokens.contains(d.as_str()))
            .cloned()
            .collect()
    }

    /// New table keeping only occurrences whose word passes `keep`.
    ///
    /// The document list is carried over unchanged.
    pub fn retain_words<F>(&self, keep: F) -> TokenTable
    where
        F: Fn(&str) -> bool,
    {
        TokenTable {
            documents: self.documents.clone(),
            occurrences: self
                .occurrences
                .iter()
                .filter(|o| keep(&o.word))
                .cloned()
                .collect(),
        }
    }
}
