//! Document and table row types.
//!
//! Every stage of the pipeline consumes and produces plain rows of these
//! types. None of them are mutated after construction.

use serde::{Deserialize, Serialize};

/// Opaque document identifier (external record ID).
pub type DocumentId = String;

/// A bibliographic record to be modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier of the record
    pub document_id: DocumentId,
    /// Full text (title, abstract, keywords...); may be empty
    pub full_text: String,
}

impl Document {
    /// Create a new document.
    pub fn new(document_id: impl Into<DocumentId>, full_text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            full_text: full_text.into(),
        }
    }

    /// Check whether the document carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}

/// Count of one normalized word in one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenOccurrence {
    /// Document the word occurs in
    pub document_id: DocumentId,
    /// Normalized (lower-cased, punctuation-stripped) word
    pub word: String,
    /// Number of occurrences, always >= 1
    pub count: u32,
}

impl TokenOccurrence {
    /// Create a new token occurrence.
    pub fn new(document_id: impl Into<DocumentId>, word: impl Into<String>, count: u32) -> Self {
        Self {
            document_id: document_id.into(),
            word: word.into(),
            count,
        }
    }
}

/// A vocabulary word with its document frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub word: String,
    /// Number of distinct documents containing the word
    pub n_documents: usize,
}

/// Row of a word-topic table (`beta`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTopicWeight {
    /// Topic index, starting at 1 as in the exported tables
    pub topic: usize,
    pub word: String,
    /// Probability of the word under the topic
    pub beta: f64,
}

/// Row of a document-topic table (`gamma`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTopicWeight {
    pub document_id: DocumentId,
    /// Topic index, starting at 1 as in the exported tables
    pub topic: usize,
    /// Share of the document attributed to the topic
    pub gamma: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_new() {
        let doc = Document::new("WOS:0001", "Fish farming");
        assert_eq!(doc.document_id, "WOS:0001");
        assert_eq!(doc.full_text, "Fish farming");
        assert!(!doc.is_blank());
    }

    #[test]
    fn test_document_blank() {
        assert!(Document::new("a", "").is_blank());
        assert!(Document::new("b", "  \t\n ").is_blank());
    }

    #[test]
    fn test_occurrence_serialization() {
        let occ = TokenOccurrence::new("d1", "salmon", 3);
        let json = serde_json::to_string(&occ).unwrap();
        let decoded: TokenOccurrence = serde_json::from_str(&json).unwrap();
        assert_eq!(occ, decoded);
    }
}
