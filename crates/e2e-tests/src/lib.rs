//! End-to-end test infrastructure for lda-notebook.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full ingest-to-coherence pipeline.

use std::io::Write;
use std::path::PathBuf;

use lda_types::{Document, Settings};

/// Shared test harness for E2E tests.
///
/// Owns a temp directory with a corpus CSV and an output directory.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Corpus CSV written by [`TestHarness::write_corpus`]
    pub corpus_path: PathBuf,
    pub output_dir: PathBuf,
}

impl TestHarness {
    /// Create a harness holding [`sample_documents`].
    pub fn new() -> Self {
        Self::with_documents(&sample_documents())
    }

    /// Create a harness holding the given documents.
    pub fn with_documents(documents: &[Document]) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let corpus_path = temp_dir.path().join("records.csv");
        let output_dir = temp_dir.path().join("out");

        let harness = Self {
            _temp_dir: temp_dir,
            corpus_path,
            output_dir,
        };
        harness.write_corpus(documents);
        harness
    }

    /// Overwrite the corpus CSV.
    pub fn write_corpus(&self, documents: &[Document]) {
        let mut file = std::fs::File::create(&self.corpus_path).expect("Failed to create corpus");
        writeln!(file, "document_id,full_text").expect("Failed to write header");
        for doc in documents {
            let text = doc.full_text.replace('"', "\"\"");
            writeln!(file, "{},\"{}\"", doc.document_id, text).expect("Failed to write row");
        }
    }

    /// Default settings pointed at the harness files.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.input.path = Some(self.corpus_path.to_string_lossy().to_string());
        settings.output_dir = self.output_dir.to_string_lossy().to_string();
        settings
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Twelve short abstracts on salmon farming, kelp reefs and fisheries
/// policy, plus one publisher notice and one empty record.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new("WOS:001", "Salmon farms release nutrients that alter coastal water quality."),
        Document::new("WOS:002", "Sea lice spread from salmon farms to wild salmon populations."),
        Document::new("WOS:003", "Open net pens for salmon farming raise water quality concerns."),
        Document::new("WOS:004", "Kelp forests provide habitat for juvenile reef fish."),
        Document::new("WOS:005", "Urchin grazing removes kelp and reduces reef habitat."),
        Document::new("WOS:006", "Kelp restoration restores reef fish habitat along rocky coasts."),
        Document::new("WOS:007", "Fisheries policy sets catch quotas for coastal communities."),
        Document::new("WOS:008", "Quota trading changes fisheries policy outcomes for communities."),
        Document::new("WOS:009", "Coastal communities depend on fisheries and salmon farming jobs."),
        Document::new("WOS:010", "Sea lice treatments in net pens affect wild fish near farms."),
        Document::new("WOS:011", "(c) 2019 Elsevier Ltd. All rights reserved."),
        Document::new("WOS:012", ""),
    ]
}

/// Words expected in the matrix built from [`sample_documents`] with
/// default settings, in column order.
pub fn sample_vocabulary() -> Vec<&'static str> {
    vec![
        "coastal",
        "communities",
        "farming",
        "farms",
        "fish",
        "fisheries",
        "habitat",
        "kelp",
        "lice",
        "net",
        "pens",
        "policy",
        "quality",
        "reef",
        "salmon",
        "sea",
        "water",
        "wild",
    ]
}
