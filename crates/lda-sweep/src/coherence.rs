//! Topic coherence scoring.
//!
//! Coherence measures how often the top words of a topic appear together in
//! the corpus. Higher is more coherent. The default [`UMassCoherence`]
//! scorer uses document co-occurrence counts from the document-term matrix
//! the model was fitted on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lda_corpus::DocumentTermMatrix;
use lda_types::{PipelineError, WordTopicWeight};

use crate::model::{select_top_terms, validate_word_topic_rows, TopicTerms};

/// Scores one topic from its ranked top words.
///
/// Implementations must be deterministic for a given matrix and word list.
pub trait CoherenceScorer: Send + Sync {
    /// Score a topic. `top_words` is ordered from most to least probable.
    fn score(&self, dtm: &DocumentTermMatrix, top_words: &[String]) -> f64;

    /// Name used in logs and reports.
    fn name(&self) -> &str {
        "coherence"
    }
}

/// UMass coherence.
///
/// For ranked words `w1..wM` the score is the sum over all pairs `i > j` of
/// `ln((D(wi, wj) + smoothing) / D(wj))`, where `D(w)` counts documents
/// containing `w` and `D(wi, wj)` documents containing both. Pairs with a
/// word outside the vocabulary or with `D(wj) = 0` are skipped. Fewer than
/// two words score 0.
#[derive(Debug, Clone)]
pub struct UMassCoherence {
    smoothing: f64,
}

impl UMassCoherence {
    pub fn new() -> Self {
        Self { smoothing: 1.0 }
    }

    /// Use a different additive smoothing constant.
    ///
    /// The constant must be finite and positive; otherwise a pair that never
    /// co-occurs would score `ln(0)` or worse.
    pub fn with_smoothing(mut self, smoothing: f64) -> Result<Self, PipelineError> {
        if !(smoothing.is_finite() && smoothing > 0.0) {
            return Err(PipelineError::Config(format!(
                "coherence smoothing must be a positive number, got {}",
                smoothing
            )));
        }
        self.smoothing = smoothing;
        Ok(self)
    }
}

impl Default for UMassCoherence {
    fn default() -> Self {
        Self::new()
    }
}

impl CoherenceScorer for UMassCoherence {
    fn score(&self, dtm: &DocumentTermMatrix, top_words: &[String]) -> f64 {
        let columns: Vec<Option<usize>> = top_words.iter().map(|w| dtm.column_of(w)).collect();

        let mut total = 0.0;
        for (i, wi) in columns.iter().enumerate().skip(1) {
            let Some(wi) = *wi else { continue };
            for wj in columns[..i].iter() {
                let Some(wj) = *wj else { continue };
                let d_j = dtm.document_frequency(wj);
                if d_j == 0 {
                    continue;
                }
                let joint = dtm.co_document_frequency(wi, wj) as f64;
                total += ((joint + self.smoothing) / d_j as f64).ln();
            }
        }
        total
    }

    fn name(&self) -> &str {
        "umass"
    }
}

/// Coherence of one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCoherence {
    /// 1-based topic number
    pub topic: usize,
    pub coherence: f64,
    /// Top words the score was computed from
    pub terms: Vec<String>,
}

/// Score each topic's top terms.
pub fn score_topics(
    dtm: &DocumentTermMatrix,
    scorer: &dyn CoherenceScorer,
    topics: &[TopicTerms],
) -> Vec<TopicCoherence> {
    topics
        .iter()
        .map(|t| TopicCoherence {
            topic: t.topic,
            coherence: scorer.score(dtm, &t.terms),
            terms: t.terms.clone(),
        })
        .collect()
}

/// Score topics given as a `(topic, word, beta)` table.
///
/// Rows are grouped by topic; each topic's top `n` words are selected with
/// the same tie-breaking as a fitted model. Output is ordered by topic.
///
/// # Errors
/// `SchemaMismatch` if the rows are not a valid topic table, or if a
/// selected top word is not a column of `dtm`. Such a topic cannot be
/// scored against this corpus.
pub fn score_word_topic_table(
    dtm: &DocumentTermMatrix,
    scorer: &dyn CoherenceScorer,
    rows: &[WordTopicWeight],
    n: usize,
) -> Result<Vec<TopicCoherence>, PipelineError> {
    validate_word_topic_rows(rows)?;

    let mut by_topic: BTreeMap<usize, Vec<(&str, f64)>> = BTreeMap::new();
    for row in rows {
        by_topic
            .entry(row.topic)
            .or_default()
            .push((row.word.as_str(), row.beta));
    }

    let topics: Vec<TopicTerms> = by_topic
        .into_iter()
        .map(|(topic, weights)| TopicTerms {
            topic,
            terms: select_top_terms(weights, n),
        })
        .collect();

    for t in &topics {
        let unknown: Vec<&str> = t
            .terms
            .iter()
            .filter(|w| dtm.column_of(w).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(PipelineError::SchemaMismatch(format!(
                "topic {} top words {:?} are not in the corpus vocabulary",
                t.topic, unknown
            )));
        }
    }
    Ok(score_topics(dtm, scorer, &topics))
}
