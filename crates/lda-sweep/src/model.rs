//! Fitted topic models.
//!
//! A fitted model for `k` topics over a matrix with `V` columns and `D` rows
//! holds two row-stochastic tables:
//! - `beta`: `k x V`, probability of each vocabulary word under each topic
//! - `gamma`: `D x k`, topic proportions of each document
//!
//! Topics are numbered from 1 in every exported table.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use lda_corpus::DocumentTermMatrix;
use lda_types::{DocumentTopicWeight, PipelineError, WordTopicWeight};

use crate::error::FitError;

/// Allowed deviation of a probability row sum from 1.
const STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// The most probable words of one topic, in descending weight order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTerms {
    /// 1-based topic number
    pub topic: usize,
    pub terms: Vec<String>,
}

/// Output of a topic-model fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    beta: Vec<Vec<f64>>,
    gamma: Vec<Vec<f64>>,
}

impl FittedModel {
    /// Create a model from its word-topic and document-topic tables.
    ///
    /// Shapes are not checked here; see [`FittedModel::validate`].
    pub fn new(beta: Vec<Vec<f64>>, gamma: Vec<Vec<f64>>) -> Self {
        Self { beta, gamma }
    }

    /// Number of topics.
    pub fn k(&self) -> usize {
        self.beta.len()
    }

    pub fn beta(&self) -> &[Vec<f64>] {
        &self.beta
    }

    pub fn gamma(&self) -> &[Vec<f64>] {
        &self.gamma
    }

    /// Word weights of a 0-based topic, indexed by matrix column.
    pub fn topic_weights(&self, topic: usize) -> Option<&[f64]> {
        self.beta.get(topic).map(Vec::as_slice)
    }

    /// Check the model against the matrix it was fitted on.
    ///
    /// Requires `k` beta rows of `n_cols` entries and `n_rows` gamma rows of
    /// `k` entries, every entry finite and non-negative, and every row
    /// summing to 1.
    pub fn validate(&self, dtm: &DocumentTermMatrix, k: usize) -> Result<(), FitError> {
        if self.beta.len() != k {
            return Err(FitError::InvalidModel(format!(
                "expected {} topics, beta has {} rows",
                k,
                self.beta.len()
            )));
        }
        for (topic, row) in self.beta.iter().enumerate() {
            check_distribution("beta", topic, row, dtm.n_cols())?;
        }

        if self.gamma.len() != dtm.n_rows() {
            return Err(FitError::InvalidModel(format!(
                "expected {} documents, gamma has {} rows",
                dtm.n_rows(),
                self.gamma.len()
            )));
        }
        for (row_index, row) in self.gamma.iter().enumerate() {
            check_distribution("gamma", row_index, row, k)?;
        }
        Ok(())
    }

    /// Top `n` terms of every topic.
    pub fn top_terms(&self, dtm: &DocumentTermMatrix, n: usize) -> Vec<TopicTerms> {
        self.beta
            .iter()
            .enumerate()
            .map(|(topic, weights)| {
                let pairs = dtm
                    .terms()
                    .iter()
                    .zip(weights.iter())
                    .map(|(word, &w)| (word.as_str(), w));
                TopicTerms {
                    topic: topic + 1,
                    terms: select_top_terms(pairs, n),
                }
            })
            .collect()
    }

    /// Per-topic word probabilities as `(topic, word, beta)` rows.
    pub fn word_topic_table(&self, dtm: &DocumentTermMatrix) -> Vec<WordTopicWeight> {
        let mut rows = Vec::with_capacity(self.k() * dtm.n_cols());
        for (topic, weights) in self.beta.iter().enumerate() {
            for (word, &beta) in dtm.terms().iter().zip(weights.iter()) {
                rows.push(WordTopicWeight {
                    topic: topic + 1,
                    word: word.clone(),
                    beta,
                });
            }
        }
        rows
    }

    /// Per-document topic proportions as `(document_id, topic, gamma)` rows.
    pub fn document_topic_table(&self, dtm: &DocumentTermMatrix) -> Vec<DocumentTopicWeight> {
        let mut rows = Vec::with_capacity(dtm.n_rows() * self.k());
        for (document_id, weights) in dtm.documents().iter().zip(self.gamma.iter()) {
            for (topic, &gamma) in weights.iter().enumerate() {
                rows.push(DocumentTopicWeight {
                    document_id: document_id.clone(),
                    topic: topic + 1,
                    gamma,
                });
            }
        }
        rows
    }

    /// 1-based topic with the largest proportion in a document row.
    ///
    /// Ties go to the lower topic number.
    pub fn dominant_topic(&self, row: usize) -> Option<usize> {
        let weights = self.gamma.get(row)?;
        weights
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (topic, &w)| match best {
                Some((_, bw)) if bw >= w => best,
                _ => Some((topic, w)),
            })
            .map(|(topic, _)| topic + 1)
    }
}

fn check_distribution(
    table: &str,
    index: usize,
    row: &[f64],
    expected_len: usize,
) -> Result<(), FitError> {
    if row.len() != expected_len {
        return Err(FitError::InvalidModel(format!(
            "{} row {} has {} entries, expected {}",
            table,
            index,
            row.len(),
            expected_len
        )));
    }
    if let Some(bad) = row.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(FitError::InvalidModel(format!(
            "{} row {} contains {}",
            table, index, bad
        )));
    }
    let sum: f64 = row.iter().sum();
    if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
        return Err(FitError::InvalidModel(format!(
            "{} row {} sums to {}",
            table, index, sum
        )));
    }
    Ok(())
}

/// Check a `(topic, word, beta)` table produced outside the sweep.
///
/// Requires 1-based topic numbers, one row per `(topic, word)`, finite
/// non-negative weights and per-topic weights summing to 1.
pub fn validate_word_topic_rows(rows: &[WordTopicWeight]) -> Result<(), PipelineError> {
    let mut seen: HashSet<(usize, &str)> = HashSet::with_capacity(rows.len());
    let mut sums: BTreeMap<usize, f64> = BTreeMap::new();

    for row in rows {
        if row.topic == 0 {
            return Err(PipelineError::SchemaMismatch(format!(
                "topic numbers start at 1, found 0 for '{}'",
                row.word
            )));
        }
        if !seen.insert((row.topic, row.word.as_str())) {
            return Err(PipelineError::SchemaMismatch(format!(
                "word '{}' listed twice for topic {}",
                row.word, row.topic
            )));
        }
        if !row.beta.is_finite() || row.beta < 0.0 {
            return Err(PipelineError::SchemaMismatch(format!(
                "topic {} has beta {} for '{}'",
                row.topic, row.beta, row.word
            )));
        }
        *sums.entry(row.topic).or_insert(0.0) += row.beta;
    }

    if let Some((topic, sum)) = sums
        .iter()
        .find(|(_, sum)| (**sum - 1.0).abs() > STOCHASTIC_TOLERANCE)
    {
        return Err(PipelineError::SchemaMismatch(format!(
            "topic {} weights sum to {}",
            topic, sum
        )));
    }
    Ok(())
}

/// Pick the `n` highest-weighted words.
///
/// Ties are broken by word in lexical order so the selection does not depend
/// on input order. Non-finite weights are ignored.
pub fn select_top_terms<'a, I>(weights: I, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut ranked: Vec<(&str, f64)> = weights.into_iter().filter(|(_, w)| w.is_finite()).collect();
    ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(b.0),
        other => other,
    });
    ranked
        .into_iter()
        .take(n)
        .map(|(word, _)| word.to_string())
        .collect()
}
