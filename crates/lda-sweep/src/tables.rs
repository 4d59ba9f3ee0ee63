//! CSV export and import of sweep tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use lda_types::{PipelineError, WordTopicWeight};

use crate::coherence::TopicCoherence;
use crate::model::validate_word_topic_rows;

/// One top term of one topic for a given `k`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTermRow {
    pub k: usize,
    pub topic: usize,
    /// 1-based rank within the topic
    pub rank: usize,
    pub word: String,
}

/// Coherence of one topic for a given `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCoherenceRow {
    pub k: usize,
    pub topic: usize,
    pub coherence: f64,
    /// Top terms, space separated
    pub terms: String,
}

/// Flatten per-topic top terms into rows.
pub fn topic_term_rows(k: usize, topics: &[TopicCoherence]) -> Vec<TopicTermRow> {
    topics
        .iter()
        .flat_map(|t| {
            t.terms.iter().enumerate().map(move |(rank, word)| TopicTermRow {
                k,
                topic: t.topic,
                rank: rank + 1,
                word: word.clone(),
            })
        })
        .collect()
}

pub fn topic_coherence_rows(k: usize, topics: &[TopicCoherence]) -> Vec<TopicCoherenceRow> {
    topics
        .iter()
        .map(|t| TopicCoherenceRow {
            k,
            topic: t.topic,
            coherence: t.coherence,
            terms: t.terms.join(" "),
        })
        .collect()
}

/// Write rows as CSV with a header.
pub fn write_table<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), PipelineError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| PipelineError::Table(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows to a CSV file, replacing it if present.
pub fn write_table_file<T: Serialize>(
    path: impl AsRef<Path>,
    rows: &[T],
) -> Result<(), PipelineError> {
    let file = File::create(path.as_ref())?;
    write_table(file, rows)
}

/// Read a `(topic, word, beta)` table.
///
/// # Errors
/// - `SchemaMismatch` if a required column is missing, or the rows are not
///   a 1-based topic table of per-topic probability distributions
/// - `Table` for malformed rows
pub fn read_word_topic_table<R: Read>(reader: R) -> Result<Vec<WordTopicWeight>, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Table(e.to_string()))?
        .clone();
    let missing: Vec<&str> = ["topic", "word", "beta"]
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch(format!(
            "word-topic table is missing column(s) {:?}",
            missing
        )));
    }

    let rows = rdr
        .deserialize::<WordTopicWeight>()
        .map(|row| row.map_err(|e| PipelineError::Table(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    validate_word_topic_rows(&rows)?;
    Ok(rows)
}

pub fn read_word_topic_file(path: impl AsRef<Path>) -> Result<Vec<WordTopicWeight>, PipelineError> {
    let file = File::open(path.as_ref())?;
    read_word_topic_table(file)
}
