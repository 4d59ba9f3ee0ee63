//! Document table ingest.
//!
//! Reads `(document_id, full_text)` records from a delimited file with a
//! header row. Column names and delimiter come from [`InputConfig`]; other
//! columns are ignored.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, instrument};

use lda_types::{Document, InputConfig, PipelineError};

/// Load documents from a delimited file.
///
/// # Errors
/// - `Io` if the file cannot be opened
/// - `SchemaMismatch` if a configured column is missing, or an id is empty
///   or repeated
/// - `EmptyInput` if the file holds no records
/// - `Table` for malformed rows
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_documents(
    path: impl AsRef<Path>,
    config: &InputConfig,
) -> Result<Vec<Document>, PipelineError> {
    let file = File::open(path.as_ref())?;
    read_documents(file, config)
}

/// Read documents from any reader. See [`load_documents`].
pub fn read_documents<R: Read>(
    reader: R,
    config: &InputConfig,
) -> Result<Vec<Document>, PipelineError> {
    config.validate()?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Table(e.to_string()))?
        .clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
    };

    let (id_idx, text_idx) = match (position(&config.id_column), position(&config.text_column)) {
        (Some(i), Some(t)) => (i, t),
        (id, text) => {
            let mut missing = Vec::new();
            if id.is_none() {
                missing.push(config.id_column.as_str());
            }
            if text.is_none() {
                missing.push(config.text_column.as_str());
            }
            return Err(PipelineError::SchemaMismatch(format!(
                "missing column(s) {:?}; found {:?}",
                missing,
                headers.iter().collect::<Vec<_>>()
            )));
        }
    };

    let mut documents = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| PipelineError::Table(e.to_string()))?;
        // Header is line 1
        let row_number = line + 2;

        let document_id = record.get(id_idx).unwrap_or_default().trim().to_string();
        if document_id.is_empty() {
            return Err(PipelineError::SchemaMismatch(format!(
                "empty {} on row {}",
                config.id_column, row_number
            )));
        }
        if !seen.insert(document_id.clone()) {
            return Err(PipelineError::SchemaMismatch(format!(
                "duplicate {} '{}' on row {}",
                config.id_column, document_id, row_number
            )));
        }

        let full_text = record.get(text_idx).unwrap_or_default().to_string();
        debug!(document_id = %document_id, chars = full_text.len(), "Read document");
        documents.push(Document {
            document_id,
            full_text,
        });
    }

    if documents.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    info!(documents = documents.len(), "Loaded documents");
    Ok(documents)
}
