//! Sparse document-term matrix.
//!
//! Rows are the documents of the corpus in their original order, columns the
//! surviving words in lexical order. Non-zero cells are stored twice, as a
//! row-major (CSR) index for row iteration and a column-major (CSC) index
//! for document-frequency queries. The dense form is never materialised.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, instrument};

use lda_types::{DocumentId, TokenOccurrence};

use crate::table::TokenTable;

/// A non-zero cell of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub count: u32,
}

/// Compressed sparse document-term count matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTermMatrix {
    documents: Vec<DocumentId>,
    terms: Vec<String>,
    row_lookup: HashMap<DocumentId, usize>,
    col_lookup: HashMap<String, usize>,
    /// CSR: cells of row `r` are `row_offsets[r]..row_offsets[r + 1]`
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<u32>,
    /// CSC: rows containing column `c` are `col_offsets[c]..col_offsets[c + 1]`
    col_offsets: Vec<usize>,
    row_indices: Vec<usize>,
}

impl DocumentTermMatrix {
    /// Build the matrix from a (filtered) token table.
    ///
    /// Every document of the table gets a row, including documents without
    /// any occurrence, which become all-zero rows.
    #[instrument(skip_all, fields(documents = table.document_count(), occurrences = table.len()))]
    pub fn from_table(table: &TokenTable) -> Self {
        let documents: Vec<DocumentId> = table.documents().to_vec();
        let terms: Vec<String> = table
            .occurrences()
            .iter()
            .map(|o| o.word.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let row_lookup: HashMap<DocumentId, usize> = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.clone(), i))
            .collect();
        let col_lookup: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let mut rows: Vec<Vec<(usize, u32)>> = vec![Vec::new(); documents.len()];
        for occ in table.occurrences() {
            // TokenTable guarantees both lookups succeed
            if let (Some(&r), Some(&c)) = (
                row_lookup.get(&occ.document_id),
                col_lookup.get(&occ.word),
            ) {
                rows[r].push((c, occ.count));
            }
        }

        let nnz = table.len();
        let mut row_offsets = Vec::with_capacity(documents.len() + 1);
        let mut col_indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        let mut col_counts = vec![0usize; terms.len()];
        row_offsets.push(0);
        for mut row in rows {
            row.sort_unstable_by_key(|(c, _)| *c);
            for (c, count) in row {
                col_indices.push(c);
                values.push(count);
                col_counts[c] += 1;
            }
            row_offsets.push(col_indices.len());
        }

        let mut col_offsets = Vec::with_capacity(terms.len() + 1);
        col_offsets.push(0);
        for count in &col_counts {
            let last = *col_offsets.last().unwrap_or(&0);
            col_offsets.push(last + count);
        }
        let mut next = col_offsets.clone();
        let mut row_indices = vec![0usize; col_indices.len()];
        for r in 0..documents.len() {
            for &c in &col_indices[row_offsets[r]..row_offsets[r + 1]] {
                row_indices[next[c]] = r;
                next[c] += 1;
            }
        }

        let matrix = Self {
            documents,
            terms,
            row_lookup,
            col_lookup,
            row_offsets,
            col_indices,
            values,
            col_offsets,
            row_indices,
        };
        info!(
            rows = matrix.n_rows(),
            cols = matrix.n_cols(),
            nnz = matrix.nnz(),
            sparsity = matrix.sparsity(),
            "Built document-term matrix"
        );
        matrix
    }

    /// Number of rows (documents).
    pub fn n_rows(&self) -> usize {
        self.documents.len()
    }

    /// Number of columns (terms).
    pub fn n_cols(&self) -> usize {
        self.terms.len()
    }

    /// Number of non-zero cells.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of non-zero cells; 0.0 for a matrix without cells.
    pub fn density(&self) -> f64 {
        let cells = self.n_rows() * self.n_cols();
        if cells == 0 {
            return 0.0;
        }
        self.nnz() as f64 / cells as f64
    }

    /// Fraction of zero cells. Real corpora sit around 0.94.
    pub fn sparsity(&self) -> f64 {
        if self.n_rows() * self.n_cols() == 0 {
            return 1.0;
        }
        1.0 - self.density()
    }

    /// Documents in row order.
    pub fn documents(&self) -> &[DocumentId] {
        &self.documents
    }

    /// Terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Document id of a row.
    pub fn document_id(&self, row: usize) -> Option<&str> {
        self.documents.get(row).map(String::as_str)
    }

    /// Row of a document id.
    pub fn row_of(&self, document_id: &str) -> Option<usize> {
        self.row_lookup.get(document_id).copied()
    }

    /// Word of a column.
    pub fn term(&self, col: usize) -> Option<&str> {
        self.terms.get(col).map(String::as_str)
    }

    /// Column of a word.
    pub fn column_of(&self, word: &str) -> Option<usize> {
        self.col_lookup.get(word).copied()
    }

    /// Count at `(row, col)`, 0 when absent or out of range.
    pub fn get(&self, row: usize, col: usize) -> u32 {
        if row >= self.n_rows() {
            return 0;
        }
        let span = self.row_offsets[row]..self.row_offsets[row + 1];
        match self.col_indices[span.clone()].binary_search(&col) {
            Ok(pos) => self.values[span.start + pos],
            Err(_) => 0,
        }
    }

    /// Non-zero cells of one row, by ascending column.
    pub fn row(&self, row: usize) -> impl Iterator<Item = Cell> + '_ {
        let span = if row < self.n_rows() {
            self.row_offsets[row]..self.row_offsets[row + 1]
        } else {
            0..0
        };
        span.map(move |i| Cell {
            row,
            col: self.col_indices[i],
            count: self.values[i],
        })
    }

    /// Sum of counts in one row.
    pub fn row_total(&self, row: usize) -> u64 {
        self.row(row).map(|c| c.count as u64).sum()
    }

    /// All non-zero cells, row-major.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.n_rows()).flat_map(move |r| self.row(r))
    }

    /// Rows with a non-zero cell in `col`, ascending.
    pub fn column_rows(&self, col: usize) -> &[usize] {
        if col >= self.n_cols() {
            return &[];
        }
        &self.row_indices[self.col_offsets[col]..self.col_offsets[col + 1]]
    }

    /// Number of documents containing the term of `col`.
    pub fn document_frequency(&self, col: usize) -> usize {
        self.column_rows(col).len()
    }

    /// Number of documents containing both terms.
    pub fn co_document_frequency(&self, a: usize, b: usize) -> usize {
        let (xs, ys) = (self.column_rows(a), self.column_rows(b));
        let (mut i, mut j, mut shared) = (0, 0, 0);
        while i < xs.len() && j < ys.len() {
            match xs[i].cmp(&ys[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    /// Rows without any non-zero cell.
    pub fn empty_rows(&self) -> Vec<usize> {
        (0..self.n_rows())
            .filter(|&r| self.row_offsets[r] == self.row_offsets[r + 1])
            .collect()
    }

    /// Non-zero cells as tidy `(document_id, word, count)` triples.
    pub fn to_occurrences(&self) -> Vec<TokenOccurrence> {
        self.iter_nonzero()
            .map(|cell| TokenOccurrence {
                document_id: self.documents[cell.row].clone(),
                word: self.terms[cell.col].clone(),
                count: cell.count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::{count_tokens, Tokenizer};
    use lda_types::Document;

    fn matrix(docs: &[(&str, &str)]) -> DocumentTermMatrix {
        let docs: Vec<Document> = docs.iter().map(|(id, t)| Document::new(*id, *t)).collect();
        let table = count_tokens(&docs, &Tokenizer::new(Vec::<&str>::new())).unwrap();
        DocumentTermMatrix::from_table(&table)
    }

    #[test]
    fn test_shape_and_identities() {
        let m = matrix(&[("d2", "fish water"), ("d1", "fish fish farm"), ("d3", "")]);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 3);
        assert_eq!(m.terms(), &["farm", "fish", "water"]);
        assert_eq!(m.document_id(0), Some("d2"));
        assert_eq!(m.row_of("d1"), Some(1));
        assert_eq!(m.column_of("water"), Some(2));
        assert_eq!(m.term(5), None);
    }

    #[test]
    fn test_cells() {
        let m = matrix(&[("d2", "fish water"), ("d1", "fish fish farm"), ("d3", "")]);
        let fish = m.column_of("fish").unwrap();
        assert_eq!(m.get(1, fish), 2);
        assert_eq!(m.get(0, m.column_of("farm").unwrap()), 0);
        assert_eq!(m.get(2, fish), 0);
        assert_eq!(m.get(99, fish), 0);
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.row_total(1), 3);
    }

    #[test]
    fn test_iter_nonzero_row_major() {
        let m = matrix(&[("a", "y x"), ("b", "x")]);
        let cells: Vec<Cell> = m.iter_nonzero().collect();
        assert_eq!(
            cells,
            vec![
                Cell { row: 0, col: 0, count: 1 },
                Cell { row: 0, col: 1, count: 1 },
                Cell { row: 1, col: 0, count: 1 },
            ]
        );
    }

    #[test]
    fn test_document_frequencies() {
        let m = matrix(&[("a", "x y"), ("b", "x z"), ("c", "x y z")]);
        let (x, y, z) = (0, 1, 2);
        assert_eq!(m.document_frequency(x), 3);
        assert_eq!(m.column_rows(y), &[0, 2]);
        assert_eq!(m.co_document_frequency(y, z), 1);
        assert_eq!(m.co_document_frequency(x, z), 2);
        assert_eq!(m.document_frequency(42), 0);
    }

    #[test]
    fn test_empty_rows_kept() {
        let m = matrix(&[("a", "x"), ("b", ""), ("c", "x")]);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.empty_rows(), vec![1]);
        assert_eq!(m.row(1).count(), 0);
    }

    #[test]
    fn test_zero_columns() {
        let m = matrix(&[("a", ""), ("b", ""), ("c", "")]);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 0);
        assert_eq!(m.nnz(), 0);
        assert!((m.density() - 0.0).abs() < f64::EPSILON);
        assert!((m.sparsity() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_density() {
        let m = matrix(&[("a", "x"), ("b", "y")]);
        assert!((m.density() - 0.5).abs() < f64::EPSILON);
        assert!((m.sparsity() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_occurrences_matches_table() {
        let docs = vec![Document::new("a", "x y y"), Document::new("b", "z")];
        let table = count_tokens(&docs, &Tokenizer::new(Vec::<&str>::new())).unwrap();
        let m = DocumentTermMatrix::from_table(&table);
        assert_eq!(m.to_occurrences(), table.occurrences().to_vec());
    }
}
