//! The composite search index: vectors and catalog as one entity.
//!
//! Keeping the two collections behind a single constructor makes the
//! alignment invariant (slot `i` in the vector index is slot `i` in the
//! catalog) structural instead of a documentation-only contract. Callers
//! never get their hands on the collections separately while building.

use crate::catalog::{Catalog, ThesisRecord};
use crate::error::{SearchError, SearchResult};
use crate::vector::VectorIndex;

/// One immutable (vector index, catalog) pair.
///
/// Created by ingestion or loaded from disk, then read-only for its whole
/// lifetime; a rebuild produces a brand-new pair and swaps it in.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    vectors: VectorIndex,
    catalog: Catalog,
}

impl SearchIndex {
    /// Pairs a vector index with its catalog.
    ///
    /// Fails with `Corrupt` when the lengths disagree; the two halves
    /// can only legitimately come from the same ingestion run.
    pub fn new(vectors: VectorIndex, catalog: Catalog) -> SearchResult<Self> {
        if vectors.len() != catalog.len() {
            return Err(SearchError::Corrupt {
                reason: format!(
                    "vector index holds {} vectors but catalog holds {} records",
                    vectors.len(),
                    catalog.len()
                ),
            });
        }
        Ok(Self { vectors, catalog })
    }

    /// Builds the pair from rows that keep each thesis's vector and record
    /// together, so the two halves cannot drift during construction.
    pub fn from_rows(rows: Vec<(Vec<f32>, ThesisRecord)>) -> SearchResult<Self> {
        let mut vectors = Vec::with_capacity(rows.len());
        let mut records = Vec::with_capacity(rows.len());
        for (vector, record) in rows {
            vectors.push(vector);
            records.push(record);
        }

        let vectors = VectorIndex::build(vectors)?;
        Self::new(vectors, Catalog::new(records))
    }

    #[must_use]
    pub fn vectors(&self) -> &VectorIndex {
        &self.vectors
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of indexed theses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Slot;

    fn record(id: &str) -> ThesisRecord {
        ThesisRecord {
            id: id.to_string(),
            title: format!("Title {id}"),
            author: "Author".to_string(),
        }
    }

    #[test]
    fn test_from_rows_keeps_alignment() {
        let index = SearchIndex::from_rows(vec![
            (vec![1.0, 0.0], record("1")),
            (vec![0.0, 1.0], record("2")),
        ])
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.catalog().get(Slot::new(0)).unwrap().id, "1");
        assert_eq!(index.vectors().row(Slot::new(1)).unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let vectors = VectorIndex::build(vec![vec![1.0, 0.0]]).unwrap();
        let catalog = Catalog::new(vec![record("1"), record("2")]);

        let err = SearchIndex::new(vectors, catalog).unwrap_err();
        assert!(matches!(err, SearchError::Corrupt { .. }));
    }

    #[test]
    fn test_empty_pair_is_valid() {
        let index = SearchIndex::from_rows(Vec::new()).unwrap();
        assert!(index.is_empty());
    }
}
