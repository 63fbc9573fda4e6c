//! Document catalog: the ordered metadata table aligned with the vector
//! index, and its JSON artifact.
//!
//! The catalog artifact also records the embedding model identity and the
//! dimension, so a load can fail fast when the persisted index was built
//! by a different model than the one configured (mixing model versions
//! silently degrades relevance with no error signal otherwise).

use crate::error::{SearchError, SearchResult};
use crate::vector::Slot;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata for one indexed thesis.
///
/// The abstract text is consumed during embedding and never stored here;
/// any other fields the thesis store carries are dropped at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesisRecord {
    /// Stable identifier assigned by the thesis store.
    pub id: String,
    pub title: String,
    pub author: String,
}

/// Ordered sequence of thesis records, positionally aligned with the
/// vector index: the record at slot `i` describes the thesis whose
/// abstract produced vector `i`.
///
/// Positional lookup only; the query path never needs lookup by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    records: Vec<ThesisRecord>,
}

impl Catalog {
    #[must_use]
    pub fn new(records: Vec<ThesisRecord>) -> Self {
        Self { records }
    }

    /// Borrow the record at `slot`.
    ///
    /// An out-of-range slot means the alignment invariant with the vector
    /// index was violated somewhere, so this surfaces as an error rather
    /// than an Option.
    pub fn get(&self, slot: Slot) -> SearchResult<&ThesisRecord> {
        self.records
            .get(slot.as_index())
            .ok_or(SearchError::SlotOutOfRange {
                slot: slot.get(),
                len: self.records.len(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[ThesisRecord] {
        &self.records
    }
}

/// On-disk form of the catalog: the records plus the header fields that
/// pin the artifact to its sibling vector artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Version of the artifact format.
    pub version: u32,

    /// Name of the embedding model the index was built with.
    pub model_name: String,

    /// Dimension of the sibling vector artifact.
    pub dimension: usize,

    /// Number of records (must equal the vector artifact's count).
    pub count: usize,

    /// Unix timestamp when the pair was written.
    pub created_at: u64,

    pub records: Vec<ThesisRecord>,
}

impl CatalogFile {
    /// Current artifact format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Assembles the on-disk form for a catalog built with `model_name`
    /// at `dimension`.
    #[must_use]
    pub fn new(catalog: &Catalog, model_name: &str, dimension: usize) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            model_name: model_name.to_string(),
            dimension,
            count: catalog.len(),
            created_at: Utc::now().timestamp() as u64,
            records: catalog.records().to_vec(),
        }
    }

    /// Serializes to pretty JSON for the artifact writer.
    pub fn to_json(&self) -> SearchResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SearchError::Corrupt {
            reason: format!("failed to serialize catalog: {e}"),
        })
    }

    /// Parses and validates a catalog artifact.
    ///
    /// Internal inconsistency (unknown version, count not matching the
    /// record list) is `Corrupt`; cross-artifact checks against the
    /// vector file happen in the store.
    pub fn load(path: &Path) -> SearchResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| SearchError::Corrupt {
            reason: format!("failed to read catalog artifact: {e}"),
        })?;

        let file: Self = serde_json::from_str(&json).map_err(|e| SearchError::Corrupt {
            reason: format!("failed to parse catalog artifact: {e}"),
        })?;

        if file.version > Self::CURRENT_VERSION {
            return Err(SearchError::Corrupt {
                reason: format!(
                    "catalog version {} is newer than supported version {}",
                    file.version,
                    Self::CURRENT_VERSION
                ),
            });
        }

        if file.count != file.records.len() {
            return Err(SearchError::Corrupt {
                reason: format!(
                    "catalog header claims {} records but {} are present",
                    file.count,
                    file.records.len()
                ),
            });
        }

        Ok(file)
    }

    /// Consumes the file form, yielding the in-memory catalog.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        Catalog::new(self.records)
    }
}
