//! Durable persistence of the (vector index, catalog) pair.
//!
//! The two artifacts live side by side in the index directory:
//!
//! - `theses.vec`: binary vector artifact (see [`crate::vector::storage`])
//! - `catalog.json`: catalog records plus model identity
//!
//! Writes go to temp files in the same directory and are renamed into
//! place only after both are fully written, with the catalog renamed last
//! as the commit point. A failed or interrupted save leaves the previous
//! pair intact; the narrow crash window between the two renames is caught
//! at load time by the count/model cross-checks and classified as
//! `Corrupt`, for which re-running ingestion is the remedy.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::catalog::CatalogFile;
use crate::error::{SearchError, SearchResult};
use crate::index::SearchIndex;
use crate::vector::{VectorError, read_vector_artifact, write_vector_artifact};

/// File name of the binary vector artifact.
pub const VECTOR_ARTIFACT: &str = "theses.vec";

/// File name of the catalog artifact.
pub const CATALOG_ARTIFACT: &str = "catalog.json";

/// Reads and writes the persisted index pair under one directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn vector_path(&self) -> PathBuf {
        self.dir.join(VECTOR_ARTIFACT)
    }

    fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_ARTIFACT)
    }

    /// True when both artifacts are present on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.vector_path().exists() && self.catalog_path().exists()
    }

    /// Persists the pair atomically.
    ///
    /// On any failure the previous on-disk pair (if one exists) is left
    /// untouched; a half-written temp file is never observable at the
    /// artifact paths.
    pub fn save(&self, index: &SearchIndex, model_name: &str) -> SearchResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| SearchError::Persistence {
            path: self.dir.clone(),
            source: e,
        })?;

        let dimension = index.vectors().dimension().map_or(0, |d| d.get());
        let vector_bytes = write_vector_artifact(index.vectors());
        let catalog_json = CatalogFile::new(index.catalog(), model_name, dimension).to_json()?;

        // Stage both artifacts fully before renaming either.
        let vector_tmp = self.write_temp(vector_bytes.as_slice())?;
        let catalog_tmp = self.write_temp(catalog_json.as_bytes())?;

        vector_tmp
            .persist(self.vector_path())
            .map_err(|e| SearchError::Persistence {
                path: self.vector_path(),
                source: e.error,
            })?;
        catalog_tmp
            .persist(self.catalog_path())
            .map_err(|e| SearchError::Persistence {
                path: self.catalog_path(),
                source: e.error,
            })?;

        Ok(())
    }

    /// Loads the persisted pair, verifying it against the configured
    /// embedding model.
    ///
    /// - `NotFound` when either artifact is absent (the expected
    ///   first-run signal, not an operator-facing failure).
    /// - `Corrupt` for unreadable artifacts, a count mismatch between
    ///   the two, or a dimension disagreement.
    /// - `ModelMismatch` for a pair written by a different embedding model.
    pub fn load(&self, expected_model: &str) -> SearchResult<SearchIndex> {
        if !self.exists() {
            return Err(SearchError::NotFound {
                path: self.dir.clone(),
            });
        }

        let catalog_file = CatalogFile::load(&self.catalog_path())?;
        if catalog_file.model_name != expected_model {
            return Err(SearchError::ModelMismatch {
                expected: expected_model.to_string(),
                actual: catalog_file.model_name,
            });
        }

        let vectors = read_vector_artifact(&self.vector_path()).map_err(|e| match e {
            // The file exists, so any read failure means a damaged pair.
            VectorError::InvalidFormat(reason) => SearchError::Corrupt { reason },
            VectorError::VersionMismatch { expected, actual } => SearchError::Corrupt {
                reason: format!("vector artifact version {actual}, supported {expected}"),
            },
            other => SearchError::Corrupt {
                reason: format!("failed to read vector artifact: {other}"),
            },
        })?;

        if vectors.len() != catalog_file.count {
            return Err(SearchError::Corrupt {
                reason: format!(
                    "vector artifact holds {} vectors but catalog records {}",
                    vectors.len(),
                    catalog_file.count
                ),
            });
        }
        if let Some(dim) = vectors.dimension() {
            if dim.get() != catalog_file.dimension {
                return Err(SearchError::Corrupt {
                    reason: format!(
                        "vector artifact dimension {} but catalog records {}",
                        dim,
                        catalog_file.dimension
                    ),
                });
            }
        }

        SearchIndex::new(vectors, catalog_file.into_catalog())
    }

    fn write_temp(&self, bytes: &[u8]) -> SearchResult<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| SearchError::Persistence {
            path: self.dir.clone(),
            source: e,
        })?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.flush())
            .map_err(|e| SearchError::Persistence {
                path: tmp.path().to_path_buf(),
                source: e,
            })?;
        Ok(tmp)
    }
}
