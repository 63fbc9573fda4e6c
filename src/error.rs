//! Error types for the semantic search service
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for search service operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query validation errors
    #[error("Query text is empty. Provide a non-empty search phrase.")]
    EmptyQuery,

    /// Index lifecycle errors
    #[error(
        "No index is loaded yet. Ingestion has not completed (or failed); retry once indexing finishes."
    )]
    IndexNotReady,

    #[error("No documents with abstract text were found in the thesis store; nothing to index.")]
    EmptySource,

    #[error("A rebuild is already in flight. Wait for it to finish before starting another.")]
    RebuildInProgress,

    /// External collaborator errors
    #[error("Thesis store unreachable: {reason}\nSuggestion: Check the source base URL and that the backend is running")]
    SourceUnavailable { reason: String },

    #[error("Embedding model failure: {reason}\nSuggestion: Verify the model is downloaded and the cache directory is writable")]
    EmbedderUnavailable { reason: String },

    /// Persistence errors
    #[error("No persisted index at '{path}'")]
    NotFound { path: PathBuf },

    #[error("Persisted index is corrupt: {reason}\nSuggestion: Re-run ingestion to rebuild the index from the thesis store")]
    Corrupt { reason: String },

    #[error(
        "Index was built with embedding model '{actual}' but '{expected}' is configured.\nSuggestion: Re-run ingestion with the configured model"
    )]
    ModelMismatch { expected: String, actual: String },

    #[error("Failed to persist index artifact '{path}': {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Internal invariant violation: the catalog and vector index must
    /// always have the same length.
    #[error("Slot {slot} is out of range for a catalog of {len} records")]
    SlotOutOfRange { slot: u32, len: usize },

    /// Vector-level errors (dimension mismatches, artifact format)
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl SearchError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "EMPTY_QUERY",
            Self::IndexNotReady => "INDEX_NOT_READY",
            Self::EmptySource => "EMPTY_SOURCE",
            Self::RebuildInProgress => "REBUILD_IN_PROGRESS",
            Self::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            Self::EmbedderUnavailable { .. } => "EMBEDDER_UNAVAILABLE",
            Self::NotFound { .. } => "INDEX_NOT_FOUND",
            Self::Corrupt { .. } => "INDEX_CORRUPT",
            Self::ModelMismatch { .. } => "MODEL_MISMATCH",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::SlotOutOfRange { .. } => "SLOT_OUT_OF_RANGE",
            Self::Vector(_) => "VECTOR_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexNotReady | Self::NotFound { .. } => vec![
                "Run 'thesis-search index' to build the index",
                "If the service just started, ingestion may still be running",
            ],
            Self::Corrupt { .. } | Self::ModelMismatch { .. } => vec![
                "Run 'thesis-search index' to rebuild from the thesis store",
                "Check for disk errors if corruption recurs",
            ],
            Self::SourceUnavailable { .. } => vec![
                "Check that the thesis backend is running and reachable",
                "Verify source.base_url in .thesis-search/settings.toml",
            ],
            Self::EmbedderUnavailable { .. } => vec![
                "First use downloads the embedding model; check network access",
                "Check free space in the model cache directory",
            ],
            Self::Persistence { .. } => vec![
                "Check disk space and permissions for the index directory",
                "The previous on-disk index (if any) is still intact",
            ],
            Self::RebuildInProgress => {
                vec!["Wait for the current rebuild to finish, then retry"]
            }
            _ => vec![],
        }
    }

    /// Whether this error is an expected condition rather than a fault.
    ///
    /// `NotFound` is the normal first-run signal: it triggers ingestion
    /// instead of being reported to the operator as a failure.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for search service operations
pub type SearchResult<T> = Result<T, SearchError>;
