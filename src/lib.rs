//! Semantic search service for a thesis repository.
//!
//! The service keeps a vector index over thesis-abstract embeddings in
//! sync with an external thesis store, persists it across restarts as a
//! pair of co-located artifacts, and answers nearest-neighbor queries with
//! ranked results over HTTP and a CLI.
//!
//! Module map, leaves first:
//! - [`vector`]: dense vector index, exact L2 search, binary artifact
//! - [`catalog`]: thesis metadata records and their JSON artifact
//! - [`index`]: the composite (vectors, catalog) pair
//! - [`store`]: atomic paired persistence
//! - [`embedding`]: embedder port and fastembed implementation
//! - [`source`]: thesis store port and HTTP implementation
//! - [`engine`]: live-pair ownership, ingestion, query execution
//! - [`server`]: axum JSON API

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod io;
pub mod server;
pub mod source;
pub mod store;
pub mod vector;

// Explicit exports for better API clarity
pub use catalog::{Catalog, ThesisRecord};
pub use config::Settings;
pub use embedding::{Embedder, FastEmbedder};
pub use engine::{EngineStatus, IngestStats, RankedThesis, SearchEngine};
pub use error::{SearchError, SearchResult};
pub use index::SearchIndex;
pub use source::{HttpThesisSource, SourceThesis, ThesisSource};
pub use store::IndexStore;
pub use vector::{Distance, Slot, VectorDimension, VectorError, VectorIndex};
