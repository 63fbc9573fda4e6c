//! The search engine: owns the live (vector index, catalog) pair and
//! orchestrates ingestion and query execution.
//!
//! Concurrency discipline: queries are read-only and run against an
//! `Arc` snapshot of the live pair, so any number may run at once. The
//! only mutation is a rebuild, which constructs a brand-new pair off to
//! the side, persists it, and then swaps the live reference. The write
//! lock is held only for the pointer swap, never across an external call.
//! At most one rebuild runs at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::embedding::Embedder;
use crate::error::{SearchError, SearchResult};
use crate::index::SearchIndex;
use crate::source::ThesisSource;
use crate::store::IndexStore;

/// One ranked query result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedThesis {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Raw Euclidean distance between the query and this thesis's
    /// abstract embedding. **Lower is more relevant**: this is a
    /// distance, not a similarity, despite the generic field name kept
    /// for API compatibility with the frontend.
    pub relevance_score: f32,
}

/// Summary of one completed ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    /// Theses fetched with a non-empty abstract and indexed.
    pub documents: usize,
    /// Embedding dimension of the built index.
    pub dimension: usize,
}

/// Index state reported by `/status` and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub ready: bool,
    pub model_name: String,
    pub dimension: usize,
    pub documents: Option<usize>,
}

/// Process-wide search context: embedder, thesis source, store, and the
/// atomically swappable live pair.
pub struct SearchEngine {
    embedder: Arc<dyn Embedder>,
    source: Arc<dyn ThesisSource>,
    store: IndexStore,
    live: RwLock<Option<Arc<SearchIndex>>>,
    rebuild_in_flight: AtomicBool,
    default_limit: usize,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("model_name", &self.embedder.model_name())
            .field("store", &self.store)
            .field("documents", &self.live.read().as_ref().map(|i| i.len()))
            .finish()
    }
}

impl SearchEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        source: Arc<dyn ThesisSource>,
        store: IndexStore,
        default_limit: usize,
    ) -> Self {
        Self {
            embedder,
            source,
            store,
            live: RwLock::new(None),
            rebuild_in_flight: AtomicBool::new(false),
            default_limit,
        }
    }

    /// Install the persisted pair as the live pair, if one exists.
    ///
    /// Returns `Ok(true)` when a pair was loaded, `Ok(false)` on the
    /// expected first-run `NotFound`. `Corrupt` and `ModelMismatch`
    /// propagate: they need an operator decision (re-ingest), not a
    /// silent fallback.
    pub fn load_persisted(&self) -> SearchResult<bool> {
        match self.store.load(self.embedder.model_name()) {
            Ok(index) => {
                let count = index.len();
                self.install(index);
                info!(documents = count, "loaded persisted index");
                Ok(true)
            }
            Err(e) if e.is_expected() => {
                debug!("no persisted index found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Startup lifecycle: load the persisted pair, or run ingestion when
    /// there is none yet.
    pub async fn load_or_ingest(&self) -> SearchResult<()> {
        if self.load_persisted()? {
            return Ok(());
        }
        info!("no persisted index, running initial ingestion");
        self.rebuild().await.map(|_| ())
    }

    /// Rebuild the index from the thesis store.
    ///
    /// Fetches the corpus, embeds every abstract in fetch order, builds
    /// the new pair, persists it, and only then swaps it in. A failure at
    /// any step leaves the previous live pair (if any) serving queries
    /// unchanged.
    pub async fn rebuild(&self) -> SearchResult<IngestStats> {
        let _guard = RebuildGuard::acquire(&self.rebuild_in_flight)?;

        let theses = self.source.fetch_all().await?;
        if theses.is_empty() {
            warn!("thesis store returned no documents with abstract text");
            return Err(SearchError::EmptySource);
        }
        info!(documents = theses.len(), "fetched theses for ingestion");

        let texts: Vec<&str> = theses.iter().map(|t| t.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != theses.len() {
            return Err(SearchError::EmbedderUnavailable {
                reason: format!(
                    "model returned {} embeddings for {} documents",
                    embeddings.len(),
                    theses.len()
                ),
            });
        }

        let rows = embeddings
            .into_iter()
            .zip(theses.iter())
            .map(|(vector, thesis)| (vector, thesis.to_record()))
            .collect();
        let index = SearchIndex::from_rows(rows)?;

        let dimension = index
            .vectors()
            .dimension()
            .map_or(0, |d| d.get());
        let stats = IngestStats {
            documents: index.len(),
            dimension,
        };

        self.store.save(&index, self.embedder.model_name())?;
        self.install(index);
        info!(
            documents = stats.documents,
            dimension = stats.dimension,
            "ingestion complete, new index live"
        );

        Ok(stats)
    }

    /// Answer a semantic query against the live pair.
    ///
    /// Results are ordered by ascending distance; see
    /// [`RankedThesis::relevance_score`] for the lower-is-better caveat.
    pub fn query(&self, text: &str, limit: Option<usize>) -> SearchResult<Vec<RankedThesis>> {
        // Reject before touching the embedder: an empty query is a caller
        // mistake, not a reason to spend an inference.
        if text.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let index = self.live().ok_or(SearchError::IndexNotReady)?;
        let limit = limit.unwrap_or(self.default_limit).max(1);

        let query_vector = self.embedder.embed(text)?;
        let nearest = index.vectors().search(&query_vector, limit)?;
        debug!(results = nearest.len(), "query executed");

        nearest
            .into_iter()
            .map(|(slot, distance)| {
                let record = index.catalog().get(slot)?;
                Ok(RankedThesis {
                    id: record.id.clone(),
                    title: record.title.clone(),
                    author: record.author.clone(),
                    relevance_score: distance.get(),
                })
            })
            .collect()
    }

    /// Current index state for `/status` and the CLI.
    pub fn status(&self) -> EngineStatus {
        let live = self.live();
        EngineStatus {
            ready: live.is_some(),
            model_name: self.embedder.model_name().to_string(),
            dimension: self.embedder.dimension().get(),
            documents: live.map(|i| i.len()),
        }
    }

    /// Snapshot of the live pair. Cheap: clones the `Arc`, not the data.
    fn live(&self) -> Option<Arc<SearchIndex>> {
        self.live.read().clone()
    }

    fn install(&self, index: SearchIndex) {
        *self.live.write() = Some(Arc::new(index));
    }
}

/// RAII single-flight guard for rebuilds.
///
/// Uses a compare-exchange rather than a mutex so the flag can be held
/// across the await points of fetching and embedding.
struct RebuildGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RebuildGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SearchResult<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SearchError::RebuildInProgress);
        }
        Ok(Self { flag })
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::source::SourceThesis;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StaticSource {
        theses: Vec<SourceThesis>,
    }

    #[async_trait]
    impl ThesisSource for StaticSource {
        async fn fetch_all(&self) -> SearchResult<Vec<SourceThesis>> {
            Ok(self.theses.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ThesisSource for FailingSource {
        async fn fetch_all(&self) -> SearchResult<Vec<SourceThesis>> {
            Err(SearchError::SourceUnavailable {
                reason: "connection refused".to_string(),
            })
        }
    }

    fn thesis(id: &str, title: &str, text: &str) -> SourceThesis {
        SourceThesis {
            id: id.to_string(),
            title: title.to_string(),
            author: format!("Author {id}"),
            text: text.to_string(),
        }
    }

    fn engine_with(
        temp_dir: &TempDir,
        theses: Vec<SourceThesis>,
    ) -> SearchEngine {
        SearchEngine::new(
            Arc::new(MockEmbedder::new(vec![
                "cat", "dog", "pet", "animal", "stock", "market",
            ])),
            Arc::new(StaticSource { theses }),
            IndexStore::new(temp_dir.path().join("index")),
            5,
        )
    }

    fn corpus() -> Vec<SourceThesis> {
        vec![
            thesis("1", "On Cats", "cats are animals"),
            thesis("2", "On Dogs", "dogs are animals"),
            thesis("3", "Markets", "stock market rose today"),
        ]
    }

    #[tokio::test]
    async fn test_rebuild_then_query_alignment() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());

        let stats = engine.rebuild().await.unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.dimension, 6);

        // Semantically close documents rank ahead of the unrelated one.
        let results = engine.query("pets and animals", Some(3)).unwrap();
        assert_eq!(results.len(), 3);
        let top_ids: Vec<&str> = results[..2].iter().map(|r| r.id.as_str()).collect();
        assert!(top_ids.contains(&"1"));
        assert!(top_ids.contains(&"2"));
        assert_eq!(results[2].id, "3");

        // Lower score means more relevant; the order is ascending.
        assert!(results[0].relevance_score <= results[1].relevance_score);
        assert!(results[1].relevance_score <= results[2].relevance_score);
    }

    #[tokio::test]
    async fn test_empty_query_fails_before_embedding() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());
        engine.rebuild().await.unwrap();

        assert!(matches!(
            engine.query("", None),
            Err(SearchError::EmptyQuery)
        ));
        assert!(matches!(
            engine.query("   \t\n", None),
            Err(SearchError::EmptyQuery)
        ));
    }

    #[test]
    fn test_query_without_index_is_not_ready() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());

        assert!(matches!(
            engine.query("anything", None),
            Err(SearchError::IndexNotReady)
        ));
    }

    #[tokio::test]
    async fn test_limit_larger_than_corpus() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());
        engine.rebuild().await.unwrap();

        let results = engine.query("cat", Some(50)).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_source_aborts_and_reports() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, Vec::new());

        assert!(matches!(
            engine.rebuild().await,
            Err(SearchError::EmptySource)
        ));
        // No live pair was installed.
        assert!(!engine.status().ready);
    }

    #[tokio::test]
    async fn test_source_failure_keeps_previous_pair_live() {
        let temp_dir = TempDir::new().unwrap();

        let engine = engine_with(&temp_dir, corpus());
        engine.rebuild().await.unwrap();

        // A second engine sharing the store but with a dead source: its
        // rebuild fails, and whatever was live before stays live.
        let failing = SearchEngine::new(
            Arc::new(MockEmbedder::new(vec![
                "cat", "dog", "pet", "animal", "stock", "market",
            ])),
            Arc::new(FailingSource),
            IndexStore::new(temp_dir.path().join("index")),
            5,
        );
        assert!(failing.load_persisted().unwrap());
        assert!(matches!(
            failing.rebuild().await,
            Err(SearchError::SourceUnavailable { .. })
        ));
        assert!(failing.status().ready);
        assert_eq!(failing.query("cat", Some(1)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_persisted_round_trip() {
        let temp_dir = TempDir::new().unwrap();

        {
            let engine = engine_with(&temp_dir, corpus());
            engine.rebuild().await.unwrap();
        }

        let engine = engine_with(&temp_dir, corpus());
        assert!(engine.load_persisted().unwrap());

        let status = engine.status();
        assert!(status.ready);
        assert_eq!(status.documents, Some(3));

        let results = engine.query("stock market", Some(1)).unwrap();
        assert_eq!(results[0].id, "3");
    }

    #[test]
    fn test_load_persisted_first_run_is_ok_false() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());
        assert!(!engine.load_persisted().unwrap());
    }

    #[tokio::test]
    async fn test_rebuild_single_flight() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());

        // Simulate an in-flight rebuild by holding the flag.
        let guard = RebuildGuard::acquire(&engine.rebuild_in_flight).unwrap();
        assert!(matches!(
            engine.rebuild().await,
            Err(SearchError::RebuildInProgress)
        ));
        drop(guard);

        // Released: rebuild proceeds.
        assert!(engine.rebuild().await.is_ok());
    }

    #[tokio::test]
    async fn test_status_reports_model_identity() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine_with(&temp_dir, corpus());

        let status = engine.status();
        assert_eq!(status.model_name, "mock-term-overlap");
        assert_eq!(status.dimension, 6);
        assert!(!status.ready);

        engine.rebuild().await.unwrap();
        assert!(engine.status().ready);
    }
}
