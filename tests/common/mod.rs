//! Shared fixtures for integration tests: a deterministic embedder, an
//! in-memory thesis source, and an engine builder wired to a temp dir.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use thesis_search::embedding::Embedder;
use thesis_search::{
    IndexStore, SearchEngine, SearchResult, SourceThesis, ThesisSource, VectorDimension,
};

/// Deterministic embedder scoring texts against a fixed vocabulary, one
/// dimension per term. Texts sharing terms embed close together, enough
/// to exercise ranking without a model download.
pub struct TermOverlapEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
}

impl TermOverlapEmbedder {
    pub fn new(vocabulary: Vec<&'static str>) -> Self {
        Self {
            vocabulary,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of embed invocations so far (single and batch both count).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for TermOverlapEmbedder {
    fn embed(&self, text: &str) -> SearchResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lowered = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .vocabulary
            .iter()
            .map(|term| if lowered.contains(term) { 1.0 } else { 0.0 })
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> SearchResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.vocabulary.len()).expect("vocabulary is non-empty")
    }

    fn model_name(&self) -> &str {
        "term-overlap-test"
    }
}

/// In-memory thesis source with a fixed corpus.
pub struct StaticSource {
    pub theses: Vec<SourceThesis>,
}

#[async_trait]
impl ThesisSource for StaticSource {
    async fn fetch_all(&self) -> SearchResult<Vec<SourceThesis>> {
        Ok(self.theses.clone())
    }
}

pub fn thesis(id: &str, title: &str, author: &str, text: &str) -> SourceThesis {
    SourceThesis {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        text: text.to_string(),
    }
}

/// The three-document corpus from the acceptance scenario: two documents
/// about animals, one about finance.
pub fn animal_corpus() -> Vec<SourceThesis> {
    vec![
        thesis("1", "On Cats", "M. Felis", "cats are animals"),
        thesis("2", "On Dogs", "C. Lupus", "dogs are animals"),
        thesis("3", "Market Report", "S. Trader", "stock market rose today"),
    ]
}

pub fn test_vocabulary() -> Vec<&'static str> {
    vec!["cat", "dog", "pet", "animal", "stock", "market", "rose"]
}

/// Engine with the standard test embedder and the given corpus, storing
/// its index under `dir`.
pub fn build_engine(
    dir: &TempDir,
    theses: Vec<SourceThesis>,
) -> (Arc<SearchEngine>, Arc<TermOverlapEmbedder>) {
    let embedder = Arc::new(TermOverlapEmbedder::new(test_vocabulary()));
    let engine = SearchEngine::new(
        embedder.clone(),
        Arc::new(StaticSource { theses }),
        IndexStore::new(dir.path().join("index")),
        5,
    );
    (Arc::new(engine), embedder)
}
