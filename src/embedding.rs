//! Embedding generation: the port to the embedding model and its
//! fastembed-backed implementation.
//!
//! The rest of the service treats the embedder as an opaque function from
//! text to a fixed-length vector. The dimension is fixed by the model at
//! first use, and the model name travels with the persisted index so a
//! load can detect a model swap.

use crate::error::{SearchError, SearchResult};
use crate::vector::VectorDimension;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;

/// Trait for generating embeddings from text.
///
/// Implementations must be thread-safe; the query path calls `embed`
/// concurrently from multiple request handlers. Within one deployed model
/// version, identical input must produce identical output.
pub trait Embedder: Send + Sync {
    /// Embed a single string.
    fn embed(&self, text: &str) -> SearchResult<Vec<f32>>;

    /// Embed multiple strings, order-preserving: output `i` corresponds
    /// to input `i`.
    fn embed_batch(&self, texts: &[&str]) -> SearchResult<Vec<Vec<f32>>>;

    /// The fixed dimension of vectors this embedder produces.
    fn dimension(&self) -> VectorDimension;

    /// Stable identifier of the model, recorded in the catalog artifact.
    fn model_name(&self) -> &str;
}

/// Default cache directory for downloaded model files.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".thesis-search"))
        .join("thesis-search")
        .join("models")
}

/// FastEmbed implementation of the embedder port.
///
/// The model file is downloaded on first use and cached; afterwards
/// initialization is local-only.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: VectorDimension,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("model", &"<TextEmbedding>")
            .finish()
    }
}

impl FastEmbedder {
    /// Initialize the embedder for `model_name`, caching model files in
    /// `cache_dir` (defaults to [`models_dir`]).
    ///
    /// # Errors
    /// Fails with `EmbedderUnavailable` if the model cannot be downloaded
    /// or initialized, and with `Config` for an unknown model name.
    pub fn new(
        model_name: &str,
        cache_dir: Option<PathBuf>,
        show_download_progress: bool,
    ) -> SearchResult<Self> {
        let model_kind = resolve_model(model_name)?;
        let cache_dir = cache_dir.unwrap_or_else(models_dir);

        let mut model = TextEmbedding::try_new(
            InitOptions::new(model_kind)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| SearchError::EmbedderUnavailable {
            reason: format!(
                "failed to initialize model '{model_name}': {e}. First-time use needs network access to download the model"
            ),
        })?;

        // The model fixes the dimension; probe it once at startup.
        let probe = model
            .embed(vec!["dimension probe"], None)
            .map_err(|e| SearchError::EmbedderUnavailable {
                reason: format!("model '{model_name}' failed a probe embedding: {e}"),
            })?;
        let dimension = probe
            .into_iter()
            .next()
            .map(|v| v.len())
            .unwrap_or_default();
        let dimension = VectorDimension::new(dimension)?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl Embedder for FastEmbedder {
    fn embed(&self, text: &str) -> SearchResult<Vec<f32>> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().ok_or_else(|| SearchError::EmbedderUnavailable {
            reason: "model returned no embedding for a single input".to_string(),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> SearchResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .map_err(|_| SearchError::EmbedderUnavailable {
                reason: "embedding model lock poisoned by a panic in another thread".to_string(),
            })?
            .embed(texts.to_vec(), None)
            .map_err(|e| SearchError::EmbedderUnavailable {
                reason: format!("embedding failed: {e}"),
            })?;

        for embedding in &embeddings {
            self.dimension.validate_vector(embedding)?;
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Map a configured model name onto the fastembed model catalog.
fn resolve_model(name: &str) -> SearchResult<EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        other => Err(SearchError::Config {
            reason: format!(
                "unknown embedding model '{other}' (supported: all-minilm-l6-v2, bge-small-en-v1.5)"
            ),
        }),
    }
}

/// Deterministic embedder for unit tests.
///
/// Scores each text against a fixed vocabulary, one dimension per term,
/// then normalizes. Texts sharing terms land close together, which is
/// enough to exercise ranking without a real model.
#[cfg(test)]
pub struct MockEmbedder {
    vocabulary: Vec<&'static str>,
    model_name: String,
}

#[cfg(test)]
impl MockEmbedder {
    pub fn new(vocabulary: Vec<&'static str>) -> Self {
        Self {
            vocabulary,
            model_name: "mock-term-overlap".to_string(),
        }
    }
}

#[cfg(test)]
impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> SearchResult<Vec<f32>> {
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
        VectorDimension::new(self.vocabulary.len()).expect("mock vocabulary is non-empty")
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
