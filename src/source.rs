//! Document source: the port to the thesis store and its HTTP
//! implementation.
//!
//! The thesis repository backend exposes its collection as JSON at
//! `GET /api/theses`. Only the fields the index needs survive the
//! boundary: id, title, author, and the abstract text that gets embedded.
//! Everything else the store carries (status, department, file paths, …)
//! is dropped at ingestion.

use crate::catalog::ThesisRecord;
use crate::error::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// One thesis as fetched from the store, before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceThesis {
    pub id: String,
    pub title: String,
    pub author: String,
    /// The text that gets embedded. Guaranteed non-empty by `fetch_all`.
    pub text: String,
}

impl SourceThesis {
    /// The metadata that outlives ingestion; the text does not.
    #[must_use]
    pub fn to_record(&self) -> ThesisRecord {
        ThesisRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

/// Trait for fetching the thesis corpus.
///
/// Implementations return only documents with a non-empty text field, in
/// a stable order, which defines the slot alignment between the
/// vector index and the catalog.
#[async_trait]
pub trait ThesisSource: Send + Sync {
    async fn fetch_all(&self) -> SearchResult<Vec<SourceThesis>>;
}

/// Wire shape of the backend's thesis route.
///
/// Field names follow the store's own schema; extra fields are ignored.
#[derive(Debug, Deserialize)]
struct ApiThesis {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    #[serde(rename = "authorName")]
    author_name: String,
    #[serde(default)]
    r#abstract: Option<String>,
}

/// HTTP implementation of the thesis source against the repository
/// backend's REST API.
#[derive(Debug, Clone)]
pub struct HttpThesisSource {
    client: Client,
    base_url: String,
}

impl HttpThesisSource {
    /// Build a client for `base_url` (e.g. `http://localhost:5000`) with
    /// a request timeout; a hung backend surfaces as `SourceUnavailable`
    /// rather than stalling ingestion forever.
    pub fn new(base_url: &str, timeout: Duration) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::SourceUnavailable {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn theses_url(&self) -> String {
        format!("{}/api/theses", self.base_url)
    }
}

#[async_trait]
impl ThesisSource for HttpThesisSource {
    async fn fetch_all(&self) -> SearchResult<Vec<SourceThesis>> {
        let url = self.theses_url();
        let response = self.client.get(&url).send().await.map_err(|e| {
            SearchError::SourceUnavailable {
                reason: format!("request to {url} failed: {e}"),
            }
        })?;

        if !response.status().is_success() {
            return Err(SearchError::SourceUnavailable {
                reason: format!("{url} answered {}", response.status()),
            });
        }

        let theses: Vec<ApiThesis> =
            response
                .json()
                .await
                .map_err(|e| SearchError::SourceUnavailable {
                    reason: format!("{url} returned unparseable JSON: {e}"),
                })?;

        Ok(theses
            .into_iter()
            .filter_map(|t| {
                let text = t.r#abstract.unwrap_or_default();
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                Some(SourceThesis {
                    id: t.id,
                    title: t.title,
                    author: t.author_name,
                    text: text.to_string(),
                })
            })
            .collect())
    }
}
