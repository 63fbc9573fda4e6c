//! HTTP surface of the search service.
//!
//! A thin JSON layer over the engine: it validates nothing itself beyond
//! extraction, maps engine errors to status codes, and never retries.
//! Retry policy belongs to callers and operators, not this layer.
//!
//! Routes:
//! - `GET /search?q=...&limit=N` / `POST /search`: ranked results
//! - `POST /reindex`: trigger a rebuild (409 while one is in flight)
//! - `GET /status`: model identity, dimension, document count, readiness
//! - `GET /health`: liveness probe
//!
//! CORS is permissive: the thesis platform's frontend runs on a different
//! origin, as it did for the original analysis sidecar.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::engine::{EngineStatus, IngestStats, RankedThesis, SearchEngine};
use crate::error::SearchError;

/// Query string parameters of `GET /search`.
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<usize>,
}

/// Body of `POST /search`.
#[derive(Debug, Deserialize)]
struct SearchBody {
    query: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<RankedThesis>,
    count: usize,
    /// Reminder that `relevance_score` is a distance: lower is better.
    score_order: &'static str,
}

#[derive(Debug, Serialize)]
struct ReindexResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: IngestStats,
}

/// JSON error body with a stable machine-readable status code.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<&'static str>,
}

/// Map an engine error onto the HTTP status space: client mistakes are
/// 4xx, missing readiness is 503, upstream collaborator failures are 502.
fn error_response(err: SearchError) -> Response {
    let status = match &err {
        SearchError::EmptyQuery => StatusCode::BAD_REQUEST,
        SearchError::IndexNotReady => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::RebuildInProgress => StatusCode::CONFLICT,
        SearchError::SourceUnavailable { .. } | SearchError::EmbedderUnavailable { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(code = err.status_code(), "request failed: {err}");
    }

    let body = ErrorBody {
        error: err.to_string(),
        status: err.status_code().to_string(),
        suggestions: err.recovery_suggestions(),
    };
    (status, Json(body)).into_response()
}

async fn search_get(
    State(engine): State<Arc<SearchEngine>>,
    Query(params): Query<SearchParams>,
) -> Response {
    run_search(engine, params.q, params.limit).await
}

async fn search_post(
    State(engine): State<Arc<SearchEngine>>,
    Json(body): Json<SearchBody>,
) -> Response {
    run_search(engine, body.query, body.limit).await
}

async fn run_search(engine: Arc<SearchEngine>, query: String, limit: Option<usize>) -> Response {
    // Embedding is CPU-bound; keep it off the async worker threads.
    let result = tokio::task::spawn_blocking(move || engine.query(&query, limit)).await;

    match result {
        Ok(Ok(results)) => {
            let response = SearchResponse {
                count: results.len(),
                results,
                score_order: "ascending distance (lower is more relevant)",
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => error_response(err),
        Err(join_err) => error_response(SearchError::EmbedderUnavailable {
            reason: format!("query task panicked: {join_err}"),
        }),
    }
}

async fn reindex(State(engine): State<Arc<SearchEngine>>) -> Response {
    match engine.rebuild().await {
        Ok(stats) => {
            info!(documents = stats.documents, "reindex via HTTP complete");
            (
                StatusCode::OK,
                Json(ReindexResponse {
                    status: "ok",
                    stats,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn status(State(engine): State<Arc<SearchEngine>>) -> Json<EngineStatus> {
    Json(engine.status())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Assemble the service router.
pub fn router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/search", get(search_get).post(search_post))
        .route("/reindex", post(reindex))
        .route("/status", get(status))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Run the HTTP server until the process is stopped.
pub async fn serve(engine: Arc<SearchEngine>, bind: &str) -> anyhow::Result<()> {
    let addr: std::net::SocketAddr = bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "search service listening");

    axum::serve(listener, router(engine)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::error::SearchResult;
    use crate::source::{SourceThesis, ThesisSource};
    use crate::store::IndexStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct StaticSource {
        theses: Vec<SourceThesis>,
    }

    #[async_trait]
    impl ThesisSource for StaticSource {
        async fn fetch_all(&self) -> SearchResult<Vec<SourceThesis>> {
            Ok(self.theses.clone())
        }
    }

    fn test_engine(temp_dir: &TempDir) -> Arc<SearchEngine> {
        let theses = vec![
            SourceThesis {
                id: "1".to_string(),
                title: "On Cats".to_string(),
                author: "A".to_string(),
                text: "cats are animals".to_string(),
            },
            SourceThesis {
                id: "2".to_string(),
                title: "Markets".to_string(),
                author: "B".to_string(),
                text: "stock market rose today".to_string(),
            },
        ];
        Arc::new(SearchEngine::new(
            Arc::new(MockEmbedder::new(vec!["cat", "animal", "stock", "market"])),
            Arc::new(StaticSource { theses }),
            IndexStore::new(temp_dir.path().join("index")),
            5,
        ))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_happy_path() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir);
        engine.rebuild().await.unwrap();

        let response = router(engine)
            .oneshot(
                Request::builder()
                    .uri("/search?q=cats%20and%20animals&limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["results"][0]["id"], "1");
    }

    #[tokio::test]
    async fn test_empty_query_is_client_error() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir);
        engine.rebuild().await.unwrap();

        let response = router(engine)
            .oneshot(
                Request::builder()
                    .uri("/search?q=%20%20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], "EMPTY_QUERY");
    }

    #[tokio::test]
    async fn test_search_before_ingestion_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir);

        let response = router(engine)
            .oneshot(
                Request::builder()
                    .uri("/search?q=anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["status"], "INDEX_NOT_READY");
    }

    #[tokio::test]
    async fn test_post_search_body() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir);
        engine.rebuild().await.unwrap();

        let response = router(engine)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "stock market", "limit": 1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"][0]["id"], "2");
    }

    #[tokio::test]
    async fn test_reindex_and_status() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir);
        let app = router(engine);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/reindex")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["documents"], 2);

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ready"], true);
        assert_eq!(json["documents"], 2);
        assert_eq!(json["model_name"], "mock-term-overlap");
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().unwrap();
        let engine = test_engine(&temp_dir);

        let response = router(engine)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
