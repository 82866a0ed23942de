use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use boolsearch_core::persist::{load_index, IndexPaths};
use boolsearch_core::query::Operation;
use boolsearch_core::{DocId, InvertedIndex, QueryEngine, QueryError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub plan: Operation,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub path: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<InvertedIndex>,
}

/// Load the index files under `index_dir` and build the router.
pub fn build_app(index_dir: String) -> Result<Router> {
    let index = load_index(&IndexPaths::in_dir(&index_dir))?;
    Ok(router(Arc::new(index)))
}

pub fn router(index: Arc<InvertedIndex>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { index })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::Parse { .. } => StatusCode::BAD_REQUEST,
        QueryError::UnsupportedShape(_) | QueryError::Arity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn api_error(err: QueryError) -> ApiError {
    (status_for(&err), Json(ErrorBody { error: err.to_string() }))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let engine = QueryEngine::new(&state.index);
    let plan = engine.plan(&params.q).map_err(api_error)?;
    let docs = engine.evaluate(&plan).map_err(api_error)?;

    let results = docs
        .iter()
        .filter_map(|&doc_id| state.index.document(doc_id).map(|path| SearchHit { doc_id, path: path.to_string() }))
        .collect();
    let elapsed = start.elapsed();
    tracing::info!(query = %params.q, hits = docs.len(), took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse { query: params.q, plan, took_s: elapsed.as_secs_f64(), total_hits: docs.len(), results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<SearchHit>, ApiError> {
    match state.index.document(doc_id) {
        Some(path) => Ok(Json(SearchHit { doc_id, path: path.to_string() })),
        None => Err((StatusCode::NOT_FOUND, Json(ErrorBody { error: "not found".into() }))),
    }
}
