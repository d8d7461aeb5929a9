use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bundle_protocol::{serialize_json, ErrorBody, HealthReport};
use bundle_store::{decode_key, list_keys, DocumentStore, QueryParams, StoreError};
use serde::Serialize;
use tower_http::services::ServeDir;

const DATA_PREFIX: &str = "/api/data";

#[derive(Clone)]
pub struct HttpState {
    store: Arc<DocumentStore>,
}

impl HttpState {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

/// API routes under `/api`, everything else served from `frontend_dir`.
pub fn router(store: Arc<DocumentStore>, frontend_dir: &Path) -> Router {
    Router::new()
        .route("/api/keys", get(http_keys))
        .route("/api/data", get(http_data))
        .route("/api/data/", get(http_data))
        .route("/api/data/*key", get(http_data))
        .route("/api/health", get(http_health))
        .fallback_service(ServeDir::new(frontend_dir))
        .with_state(HttpState::new(store))
}

async fn http_keys(
    State(state): State<HttpState>,
    Query(params): Query<QueryParams>,
) -> Response {
    match list_keys(&state.store, Some(params.get("q"))) {
        Ok(keys) => json_response(StatusCode::OK, &keys),
        Err(err) => error_response(&err),
    }
}

// The key is taken from the raw path: only `%2F` is decoded, so the
// router's own percent-decoding must not run first. Exactly one `/` separates
// the prefix from the key, so `/api/data//v1/group` names `/v1/group`.
async fn http_data(
    State(state): State<HttpState>,
    uri: Uri,
    Query(params): Query<QueryParams>,
) -> Response {
    let raw = uri.path().strip_prefix(DATA_PREFIX).unwrap_or_default();
    let raw = raw.strip_prefix('/').unwrap_or(raw);
    let key = match decode_key(raw) {
        Ok(key) => key,
        Err(err) => {
            log::error!("Error decoding key path '{}': {err}", uri.path());
            return error_response(&err);
        }
    };
    log::info!("Processing request for key: '{key}'");

    let store = Arc::clone(&state.store);
    let view = tokio::task::spawn_blocking(move || store.view(&key, &params)).await;
    match view {
        Ok(Ok(value)) => json_response(StatusCode::OK, &value),
        Ok(Err(err)) => error_response(&err),
        Err(err) => {
            log::error!("View task failed: {err}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorBody::new("Internal error."),
            )
        }
    }
}

async fn http_health(State(state): State<HttpState>) -> Response {
    let report = HealthReport::from_key_count(state.store.len());
    let status = if report.loaded {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    json_response(status, &report)
}

pub(crate) fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        StoreError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::NotLoaded
        | StoreError::ShapeMismatch { .. }
        | StoreError::AlreadyLoaded
        | StoreError::Io(_)
        | StoreError::Json(_)
        | StoreError::InvalidDocument(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(err: &StoreError) -> Response {
    json_response(status_for(err), &ErrorBody::new(err.to_string()))
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serialize_json(body) {
        Ok(json) => (status, [(CONTENT_TYPE, "application/json")], json).into_response(),
        Err(err) => {
            log::error!("Failed to serialize response: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "application/json")],
                r#"{"error":"Failed to serialize response."}"#,
            )
                .into_response()
        }
    }
}
