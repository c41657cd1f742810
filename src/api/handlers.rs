//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::error::{ApiError, ErrorKind, StoreError};
use crate::store::{DateKey, DocumentStore};

/// File name of the combined export download.
pub const EXPORT_ALL_FILENAME: &str = "timebox_all_saved.json";

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Document backend.
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: impl DocumentStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Save acknowledgement.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Always true.
    pub ok: bool,
}

/// Known dates.
#[derive(Debug, Serialize)]
pub struct DatesResponse {
    /// Stored keys, in store enumeration order.
    pub dates: Vec<String>,
}

/// File name of a single-day export download.
pub fn export_filename(key: &DateKey) -> String {
    format!("timebox_{key}.json")
}

fn attachment(filename: &str) -> [(header::HeaderName, HeaderValue); 2] {
    // Filenames are built from validated keys, so the value is always ASCII.
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ),
        (header::CONTENT_DISPOSITION, disposition),
    ]
}

/// Validate a path date, logging rejections under `route`.
fn parse_key(route: &'static str, date: &str) -> Result<DateKey, ApiError> {
    DateKey::parse(date).map_err(|e| {
        error!(route, date, error = %e, "Rejected date key");
        ApiError::BadRequest("Bad request")
    })
}

/// Log a store failure and map it: missing documents become 404, anything
/// else becomes `fallback`.
fn store_failure(
    route: &'static str,
    date: Option<&DateKey>,
    err: StoreError,
    fallback: ApiError,
) -> ApiError {
    let date = date.map(DateKey::as_str).unwrap_or("-");
    match err.kind() {
        ErrorKind::NotFound => {
            debug!(route, date, "Document not found");
            ApiError::NotFound
        }
        kind => {
            error!(route, date, %kind, error = %err, "Store operation failed");
            fallback
        }
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /api/data/:date` - the stored document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Value>, ApiError> {
    const ROUTE: &str = "GET /api/data/:date";
    let key = parse_key(ROUTE, &date)?;

    state
        .store
        .get(&key)
        .await
        .map(Json)
        .map_err(|e| store_failure(ROUTE, Some(&key), e, ApiError::BadRequest("Bad request")))
}

/// `POST /api/data/:date` - replace the stored document with the body.
pub async fn save_document(
    State(state): State<AppState>,
    Path(date): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    const ROUTE: &str = "POST /api/data/:date";
    let key = parse_key(ROUTE, &date)?;

    let Json(document) = body.map_err(|rejection| {
        error!(route = ROUTE, date = %key, error = %rejection, "Rejected request body");
        ApiError::Rejected {
            status: rejection.status(),
            message: "Invalid request body",
        }
    })?;

    state.store.save(&key, &document).await.map_err(|e| {
        // Every save failure is reported as a bad request.
        error!(route = ROUTE, date = %key, error = %e, "Store operation failed");
        ApiError::BadRequest("Save failed")
    })?;

    Ok(Json(SaveResponse { ok: true }))
}

/// `GET /api/dates` - every stored key.
pub async fn list_dates(State(state): State<AppState>) -> Result<Json<DatesResponse>, ApiError> {
    const ROUTE: &str = "GET /api/dates";

    let dates = state.store.list_keys().await.map_err(|e| {
        error!(route = ROUTE, error = %e, "Store operation failed");
        ApiError::Internal("Failed")
    })?;

    Ok(Json(DatesResponse { dates }))
}

/// `GET /api/export/:date` - the stored file as a download, bytes untouched.
pub async fn export_document(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Response, ApiError> {
    const ROUTE: &str = "GET /api/export/:date";
    let key = parse_key(ROUTE, &date)?;

    let reader = state
        .store
        .export_one(&key)
        .await
        .map_err(|e| store_failure(ROUTE, Some(&key), e, ApiError::BadRequest("Bad request")))?;

    let body = Body::from_stream(ReaderStream::new(reader));
    Ok((attachment(&export_filename(&key)), body).into_response())
}

/// `GET /api/export-all` - every document in one pretty-printed download.
pub async fn export_all(State(state): State<AppState>) -> Result<Response, ApiError> {
    const ROUTE: &str = "GET /api/export-all";

    let all = state
        .store
        .export_all()
        .await
        .map_err(|e| store_failure(ROUTE, None, e, ApiError::Internal("Failed")))?;

    let content = serde_json::to_string_pretty(&all).map_err(|e| {
        error!(route = ROUTE, error = %e, "Failed to serialize export");
        ApiError::Internal("Failed")
    })?;

    Ok((attachment(EXPORT_ALL_FILENAME), content).into_response())
}
