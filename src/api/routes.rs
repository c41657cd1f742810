//! HTTP API route definitions.

use std::path::Path;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers::{
    export_all, export_document, get_document, health, list_dates, save_document, AppState,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Page served for any path no route or asset matches.
pub const INDEX_FILE: &str = "index.html";

/// Create the API router.
///
/// Anything that is not an API route is served from `public_dir`, falling
/// back to its `index.html` so the front end can route client-side. That
/// includes unknown `/api/*` paths.
pub fn create_router(state: AppState, public_dir: &Path) -> Router {
    let assets = ServeDir::new(public_dir).fallback(ServeFile::new(public_dir.join(INDEX_FILE)));

    Router::new()
        // Health endpoint
        .route("/health", get(health))
        // Documents
        .route("/api/data/:date", get(get_document).post(save_document))
        .route("/api/dates", get(list_dates))
        // Downloads
        .route("/api/export/:date", get(export_document))
        .route("/api/export-all", get(export_all))
        // Static front end
        .fallback_service(assets)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
