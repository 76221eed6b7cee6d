//! Defines routes for the upload, download and listing pages and their JSON
//! counterparts.
//!
//! ## Structure
//! - **HTML pages**
//!   - `GET  /` -> home
//!   - `GET  /upload` -> upload form
//!   - `POST /upload` -> store file, render completion page
//!   - `GET  /list` -> table of stored files
//!   - `GET  /download/{key}` -> stream the file as an attachment
//!
//! - **JSON API**
//!   - `POST /api/upload` -> store file, return `{"ID","AccessToken"}`
//!   - `GET  /api/list` -> `[{"ID","Name","Size"}]`
//!   - `GET  /api/download/{key}` -> same as `/download/{key}`

use crate::{
    handlers::{
        file_handlers::{
            download, home, list_api, list_page, upload_api, upload_form, upload_page,
        },
        health_handlers::{healthz, readyz},
    },
    services::file_service::FileService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build and return the router for every page and API route.
///
/// The router carries shared state (`FileService`) to all handlers.
pub fn routes() -> Router<FileService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // HTML pages
        .route("/", get(home))
        .route("/upload", get(upload_form).post(upload_page))
        .route("/list", get(list_page))
        .route("/download/{key}", get(download))
        // JSON API
        .route("/api/upload", post(upload_api))
        .route("/api/list", get(list_api))
        .route("/api/download/{key}", get(download))
}

/// The complete application: routes, state, upload body cap and request tracing.
pub fn build_router(service: FileService, max_upload_bytes: usize) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
