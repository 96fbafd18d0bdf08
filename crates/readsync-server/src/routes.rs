//! HTTP routers
//!
//! Two listeners share one [`AppState`]: the extension listener serves the
//! settings document and captured files, the API listener serves the
//! read-later list.

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{files, sync, unread};
use crate::state::AppState;

/// Largest accepted request body; pushed settings and articles can be big
pub const MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Routes of the extension listener
pub fn local_router(state: AppState) -> Router {
    Router::new()
        .route("/verify", any(sync::verify))
        .route("/config", any(sync::config))
        .route("/plain", any(files::plain))
        .route("/textbundle", any(files::textbundle))
        .route("/notextbundle", any(files::notextbundle))
        .route("/reading/:id", get(files::reading))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes of the read-later API listener
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/add", any(unread::add))
        .route("/new", any(unread::add))
        .route("/webhook", any(unread::add))
        .route("/adds", any(unread::add_batch))
        .route("/list", any(unread::list))
        .route("/reading/", get(unread::reading))
        .route("/reading/:id", get(unread::reading))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
