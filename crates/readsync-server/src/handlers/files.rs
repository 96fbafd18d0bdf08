//! Captured files, bundles and saved articles

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use readsync_core::bundle::{self, BundleKind};
use readsync_core::reading::{self, DEFAULT_SUFFIX};

use crate::error::ApiError;
use crate::state::AppState;

/// Id that lists the output directory instead of reading a file
pub const INDEX_ID: &str = "index";

/// Header naming the suffix of the requested article
const SUFFIX_HEADER: &str = "type";

#[derive(Debug, Deserialize)]
pub struct PlainForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// `/plain`: save a file through the output router
pub async fn plain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PlainForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.require_uid(&headers).await?;

    let report = state
        .output()?
        .save_plain(&form.title, form.content.as_bytes())?;
    if !report.any_written() {
        return Err(ApiError::Internal(anyhow!(
            "Failed to save {:?} to any destination",
            form.title
        )));
    }

    info!("Saved file {:?}", form.title);
    Ok(Json(json!({ "status": 200 })))
}

#[derive(Debug, Deserialize)]
pub struct BundleForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    path: Option<String>,
}

async fn save_bundle(
    state: AppState,
    headers: HeaderMap,
    form: BundleForm,
    kind: BundleKind,
    base: Option<PathBuf>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.require_uid(&headers).await?;

    let report = bundle::save_bundle(
        state.output()?,
        kind,
        &form.title,
        &form.content,
        base.as_deref(),
        Arc::clone(&state.fetcher),
        state.asset_concurrency,
    )
    .await?;

    Ok(Json(json!({
        "status": 200,
        "assets_failed": report.assets_failed.len(),
    })))
}

/// `/textbundle`
pub async fn textbundle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BundleForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    save_bundle(state, headers, form, BundleKind::TextBundle, None).await
}

/// `/notextbundle`: `path` overrides the default output directory
pub async fn notextbundle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BundleForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let base = form
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    save_bundle(state, headers, form, BundleKind::Markdown, base).await
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadingQuery {
    #[serde(default)]
    pub title: Option<String>,
}

/// Serve the article matching `id`, or the not-found envelope
pub fn article_response(
    state: &AppState,
    id: &str,
    title: Option<&str>,
    suffix: &str,
) -> Result<Response, ApiError> {
    let dir = state.output()?.default_dir();

    let Some((name, content)) = reading::read_article(dir, id, title, suffix)? else {
        return Ok(Json(json!({ "code": 404, "message": "content not found" })).into_response());
    };

    info!("Reading file {:?}", name);
    let content_type = if name.ends_with(".html") {
        "text/html; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    };
    Ok(([(header::CONTENT_TYPE, content_type)], content).into_response())
}

/// `/reading/{id}` on the extension listener
pub async fn reading(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReadingQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if id == INDEX_ID {
        let names = reading::list_names(state.output()?.default_dir())?;
        return Ok(Json(json!({ "files": names })).into_response());
    }

    let suffix = headers
        .get(SUFFIX_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_SUFFIX);

    article_response(&state, &id, query.title.as_deref(), suffix)
}
