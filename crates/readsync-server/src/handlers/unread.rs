//! Read-later API

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use readsync_core::models::{split_batch, split_tags};
use readsync_core::reading::{self, DEFAULT_SUFFIX};
use readsync_core::{Filter, NewEntry};

use super::files::{article_response, ReadingQuery, INDEX_ID};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    note: String,
}

/// `/add`, `/new`, `/webhook`
pub async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddForm>,
) -> Result<Json<Value>, ApiError> {
    let new = NewEntry {
        url: form.url,
        title: form.title,
        desc: form.desc,
        note: form.note,
        tags: split_tags(&form.tags),
    };
    let idx = state.with_store(move |store| store.add_one(new)).await?;

    info!("Added read-later entry {}", idx);
    Ok(Json(json!({ "code": 201, "idx": idx })))
}

#[derive(Debug, Deserialize)]
pub struct AddBatchForm {
    #[serde(default)]
    urls: String,
    #[serde(default)]
    titles: String,
    #[serde(default)]
    tags: String,
}

/// `/adds`
pub async fn add_batch(
    State(state): State<AppState>,
    Form(form): Form<AddBatchForm>,
) -> Result<Json<Value>, ApiError> {
    let urls = split_batch(&form.urls);
    let titles = split_batch(&form.titles);
    let tags = split_tags(&form.tags);
    let idxs = state
        .with_store(move |store| store.add_batch(&urls, &titles, &tags))
        .await?;

    info!("Added {} read-later entries", idxs.len());
    Ok(Json(json!({ "code": 201, "idx": idxs })))
}

#[derive(Debug, Deserialize)]
pub struct ListForm {
    #[serde(default)]
    filter: String,
    #[serde(default)]
    value: Option<String>,
}

/// `/list`
pub async fn list(
    State(state): State<AppState>,
    Form(form): Form<ListForm>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::parse(&form.filter, form.value.as_deref());
    let result = state.with_store(move |store| store.query(&filter)).await?;

    Ok(Json(json!({ "data": result })))
}

/// `/reading/` and `/reading/{id}` on the API listener
///
/// `?title=index` lists the output directory with modification times.
pub async fn reading(
    State(state): State<AppState>,
    id: Option<Path<String>>,
    Query(query): Query<ReadingQuery>,
) -> Result<Response, ApiError> {
    if query.title.as_deref() == Some(INDEX_ID) {
        let files = reading::reading_index(state.output()?.default_dir())?;
        info!("Listed {} saved articles", files.len());
        return Ok(Json(json!({ "data": files })).into_response());
    }

    let id = id.map(|Path(id)| id).unwrap_or_default();
    article_response(&state, &id, query.title.as_deref(), DEFAULT_SUFFIX)
}
