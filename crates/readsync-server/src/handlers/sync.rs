//! Extension handshake and document sync

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use readsync_core::PullOutcome;

use crate::error::ApiError;
use crate::state::{AppState, Verification};

/// `/verify`
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.verify(&headers).await {
        Verification::Same => Json(json!({ "code": 403, "status": "same" })).into_response(),
        Verification::Mismatch => Json(json!({ "code": 403, "status": "uid" })).into_response(),
        Verification::Adopted => Json(json!({ "code": 201 })).into_response(),
        Verification::Empty => StatusCode::OK.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfigForm {
    #[serde(default)]
    config: String,
}

fn quoted(etag: &str) -> String {
    format!("\"{}\"", etag)
}

/// `/config`: push the document when `config` is set, pull it otherwise
pub async fn config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ConfigForm>,
) -> Result<Response, ApiError> {
    if !form.config.is_empty() {
        let payload = form.config;
        let outcome = state.with_store(move |store| store.push(&payload)).await?;
        info!(
            "Synced settings from browser ({} read-later entries)",
            outcome.indexes.len()
        );
        return Ok(Json(json!({ "status": 200 })).into_response());
    }

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let outcome = state
        .with_store(move |store| store.pull(if_none_match.as_deref()))
        .await?;
    match outcome {
        PullOutcome::NotModified { etag } => {
            Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, quoted(&etag))]).into_response())
        }
        PullOutcome::Document { etag, body } => {
            info!("Synced settings to browser");
            Ok((
                [(header::ETAG, quoted(&etag))],
                Json(json!({ "status": 200, "result": body })),
            )
                .into_response())
        }
    }
}
