//! Error envelopes
//!
//! Every failure is answered with a small JSON body the extension
//! understands; the HTTP status mirrors the body's `code`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use readsync_core::{DocumentError, OutputError, StorageError, ValidationError};

/// A request that could not be served
#[derive(Debug)]
pub enum ApiError {
    /// No sync path is configured
    NotConfigured,
    /// Missing or mismatched `uid` header
    Unauthorized,
    /// The request itself is invalid
    BadRequest(String),
    /// Storage or other server-side failure
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if err.downcast_ref::<ValidationError>().is_some()
            || err.downcast_ref::<DocumentError>().is_some()
        {
            ApiError::BadRequest(format!("{:#}", err))
        } else {
            ApiError::Internal(err)
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<OutputError> for ApiError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::InvalidName(_) => ApiError::BadRequest(err.to_string()),
            OutputError::Storage(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotConfigured => Json(json!({ "status": "error" })).into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "code": 401, "status": "uid" })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                warn!("Rejected request: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "code": 400, "message": message })),
                )
                    .into_response()
            }
            ApiError::Internal(err) => {
                error!("{:#}", err);
                if let Some(hint) = err
                    .downcast_ref::<StorageError>()
                    .and_then(StorageError::recovery_suggestion)
                {
                    warn!("{}", hint);
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "code": 500, "message": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
