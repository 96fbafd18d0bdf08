//! Shared server state

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderMap;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use readsync_core::{Config, HttpAssetFetcher, OutputRouter, UnreadStore};

use crate::error::ApiError;

/// Header carrying the shared secret
pub const UID_HEADER: &str = "uid";

/// Outcome of a `/verify` handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The caller already holds the configured uid
    Same,
    /// A different uid is configured
    Mismatch,
    /// The caller's uid was adopted
    Adopted,
    /// Nothing configured and nothing offered
    Empty,
}

/// State shared by both listeners
#[derive(Clone)]
pub struct AppState {
    /// The read-later store, absent when no sync path is configured
    store: Option<Arc<Mutex<UnreadStore>>>,
    output: Option<Arc<OutputRouter>>,
    uid: Arc<RwLock<Option<String>>>,
    pub fetcher: Arc<HttpAssetFetcher>,
    pub asset_concurrency: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = if config.sync_path.is_some() {
            Some(Arc::new(Mutex::new(UnreadStore::open(config)?)))
        } else {
            None
        };

        Ok(Self {
            store,
            output: OutputRouter::from_config(config).map(Arc::new),
            uid: Arc::new(RwLock::new(config.uid.clone())),
            fetcher: Arc::new(HttpAssetFetcher::new()?),
            asset_concurrency: config.asset_concurrency,
        })
    }

    /// Run `op` on the read-later store
    ///
    /// The store is locked for the whole operation and its file io runs on
    /// the blocking pool.
    pub async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut UnreadStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.as_ref().ok_or(ApiError::NotConfigured)?;
        let mut guard = Arc::clone(store).lock_owned().await;

        let result = tokio::task::spawn_blocking(move || op(&mut *guard))
            .await
            .context("Store task failed")?;
        Ok(result?)
    }

    /// The output router
    pub fn output(&self) -> Result<&OutputRouter, ApiError> {
        self.output.as_deref().ok_or(ApiError::NotConfigured)
    }

    /// Reject requests whose `uid` header does not match the configured uid
    pub async fn require_uid(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let offered = header_uid(headers);
        match self.uid.read().await.as_deref() {
            Some(uid) if offered == Some(uid) => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }

    /// Compare the caller's uid with the configured one, adopting it when
    /// none is configured yet
    pub async fn verify(&self, headers: &HeaderMap) -> Verification {
        let offered = header_uid(headers);
        let mut uid = self.uid.write().await;

        match (uid.as_deref(), offered) {
            (Some(current), Some(offered)) if current == offered => Verification::Same,
            (Some(_), _) => Verification::Mismatch,
            (None, Some(offered)) => {
                *uid = Some(offered.to_string());
                info!("Adopted uid from extension");
                Verification::Adopted
            }
            (None, None) => Verification::Empty,
        }
    }
}

fn header_uid(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(UID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}
