//! Remote image assets
//!
//! Markdown sent for bundling references images by absolute URL. The
//! references are rewritten to `assets/<n>.png` and the images downloaded
//! next to the text, at most `limit` at a time.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Download timeout in seconds
const FETCH_TIMEOUT: u64 = 30;

/// Source of image bytes
pub trait AssetFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Fetches assets over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent(concat!("readsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// An image reference found in Markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Position among the references, also the local file stem
    pub index: usize,
    pub url: String,
}

impl AssetRef {
    /// File name inside the bundle's `assets/` directory
    pub fn file_name(&self) -> String {
        format!("{}.png", self.index)
    }
}

fn image_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)!\[(\S+)?\]\((https?://[^)]+)\)").expect("valid regex"))
}

/// Point remote image references at local asset files
///
/// Returns the rewritten Markdown and the references in document order.
pub fn rewrite_images(markdown: &str) -> (String, Vec<AssetRef>) {
    let mut assets = Vec::new();
    let rewritten = image_pattern().replace_all(markdown, |caps: &Captures| {
        let asset = AssetRef {
            index: assets.len(),
            url: caps[2].to_string(),
        };
        let replacement = format!("![](assets/{})", asset.file_name());
        assets.push(asset);
        replacement
    });
    (rewritten.into_owned(), assets)
}

/// A download that did not end up on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of downloading a bundle's assets
#[derive(Debug, Default)]
pub struct AssetReport {
    pub fetched: Vec<PathBuf>,
    pub failed: Vec<AssetFailure>,
}

/// Download `assets` into `dir`, running at most `limit` fetches at once
///
/// Every asset is attempted; failures are logged and collected.
pub async fn download_assets<F: AssetFetcher>(
    fetcher: Arc<F>,
    assets: Vec<AssetRef>,
    dir: &Path,
    limit: usize,
) -> AssetReport {
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for asset in assets {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let path = dir.join(asset.file_name());

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let saved = async {
                let bytes = fetcher.fetch(&asset.url).await?;
                tokio::fs::write(&path, bytes)
                    .await
                    .with_context(|| format!("Failed to write {:?}", path))?;
                anyhow::Ok(path)
            }
            .await;

            saved.map_err(|e| AssetFailure {
                url: asset.url,
                reason: format!("{:#}", e),
            })
        });
    }

    let mut report = AssetReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(path)) => {
                debug!("Saved asset {:?}", path);
                report.fetched.push(path);
            }
            Ok(Err(failure)) => {
                warn!("Failed to fetch asset {}: {}", failure.url, failure.reason);
                report.failed.push(failure);
            }
            Err(e) => {
                warn!("Asset task did not complete: {}", e);
                report.failed.push(AssetFailure {
                    url: String::new(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report.fetched.sort();
    report
}
