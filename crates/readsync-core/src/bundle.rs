//! Markdown bundles
//!
//! Two on-disk layouts for a Markdown article and its images:
//!
//! ```text
//! <title>.textbundle/          <title>/
//!   info.json                    <title>.md
//!   text.markdown                assets/0.png ...
//!   assets/0.png ...
//! ```
//!
//! Saving a bundle again under the same title replaces its text.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::assets::{self, AssetFailure, AssetFetcher, AssetRef};
use crate::output::{is_safe_name, OutputError, OutputRouter};
use crate::storage::{atomic_write, StorageError};

/// Manifest written into every `.textbundle`
pub const TEXTBUNDLE_INFO: &str = r#"{"transient":true,"type":"net.daringfireball.markdown","creatorIdentifier":"pro.simpread","version":2}"#;

/// Routing extension of `.textbundle` output
pub const TEXTBUNDLE_EXTENSION: &str = "textbundle";

/// Routing extension of plain Markdown bundles
pub const ASSETS_EXTENSION: &str = "assets";

const ASSETS_DIR: &str = "assets";

/// Bundle layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// `<title>.textbundle/` with `info.json` and `text.markdown`
    TextBundle,
    /// `<title>/<title>.md`
    Markdown,
}

impl BundleKind {
    /// Extension used to route this kind of bundle
    pub fn extension(self) -> &'static str {
        match self {
            BundleKind::TextBundle => TEXTBUNDLE_EXTENSION,
            BundleKind::Markdown => ASSETS_EXTENSION,
        }
    }
}

/// A bundle written to disk, before its assets are downloaded
#[derive(Debug, Clone)]
pub struct Bundle {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub assets: Vec<AssetRef>,
}

fn create_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).map_err(|source| StorageError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a bundle's text under `base`
///
/// Image references are rewritten to point into the bundle's `assets/`
/// directory, which is created empty.
pub fn write_bundle(
    kind: BundleKind,
    base: &Path,
    title: &str,
    markdown: &str,
) -> Result<Bundle, OutputError> {
    if !is_safe_name(title) {
        return Err(OutputError::InvalidName(title.to_string()));
    }

    let (text, assets) = assets::rewrite_images(markdown);

    let root = match kind {
        BundleKind::TextBundle => base.join(format!("{}.textbundle", title)),
        BundleKind::Markdown => base.join(title),
    };
    let assets_dir = root.join(ASSETS_DIR);
    create_dir(&assets_dir)?;

    match kind {
        BundleKind::TextBundle => {
            atomic_write(&root.join("info.json"), TEXTBUNDLE_INFO.as_bytes())?;
            atomic_write(&root.join("text.markdown"), text.as_bytes())?;
        }
        BundleKind::Markdown => {
            atomic_write(&root.join(format!("{}.md", title)), text.as_bytes())?;
        }
    }

    Ok(Bundle {
        root,
        assets_dir,
        assets,
    })
}

/// Outcome of saving a bundle to all of its destinations
#[derive(Debug, Default)]
pub struct BundleReport {
    pub bundles: Vec<PathBuf>,
    pub assets_fetched: usize,
    pub assets_failed: Vec<AssetFailure>,
}

/// Write a bundle to every destination of its kind and download its assets
///
/// `base` replaces the default output directory as the fallback destination.
/// A failed asset download is reported without failing the bundle.
pub async fn save_bundle<F: AssetFetcher>(
    router: &OutputRouter,
    kind: BundleKind,
    title: &str,
    markdown: &str,
    base: Option<&Path>,
    fetcher: Arc<F>,
    concurrency: usize,
) -> Result<BundleReport, OutputError> {
    let base = base.unwrap_or_else(|| router.default_dir());

    let mut report = BundleReport::default();
    for dir in router.route_with_base(kind.extension(), base) {
        let bundle = write_bundle(kind, &dir, title, markdown)?;

        let assets = assets::download_assets(
            Arc::clone(&fetcher),
            bundle.assets,
            &bundle.assets_dir,
            concurrency,
        )
        .await;

        report.assets_fetched += assets.fetched.len();
        report.assets_failed.extend(assets.failed);
        report.bundles.push(bundle.root);
    }

    info!(
        "Saved bundle {:?} to {} destinations ({} assets, {} failed)",
        title,
        report.bundles.len(),
        report.assets_fetched,
        report.assets_failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnhancedOutput;
    use anyhow::Result;
    use tempfile::TempDir;

    struct StaticFetcher;

    impl AssetFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            if url.ends_with("missing.png") {
                anyhow::bail!("not found");
            }
            Ok(b"PNG".to_vec())
        }
    }

    const ARTICLE: &str = "# Title\n\n![a](https://img.example/a.png)\n\n![b](https://img.example/missing.png)\n";

    #[test]
    fn test_write_textbundle_layout() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = write_bundle(BundleKind::TextBundle, temp_dir.path(), "Story", ARTICLE).unwrap();

        let root = temp_dir.path().join("Story.textbundle");
        assert_eq!(bundle.root, root);
        assert!(root.join("assets").is_dir());
        assert_eq!(fs::read_to_string(root.join("info.json")).unwrap(), TEXTBUNDLE_INFO);
        assert_eq!(
            fs::read_to_string(root.join("text.markdown")).unwrap(),
            "# Title\n\n![](assets/0.png)\n\n![](assets/1.png)\n"
        );
        assert_eq!(bundle.assets.len(), 2);
    }

    #[test]
    fn test_write_markdown_bundle_layout() {
        let temp_dir = TempDir::new().unwrap();
        let bundle = write_bundle(BundleKind::Markdown, temp_dir.path(), "Story", "plain").unwrap();

        assert_eq!(bundle.root, temp_dir.path().join("Story"));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Story").join("Story.md")).unwrap(),
            "plain"
        );
        assert!(bundle.assets_dir.is_dir());
        assert!(bundle.assets.is_empty());
    }

    #[test]
    fn test_write_bundle_twice_replaces_text() {
        let temp_dir = TempDir::new().unwrap();
        write_bundle(BundleKind::Markdown, temp_dir.path(), "Story", "v1").unwrap();
        write_bundle(BundleKind::Markdown, temp_dir.path(), "Story", "v2").unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("Story").join("Story.md")).unwrap(),
            "v2"
        );
    }

    #[test]
    fn test_write_bundle_rejects_unsafe_title() {
        let temp_dir = TempDir::new().unwrap();
        let err = write_bundle(BundleKind::TextBundle, temp_dir.path(), "../x", "").unwrap_err();
        assert!(matches!(err, OutputError::InvalidName(_)));
    }

    #[tokio::test]
    async fn test_save_bundle_downloads_assets() {
        let temp_dir = TempDir::new().unwrap();
        let router = OutputRouter::new(temp_dir.path(), Vec::new());

        let report = save_bundle(
            &router,
            BundleKind::TextBundle,
            "Story",
            ARTICLE,
            None,
            Arc::new(StaticFetcher),
            2,
        )
        .await
        .unwrap();

        let assets = temp_dir.path().join("Story.textbundle").join("assets");
        assert_eq!(report.bundles.len(), 1);
        assert_eq!(report.assets_fetched, 1);
        assert_eq!(report.assets_failed.len(), 1);
        assert_eq!(fs::read(assets.join("0.png")).unwrap(), b"PNG");
        assert!(!assets.join("1.png").exists());
    }

    #[tokio::test]
    async fn test_save_bundle_uses_base_and_routes() {
        let temp_dir = TempDir::new().unwrap();
        let vault = temp_dir.path().join("vault");
        let mirror = temp_dir.path().join("mirror");
        let router = OutputRouter::new(temp_dir.path(), Vec::new());

        save_bundle(
            &router,
            BundleKind::Markdown,
            "Note",
            "text",
            Some(&vault),
            Arc::new(StaticFetcher),
            1,
        )
        .await
        .unwrap();
        assert!(vault.join("Note").join("Note.md").exists());

        let router = OutputRouter::new(
            temp_dir.path(),
            vec![EnhancedOutput {
                extension: "textbundle".to_string(),
                path: Some(mirror.clone()),
            }],
        );
        save_bundle(
            &router,
            BundleKind::TextBundle,
            "Note",
            "text",
            None,
            Arc::new(StaticFetcher),
            1,
        )
        .await
        .unwrap();
        assert!(mirror.join("Note.textbundle").join("text.markdown").exists());
        assert!(!temp_dir.path().join("Note.textbundle").exists());
    }
}
