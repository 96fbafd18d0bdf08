//! Output routing
//!
//! Files captured by the extension are written to the default output
//! directory unless `enhanced_output` registers one or more destinations
//! for their extension. A destination without a path resolves to
//! `<output>/<extension>`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, EnhancedOutput};
use crate::storage::{atomic_write, StorageError};

/// Extension used for scratch files written by the extension
pub const TMP_EXTENSION: &str = "tmp";

const TMP_PREFIX: &str = "tmp-";

/// Errors raised while writing output files
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("invalid output name {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Whether `name` is a single path component that stays inside its directory
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Routing extension for a captured file
///
/// `tmp-` prefixed titles route as [`TMP_EXTENSION`]; titles without an
/// extension route as the empty extension.
pub fn extension_for_title(title: &str) -> &str {
    if title.starts_with(TMP_PREFIX) {
        return TMP_EXTENSION;
    }
    title.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// Outcome of writing one file to all of its destinations
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<StorageError>,
}

impl WriteReport {
    /// Whether at least one destination received the file
    pub fn any_written(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Maps file extensions to destination directories
#[derive(Debug, Clone)]
pub struct OutputRouter {
    default_dir: PathBuf,
    routes: Vec<EnhancedOutput>,
}

impl OutputRouter {
    pub fn new(default_dir: impl Into<PathBuf>, routes: Vec<EnhancedOutput>) -> Self {
        Self {
            default_dir: default_dir.into(),
            routes,
        }
    }

    /// Build a router from the configuration
    ///
    /// Returns `None` when no output directory can be derived.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .output_dir()
            .map(|dir| Self::new(dir, config.enhanced_output.clone()))
    }

    /// The default output directory
    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    /// Destinations for `extension`, falling back to the default directory
    pub fn route(&self, extension: &str) -> Vec<PathBuf> {
        self.route_with_base(extension, &self.default_dir)
    }

    /// Destinations for `extension`, falling back to `base`
    ///
    /// Registered destinations are created on demand; a directory that
    /// cannot be created is still returned so the write reports the failure.
    pub fn route_with_base(&self, extension: &str, base: &Path) -> Vec<PathBuf> {
        let paths: Vec<PathBuf> = self
            .routes
            .iter()
            .filter(|route| route.extension == extension)
            .map(|route| match &route.path {
                Some(path) if !path.as_os_str().is_empty() => path.clone(),
                _ => self.default_dir.join(extension),
            })
            .collect();

        if paths.is_empty() {
            return vec![base.to_path_buf()];
        }

        for path in &paths {
            if let Err(e) = fs::create_dir_all(path) {
                warn!("Failed to create output directory {:?}: {}", path, e);
            }
        }
        paths
    }

    /// Write a captured file to every destination of its extension
    ///
    /// A failed destination is logged and recorded; the others are still
    /// written.
    pub fn save_plain(&self, title: &str, content: &[u8]) -> Result<WriteReport, OutputError> {
        if !is_safe_name(title) {
            return Err(OutputError::InvalidName(title.to_string()));
        }

        let mut report = WriteReport::default();
        for dir in self.route(extension_for_title(title)) {
            let path = dir.join(title);
            match atomic_write(&path, content) {
                Ok(()) => {
                    debug!("Saved {:?}", path);
                    report.written.push(path);
                }
                Err(e) => {
                    warn!("Failed to save {:?}: {}", path, e);
                    report.failed.push(e);
                }
            }
        }
        Ok(report)
    }
}
