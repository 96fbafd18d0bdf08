//! Server configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/readsync/config.toml, or an explicit path)
//! 3. Environment variables (READSYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "READSYNC";

/// File name of the synchronized extension document inside `sync_path`
pub const DOCUMENT_FILE_NAME: &str = "simpread_config.json";

/// Name of the default output directory inside `sync_path`
const DEFAULT_OUTPUT_DIR: &str = "output";

/// An extra output destination for one file extension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnhancedOutput {
    /// File extension without the leading dot (e.g. `md`, `epub`)
    pub extension: String,
    /// Destination directory; `<output>/<extension>` when empty
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port of the extension-facing listener
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the read-later API listener
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the synchronized document
    #[serde(default)]
    pub sync_path: Option<PathBuf>,

    /// Directory for saved articles (defaults to `<sync_path>/output`)
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Delete output files of entries removed by a full push
    #[serde(default)]
    pub auto_remove: bool,

    /// Shared secret expected in the `uid` request header
    #[serde(default)]
    pub uid: Option<String>,

    /// Per-extension output destinations
    #[serde(default)]
    pub enhanced_output: Vec<EnhancedOutput>,

    /// Maximum number of concurrent asset downloads per bundle
    #[serde(default = "default_asset_concurrency")]
    pub asset_concurrency: usize,

    /// Log level used when RUST_LOG is not set
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            api_port: default_api_port(),
            sync_path: None,
            output_path: None,
            auto_remove: false,
            uid: None,
            enhanced_output: Vec::new(),
            asset_concurrency: default_asset_concurrency(),
            log_level: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (READSYNC_SYNC_PATH, READSYNC_PORT, ...)
    /// 2. Config file (~/.config/readsync/config.toml or READSYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Some(port) = env_var("PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }

        if let Some(port) = env_var("API_PORT").and_then(|v| v.parse().ok()) {
            self.api_port = port;
        }

        if let Some(val) = env_var("SYNC_PATH") {
            self.sync_path = non_empty(val).map(PathBuf::from);
        }

        if let Some(val) = env_var("OUTPUT_PATH") {
            self.output_path = non_empty(val).map(PathBuf::from);
        }

        if let Some(val) = env_var("AUTO_REMOVE") {
            self.auto_remove = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Some(val) = env_var("UID") {
            self.uid = non_empty(val);
        }

        if let Some(limit) = env_var("ASSET_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.asset_concurrency = limit;
        }

        // READSYNC_OUTPUT_PATH_<EXT>=<dir>
        let output_prefix = format!("{}_OUTPUT_PATH_", ENV_PREFIX);
        let mut extra: Vec<(String, String)> = std::env::vars()
            .filter_map(|(name, value)| {
                name.strip_prefix(&output_prefix)
                    .map(|ext| (ext.to_lowercase(), value))
            })
            .collect();
        extra.sort();
        for (extension, path) in extra {
            self.enhanced_output.push(EnhancedOutput {
                extension,
                path: non_empty(path).map(PathBuf::from),
            });
        }
    }

    /// Create the output directory if a sync path is configured
    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(dir) = self.output_dir() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        }
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with READSYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Some(path) = env_var("CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("readsync")
            .join("config.toml")
    }

    /// Path of the synchronized document, if a sync path is configured
    pub fn document_path(&self) -> Option<PathBuf> {
        self.sync_path
            .as_ref()
            .map(|dir| dir.join(DOCUMENT_FILE_NAME))
    }

    /// Default output directory
    pub fn output_dir(&self) -> Option<PathBuf> {
        match (&self.output_path, &self.sync_path) {
            (Some(output), _) => Some(output.clone()),
            (None, Some(sync)) => Some(sync.join(DEFAULT_OUTPUT_DIR)),
            (None, None) => None,
        }
    }

    /// Filter directive used when RUST_LOG is not set
    pub fn log_filter(&self) -> String {
        let level = self.log_level.as_deref().unwrap_or("info");
        format!(
            "readsync_core={level},readsync_server={level},tower_http={level}",
            level = level
        )
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix)).ok()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn default_port() -> u16 {
    7026
}

fn default_api_port() -> u16 {
    7027
}

fn default_asset_concurrency() -> usize {
    4
}
