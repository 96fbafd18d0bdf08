//! Document persistence
//!
//! Saves and loads the synchronized JSON document.
//! Uses atomic writes (write to temp file, then rename) so a concurrent
//! reader never sees a partially-written document.
//!
//! Storage location: `<sync_path>/simpread_config.json`

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use super::error::{StorageError, StorageResult};
use crate::document::ConfigDocument;

/// Persistence layer for the synchronized document
#[derive(Debug, Clone)]
pub struct DocumentPersistence {
    path: PathBuf,
}

impl DocumentPersistence {
    /// Create a persistence handler for the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the document exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the raw document bytes
    pub fn load_bytes(&self) -> StorageResult<Vec<u8>> {
        fs::read(&self.path).map_err(|e| StorageError::from_read(e, self.path.clone()))
    }

    /// Load and parse the document
    pub fn load(&self) -> StorageResult<ConfigDocument> {
        let bytes = self.load_bytes()?;
        ConfigDocument::from_slice(&bytes).map_err(|source| StorageError::InvalidFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// Load the document, creating an empty one if none exists
    pub fn load_or_create(&self) -> StorageResult<ConfigDocument> {
        match self.load() {
            Err(e) if e.is_not_found() => {
                let doc = ConfigDocument::new();
                self.save(&doc)?;
                info!("Created empty document at {:?}", self.path);
                Ok(doc)
            }
            other => other,
        }
    }

    /// Save a document using atomic write
    pub fn save(&self, doc: &ConfigDocument) -> StorageResult<()> {
        let bytes = doc.to_vec().map_err(|source| StorageError::InvalidFormat {
            path: self.path.clone(),
            source,
        })?;
        atomic_write(&self.path, &bytes)
    }

    /// Save raw bytes exactly as given, using atomic write
    pub fn save_raw(&self, bytes: &[u8]) -> StorageResult<()> {
        atomic_write(&self.path, bytes)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Same directory, so the rename stays on one filesystem
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{now, UnreadEntry};
    use tempfile::TempDir;

    fn persistence(temp_dir: &TempDir) -> DocumentPersistence {
        DocumentPersistence::new(temp_dir.path().join("simpread_config.json"))
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        assert!(!persistence.exists());
        assert!(persistence.load().unwrap_err().is_not_found());

        let mut doc = ConfigDocument::new();
        doc.prepend_entries(&[UnreadEntry::new(1, "https://example.com", "Example", &now())])
            .unwrap();
        persistence.save(&doc).unwrap();
        assert!(persistence.exists());

        let loaded = persistence.load().unwrap();
        let entries = loaded.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://example.com");
    }

    #[test]
    fn test_load_or_create_new() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        let doc = persistence.load_or_create().unwrap();
        assert!(persistence.exists());
        assert_eq!(doc, ConfigDocument::new());
        assert_eq!(persistence.load_bytes().unwrap(), b"{}");
    }

    #[test]
    fn test_load_or_create_keeps_existing() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);
        persistence.save_raw(br#"{"keep": true}"#).unwrap();

        let doc = persistence.load_or_create().unwrap();
        assert_eq!(doc.get("keep"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);
        persistence.save_raw(b"{\"unrdist\": [").unwrap();

        let err = persistence.load().unwrap_err();
        assert!(matches!(err, StorageError::InvalidFormat { .. }));

        // load_or_create must not overwrite a corrupt document
        assert!(persistence.load_or_create().is_err());
        assert_eq!(persistence.load_bytes().unwrap(), b"{\"unrdist\": [");
    }

    #[test]
    fn test_save_raw_keeps_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = persistence(&temp_dir);

        let payload = b"{ \"b\": 1,\n  \"a\": 2 }";
        persistence.save_raw(payload).unwrap();
        assert_eq!(persistence.load_bytes().unwrap(), payload);
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("file.json");

        atomic_write(&nested_path, b"{}").unwrap();

        assert!(nested_path.exists());
        assert!(!nested_path.with_file_name(".file.json.tmp").exists());
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "{}");
    }
}
