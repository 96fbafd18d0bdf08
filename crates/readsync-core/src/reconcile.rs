//! Deletion reconciliation
//!
//! The extension owns deletion: it removes entries locally and pushes the
//! whole document. Comparing the index set before and after a push tells
//! which entries went away; their saved articles (`<idx>-*` files in the
//! output directory) are removed here. The document itself is never edited.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::IndexSet;
use crate::reading::list_names;
use crate::storage::{StorageError, StorageResult};

/// Outcome of one cleanup pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Indexes that disappeared from the list
    pub removed: IndexSet,
    /// Files that were deleted
    pub deleted: Vec<PathBuf>,
    /// Files that could not be deleted
    pub failed: Vec<StorageError>,
}

impl ReconcileReport {
    /// Whether every orphaned file was removed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Indexes present in `old` but missing from `new`
pub fn removed_indexes(old: &IndexSet, new: &IndexSet) -> IndexSet {
    old.difference(new).copied().collect()
}

/// Whether `name` is an output file of entry `idx`
fn belongs_to(name: &str, idx: i64) -> bool {
    name.strip_prefix(&idx.to_string())
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Delete the output files of every index in `removed`
///
/// Failing to list the directory is an error; failing to delete a single
/// file is recorded in the report and the pass continues.
pub fn remove_orphans(output_dir: &Path, removed: &IndexSet) -> StorageResult<ReconcileReport> {
    let mut report = ReconcileReport {
        removed: removed.clone(),
        ..ReconcileReport::default()
    };

    if removed.is_empty() {
        return Ok(report);
    }

    for name in list_names(output_dir)? {
        if !removed.iter().any(|&idx| belongs_to(&name, idx)) {
            continue;
        }

        let path = output_dir.join(&name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed orphaned output {:?}", path);
                report.deleted.push(path);
            }
            Err(source) => {
                warn!("Failed to remove orphaned output {:?}: {}", path, source);
                report.failed.push(StorageError::RemoveError { path, source });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(items: &[i64]) -> IndexSet {
        items.iter().copied().collect()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "x").unwrap();
    }

    #[test]
    fn test_removed_indexes_is_full_difference() {
        let old = set(&[1, 2, 3, 4, 5]);
        let new = set(&[1, 2, 4, 6]);
        assert_eq!(removed_indexes(&old, &new), set(&[3, 5]));
        assert!(removed_indexes(&new, &new).is_empty());
    }

    #[test]
    fn test_belongs_to_requires_dash() {
        assert!(belongs_to("3-title.html", 3));
        assert!(!belongs_to("31-title.html", 3));
        assert!(!belongs_to("3.html", 3));
        assert!(!belongs_to("x3-title.html", 3));
    }

    #[test]
    fn test_remove_orphans_deletes_every_removed_index() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        for name in [
            "1-keep.html",
            "3-gone.html",
            "3-gone.md",
            "4-keep.html",
            "5-gone.epub",
            "35-keep.html",
        ] {
            touch(dir, name);
        }
        fs::create_dir(dir.join("3-directory")).unwrap();

        let removed = removed_indexes(&set(&[1, 2, 3, 4, 5]), &set(&[1, 2, 4]));
        let report = remove_orphans(dir, &removed).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.removed, set(&[3, 5]));
        assert_eq!(report.deleted.len(), 3);

        let left = list_names(dir).unwrap();
        assert_eq!(left, vec!["1-keep.html", "35-keep.html", "4-keep.html"]);
        assert!(dir.join("3-directory").is_dir());
    }

    #[test]
    fn test_remove_orphans_nothing_removed_skips_listing() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let report = remove_orphans(&missing, &IndexSet::new()).unwrap();
        assert!(report.deleted.is_empty());
    }

    #[test]
    fn test_remove_orphans_missing_dir_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        assert!(remove_orphans(&missing, &set(&[1])).is_err());
    }
}
