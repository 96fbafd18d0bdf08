//! Saved articles in the output directory
//!
//! Lists the files the extension has saved and resolves a read-later entry
//! to its rendered article. Article files are named `<idx>-<title><suffix>`;
//! annotation exports carry an `@annote` marker and are never served as the
//! article itself.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::storage::{StorageError, StorageResult};

/// Format of the `create` field in a reading listing
pub const MODIFIED_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// Suffix looked up when the caller names none
pub const DEFAULT_SUFFIX: &str = ".html";

const ANNOTATION_MARKER: &str = "@annote";

/// A regular file in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFileInfo {
    pub name: String,
    pub modified: Option<DateTime<Local>>,
}

/// A listing row as returned to the extension
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutputFile {
    /// File name
    pub title: String,
    /// Last modification time in [`MODIFIED_FORMAT`]
    pub create: String,
}

impl From<OutputFileInfo> for OutputFile {
    fn from(info: OutputFileInfo) -> Self {
        Self {
            title: info.name,
            create: info
                .modified
                .map(|m| m.format(MODIFIED_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}

/// List the regular files in `dir`, sorted by name
pub fn list_files(dir: &Path) -> StorageResult<Vec<OutputFileInfo>> {
    let entries = fs::read_dir(dir).map_err(|e| StorageError::from_read(e, dir.to_path_buf()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::from_read(e, dir.to_path_buf()))?;
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            // Removed between read_dir and stat
            Err(_) => continue,
        };
        if metadata.is_dir() {
            continue;
        }
        files.push(OutputFileInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// File names in `dir`, sorted
pub fn list_names(dir: &Path) -> StorageResult<Vec<String>> {
    Ok(list_files(dir)?.into_iter().map(|f| f.name).collect())
}

/// Listing of `dir` with modification times
pub fn reading_index(dir: &Path) -> StorageResult<Vec<OutputFile>> {
    Ok(list_files(dir)?.into_iter().map(OutputFile::from).collect())
}

/// Pick the article file for `id`
///
/// The first name (in listing order) that is either an `<id>-` prefixed
/// article with `suffix` and no annotation marker, exactly `<id><suffix>`,
/// or exactly `<title><suffix>`.
pub fn find_article<'a, I>(names: I, id: &str, title: Option<&str>, suffix: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = format!("{}-", id);
    let by_id = format!("{}{}", id, suffix);
    let by_title = title.map(|t| format!("{}{}", t, suffix));

    names.into_iter().find(|name| {
        (name.starts_with(&prefix) && name.ends_with(suffix) && !name.contains(ANNOTATION_MARKER))
            || *name == by_id
            || by_title.as_deref() == Some(*name)
    })
}

/// Read the article for `id` from `dir`
///
/// Returns the file name and content, or `None` when nothing matches.
pub fn read_article(
    dir: &Path,
    id: &str,
    title: Option<&str>,
    suffix: &str,
) -> StorageResult<Option<(String, Vec<u8>)>> {
    let names = list_names(dir)?;
    let Some(name) = find_article(names.iter().map(String::as_str), id, title, suffix) else {
        return Ok(None);
    };

    let path = dir.join(name);
    let content = fs::read(&path).map_err(|e| StorageError::from_read(e, path.clone()))?;
    Ok(Some((name.to_string(), content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_list_files_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "2-b.html", "");
        touch(temp_dir.path(), "1-a.html", "");
        fs::create_dir(temp_dir.path().join("md")).unwrap();

        let names = list_names(temp_dir.path()).unwrap();
        assert_eq!(names, vec!["1-a.html", "2-b.html"]);
    }

    #[test]
    fn test_reading_index_has_modified_time() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "1-a.html", "x");

        let index = reading_index(temp_dir.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].title, "1-a.html");
        assert!(!index[0].create.is_empty());
    }

    #[test]
    fn test_list_missing_dir_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = list_files(&temp_dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_find_article_rules() {
        let names = [
            "12-notes@annote.html",
            "12-Rust Book.md",
            "12-Rust Book.html",
            "121-Other.html",
            "7.html",
            "Plain Title.html",
        ];

        assert_eq!(
            find_article(names, "12", None, ".html"),
            Some("12-Rust Book.html")
        );
        assert_eq!(find_article(names, "12", None, ".md"), Some("12-Rust Book.md"));
        assert_eq!(find_article(names, "7", None, ".html"), Some("7.html"));
        assert_eq!(
            find_article(names, "99", Some("Plain Title"), ".html"),
            Some("Plain Title.html")
        );
        assert_eq!(find_article(names, "1", None, ".html"), None);
    }

    #[test]
    fn test_read_article() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "3-story.html", "<p>story</p>");

        let (name, content) = read_article(temp_dir.path(), "3", None, DEFAULT_SUFFIX)
            .unwrap()
            .unwrap();
        assert_eq!(name, "3-story.html");
        assert_eq!(content, b"<p>story</p>");

        assert!(read_article(temp_dir.path(), "4", None, DEFAULT_SUFFIX)
            .unwrap()
            .is_none());
    }
}
