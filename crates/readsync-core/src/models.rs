//! Data models for the read-later list
//!
//! An [`UnreadEntry`] is one saved link as the browser extension stores it
//! under the `unrdist` key of the synchronized document.

use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Format of the `create` timestamp (e.g. `2022年10月14日 19:59:58`)
pub const CREATE_FORMAT: &str = "%Y年%m月%d日 %H:%M:%S";

/// Separator between tags in a form field
pub const TAG_SEPARATOR: char = ',';

/// Separator between urls/titles in a batch add
pub const BATCH_SEPARATOR: &str = ";;;";

/// Set of entry indexes known to be in the document
pub type IndexSet = BTreeSet<i64>;

/// A saved link in the read-later list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnreadEntry {
    /// Unique, never reused identifier
    #[serde(default)]
    pub idx: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favicon: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub img: String,
    /// Tags in insertion order; duplicates and empty tags are kept
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Local creation time in [`CREATE_FORMAT`]
    #[serde(default, deserialize_with = "null_as_default")]
    pub create: String,
    /// Fields written by the extension that this server does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UnreadEntry {
    /// Create an entry created at `created`
    pub fn new<Tz: TimeZone>(
        idx: i64,
        url: impl Into<String>,
        title: impl Into<String>,
        created: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            idx,
            url: url.into(),
            title: title.into(),
            desc: String::new(),
            note: String::new(),
            favicon: String::new(),
            img: String::new(),
            tags: Vec::new(),
            create: created.format(CREATE_FORMAT).to_string(),
            extra: Map::new(),
        }
    }

    /// Set the description
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Set the note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Replace the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Whether `tag` is one of the entry's tags (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether title, description or note contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.desc.contains(needle) || self.note.contains(needle)
    }

    /// Parse the `create` timestamp
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.create, CREATE_FORMAT).ok()
    }

    /// Calendar date of the `create` timestamp
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at().map(|dt| dt.date())
    }
}

/// Current local time, the clock used for `create` stamps
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Split a comma separated tag field
///
/// The split is literal: an empty field yields a single empty tag.
pub fn split_tags(field: &str) -> Vec<String> {
    field.split(TAG_SEPARATOR).map(str::to_string).collect()
}

/// Split a batch field on [`BATCH_SEPARATOR`]
pub fn split_batch(field: &str) -> Vec<String> {
    field.split(BATCH_SEPARATOR).map(str::to_string).collect()
}

impl AsRef<UnreadEntry> for UnreadEntry {
    fn as_ref(&self) -> &UnreadEntry {
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_entry_new_formats_create() {
        let created = Local.with_ymd_and_hms(2022, 10, 14, 19, 59, 58).unwrap();
        let entry = UnreadEntry::new(7, "https://example.com", "Example", &created);

        assert_eq!(entry.idx, 7);
        assert_eq!(entry.create, "2022年10月14日 19:59:58");
        assert!(entry.tags.is_empty());
        assert!(entry.favicon.is_empty());
    }

    #[test]
    fn test_created_on_round_trips_format() {
        let created = now() - Duration::days(1);
        let entry = UnreadEntry::new(1, "u", "t", &created);
        assert_eq!(entry.created_on(), Some(created.date_naive()));
    }

    #[test]
    fn test_unparsable_create() {
        let mut entry = UnreadEntry::new(1, "u", "t", &now());
        entry.create = "yesterday-ish".to_string();
        assert!(entry.created_on().is_none());
    }

    #[test]
    fn test_has_tag_is_exact() {
        let entry = UnreadEntry::new(1, "u", "t", &now())
            .with_tags(vec!["dr".to_string(), "rust".to_string()]);
        assert!(entry.has_tag("dr"));
        assert!(!entry.has_tag("d"));
        assert!(!entry.has_tag("Rust"));
    }

    #[test]
    fn test_contains_text_checks_desc_and_note() {
        let entry = UnreadEntry::new(1, "https://foo.example", "Title", &now())
            .with_desc("some foo here")
            .with_note("n");
        assert!(entry.contains_text("foo"));
        assert!(!entry.contains_text("FOO"));

        let entry = entry.with_desc("").with_note("foo note");
        assert!(entry.contains_text("foo"));
    }

    #[test]
    fn test_split_tags_keeps_empty() {
        assert_eq!(split_tags(""), vec![""]);
        assert_eq!(split_tags("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_batch() {
        assert_eq!(split_batch("a;;;b;;;c"), vec!["a", "b", "c"]);
        assert_eq!(split_batch("single"), vec!["single"]);
    }

    #[test]
    fn test_deserialize_keeps_unknown_fields() {
        let value = json!({
            "idx": 3,
            "url": "https://example.com",
            "title": "Example",
            "tags": null,
            "annotations": [1, 2],
        });

        let entry: UnreadEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.idx, 3);
        assert!(entry.tags.is_empty());
        assert_eq!(entry.extra.get("annotations"), Some(&json!([1, 2])));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["annotations"], json!([1, 2]));
        assert_eq!(back["desc"], json!(""));
    }
}
