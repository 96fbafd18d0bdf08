//! Named list filters
//!
//! | filter    | result                                               |
//! |-----------|------------------------------------------------------|
//! | `all`     | the 20 most recent entries                           |
//! | `daily`   | entries created today (local date)                   |
//! | `dr`      | entries tagged `dr`                                  |
//! | `tag`     | entries tagged exactly `value`                       |
//! | `search`  | entries whose title, desc or note contain `value`    |
//! | `reading` | files in the output directory, not the list itself   |
//!
//! An unrecognised filter name yields an empty result.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::models::UnreadEntry;
use crate::reading::OutputFile;

/// Number of entries returned by `all`
pub const RECENT_LIMIT: usize = 20;

/// Tag behind the `dr` shortcut
pub const DR_TAG: &str = "dr";

/// A parsed list filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Daily,
    Dr,
    Tag(String),
    Search(String),
    Reading,
    Unknown(String),
}

impl Filter {
    /// Parse a filter name and its optional value
    pub fn parse(name: &str, value: Option<&str>) -> Self {
        let value = value.unwrap_or_default().to_string();
        match name {
            "all" => Filter::All,
            "daily" => Filter::Daily,
            "dr" => Filter::Dr,
            "tag" => Filter::Tag(value),
            "search" => Filter::Search(value),
            "reading" => Filter::Reading,
            other => Filter::Unknown(other.to_string()),
        }
    }

    /// Whether the filter reads the output directory instead of the list
    pub fn reads_output(&self) -> bool {
        matches!(self, Filter::Reading)
    }
}

/// Result of a list query
///
/// Serializes as a bare JSON array; the server wraps it in `{"data": ...}`.
/// Entries are the JSON objects exactly as stored in the document.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum QueryResult {
    Entries(Vec<Value>),
    Files(Vec<OutputFile>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Entries(entries) => entries.len(),
            QueryResult::Files(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Apply an entry filter to a newest-first list
///
/// `today` is the local calendar date used by `daily`. The `reading` and
/// unknown filters select nothing from the list.
pub fn filter_entries<T: AsRef<UnreadEntry>>(
    filter: &Filter,
    entries: Vec<T>,
    today: NaiveDate,
) -> Vec<T> {
    let keep = |e: &T| {
        let e = e.as_ref();
        match filter {
            Filter::All => true,
            Filter::Daily => e.created_on() == Some(today),
            Filter::Dr => e.has_tag(DR_TAG),
            Filter::Tag(tag) => e.has_tag(tag),
            Filter::Search(needle) => e.contains_text(needle),
            Filter::Reading | Filter::Unknown(_) => false,
        }
    };

    let matched = entries.into_iter().filter(keep);
    match filter {
        Filter::All => matched.take(RECENT_LIMIT).collect(),
        _ => matched.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now;
    use chrono::Duration;

    fn entry(idx: i64, tags: &[&str]) -> UnreadEntry {
        UnreadEntry::new(idx, format!("https://e{}.com", idx), format!("T{}", idx), &now())
            .with_tags(tags.iter().map(|t| t.to_string()).collect())
    }

    fn idxs(entries: &[UnreadEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.idx).collect()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    #[test]
    fn test_parse() {
        assert_eq!(Filter::parse("all", None), Filter::All);
        assert_eq!(Filter::parse("tag", Some("rust")), Filter::Tag("rust".into()));
        assert_eq!(Filter::parse("search", None), Filter::Search(String::new()));
        assert_eq!(Filter::parse("ALL", None), Filter::Unknown("ALL".into()));
        assert!(Filter::parse("reading", None).reads_output());
    }

    #[test]
    fn test_all_takes_first_twenty_in_order() {
        let entries: Vec<UnreadEntry> = (1..=25).rev().map(|i| entry(i, &[])).collect();
        let result = filter_entries(&Filter::All, entries, today());

        assert_eq!(result.len(), RECENT_LIMIT);
        assert_eq!(result[0].idx, 25);
        assert_eq!(result[19].idx, 6);
    }

    #[test]
    fn test_daily_excludes_yesterday() {
        let yesterday = now() - Duration::days(1);
        let old = UnreadEntry::new(1, "u", "old", &yesterday);
        let fresh = entry(2, &[]);
        let mut broken = entry(3, &[]);
        broken.create = String::new();

        let result = filter_entries(&Filter::Daily, vec![broken, fresh, old], today());
        assert_eq!(idxs(&result), vec![2]);
    }

    #[test]
    fn test_daily_uses_given_date() {
        let yesterday = now() - Duration::days(1);
        let old = UnreadEntry::new(1, "u", "old", &yesterday);

        let result = filter_entries(&Filter::Daily, vec![old], yesterday.date_naive());
        assert_eq!(idxs(&result), vec![1]);
    }

    #[test]
    fn test_tag_dr_equals_dr_shortcut() {
        let entries = vec![
            entry(4, &["dr", "x"]),
            entry(3, &["x"]),
            entry(2, &["dr"]),
            entry(1, &["drama"]),
        ];

        let by_shortcut = filter_entries(&Filter::Dr, entries.clone(), today());
        let by_tag = filter_entries(&Filter::Tag("dr".into()), entries, today());
        assert_eq!(by_shortcut, by_tag);
        assert_eq!(idxs(&by_tag), vec![4, 2]);
    }

    #[test]
    fn test_tag_matches_empty_tag() {
        let entries = vec![entry(2, &[""]), entry(1, &["a"])];
        let result = filter_entries(&Filter::Tag(String::new()), entries, today());
        assert_eq!(idxs(&result), vec![2]);
    }

    #[test]
    fn test_search_matches_desc_only() {
        let hit = entry(2, &[]).with_desc("all about foo");
        let miss = entry(1, &[]).with_desc("bar");

        let result = filter_entries(&Filter::Search("foo".into()), vec![hit, miss], today());
        assert_eq!(idxs(&result), vec![2]);
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let entries = vec![entry(1, &[]).with_note("Foo")];
        let result = filter_entries(&Filter::Search("foo".into()), entries, today());
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_filter_is_empty() {
        let entries = vec![entry(1, &["dr"])];
        let result = filter_entries(&Filter::Unknown("latest".into()), entries, today());
        assert!(result.is_empty());
    }

    #[test]
    fn test_query_result_serializes_as_array() {
        let stored = serde_json::json!({"url": "x", "idx": 1, "tags": null});
        let result = QueryResult::Entries(vec![stored.clone()]);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0], stored);
        assert!(QueryResult::Files(Vec::new()).is_empty());
    }
}
