//! The synchronized extension document
//!
//! The document is an arbitrary JSON object owned by the browser extension.
//! This module interprets exactly one key, `unrdist`, which holds the
//! read-later list newest-first. Every other key is carried through reads
//! and writes untouched, in its original order.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{IndexSet, UnreadEntry};

/// Key of the read-later list inside the document
pub const UNREAD_KEY: &str = "unrdist";

/// Errors raised when the document does not have the expected shape
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document root must be a JSON object")]
    NotAnObject,

    #[error("`unrdist` must be an array")]
    UnreadListNotArray,

    #[error("invalid read-later entry at position {position}: {source}")]
    InvalidEntry {
        position: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("no index left after {last}")]
    IndexExhausted { last: i64 },
}

/// A read-later entry and the JSON it was parsed from
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub entry: UnreadEntry,
    pub raw: Value,
}

impl AsRef<UnreadEntry> for StoredEntry {
    fn as_ref(&self) -> &UnreadEntry {
        &self.entry
    }
}

/// The extension's settings document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// Parse a document from a string
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        Self::from_slice(text.as_bytes())
    }

    /// Serialize the document
    pub fn to_vec(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(serde_json::to_vec(&self.root)?)
    }

    /// Get a top-level value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    fn unread_values(&self) -> Result<&[Value], DocumentError> {
        match self.root.get(UNREAD_KEY) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(DocumentError::UnreadListNotArray),
        }
    }

    /// All read-later entries, newest first
    pub fn entries(&self) -> Result<Vec<UnreadEntry>, DocumentError> {
        self.unread_values()?
            .iter()
            .enumerate()
            .map(|(position, value)| parse_entry(position, value))
            .collect()
    }

    /// All read-later entries with their stored JSON, newest first
    pub fn stored_entries(&self) -> Result<Vec<StoredEntry>, DocumentError> {
        self.unread_values()?
            .iter()
            .enumerate()
            .map(|(position, value)| {
                Ok(StoredEntry {
                    entry: parse_entry(position, value)?,
                    raw: value.clone(),
                })
            })
            .collect()
    }

    /// Number of read-later entries
    pub fn unread_len(&self) -> Result<usize, DocumentError> {
        Ok(self.unread_values()?.len())
    }

    /// The set of indexes currently in the list
    pub fn indexes(&self) -> Result<IndexSet, DocumentError> {
        Ok(self.entries()?.into_iter().map(|e| e.idx).collect())
    }

    /// The index the next added entry receives
    pub fn next_idx(&self) -> Result<i64, DocumentError> {
        match self.indexes()?.last() {
            None => Ok(1),
            Some(&last) => last
                .checked_add(1)
                .ok_or(DocumentError::IndexExhausted { last }),
        }
    }

    /// Insert entries at the front of the list
    ///
    /// `entries` are given in insertion order (oldest first); the last one
    /// ends up at position 0. Existing entries are kept as raw JSON.
    pub fn prepend_entries(&mut self, entries: &[UnreadEntry]) -> Result<(), DocumentError> {
        let existing = self.unread_values()?.to_vec();

        let mut list = Vec::with_capacity(existing.len() + entries.len());
        for entry in entries.iter().rev() {
            list.push(serde_json::to_value(entry)?);
        }
        list.extend(existing);

        self.root.insert(UNREAD_KEY.to_string(), Value::Array(list));
        Ok(())
    }
}

fn parse_entry(position: usize, value: &Value) -> Result<UnreadEntry, DocumentError> {
    UnreadEntry::deserialize(value).map_err(|source| DocumentError::InvalidEntry { position, source })
}
