//! Entry allocation
//!
//! Builds new read-later entries with fresh indexes and places them at the
//! head of the list. Indexes continue from the largest index present, so an
//! index is never handed out twice while its entry is still in the list.

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::document::{ConfigDocument, DocumentError};
use crate::models::UnreadEntry;

/// Rejected add requests
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("batch has {urls} urls but {titles} titles")]
    BatchLengthMismatch { urls: usize, titles: usize },
}

/// Fields supplied for a single add
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEntry {
    pub url: String,
    pub title: String,
    pub desc: String,
    pub note: String,
    pub tags: Vec<String>,
}

/// Check that a batch pairs every url with a title
pub fn validate_batch(urls: &[String], titles: &[String]) -> Result<(), ValidationError> {
    if urls.len() != titles.len() {
        return Err(ValidationError::BatchLengthMismatch {
            urls: urls.len(),
            titles: titles.len(),
        });
    }
    Ok(())
}

/// Add one entry to the document, returning its index
pub fn allocate_one(
    doc: &mut ConfigDocument,
    new: NewEntry,
    created: &DateTime<Local>,
) -> Result<i64, DocumentError> {
    let idx = doc.next_idx()?;
    let entry = UnreadEntry::new(idx, new.url, new.title, created)
        .with_desc(new.desc)
        .with_note(new.note)
        .with_tags(new.tags);

    doc.prepend_entries(&[entry])?;
    Ok(idx)
}

/// Add a batch of entries sharing `tags`, returning their indexes in order
///
/// The caller validates the batch first; extra urls or titles are never
/// silently dropped here because the lengths already match.
pub fn allocate_batch(
    doc: &mut ConfigDocument,
    urls: &[String],
    titles: &[String],
    tags: &[String],
    created: &DateTime<Local>,
) -> Result<Vec<i64>, DocumentError> {
    let first = doc.next_idx()?;
    let count = urls.len().min(titles.len());
    if count == 0 {
        return Ok(Vec::new());
    }

    // The whole run must fit before any entry is built
    let span = i64::try_from(count - 1).unwrap_or(i64::MAX);
    let last = first
        .checked_add(span)
        .ok_or(DocumentError::IndexExhausted { last: first - 1 })?;

    let entries: Vec<UnreadEntry> = urls
        .iter()
        .zip(titles)
        .zip(first..=last)
        .map(|((url, title), idx)| {
            UnreadEntry::new(idx, url.clone(), title.clone(), created).with_tags(tags.to_vec())
        })
        .collect();

    doc.prepend_entries(&entries)?;
    Ok(entries.iter().map(|e| e.idx).collect())
}
