//! Read-later store
//!
//! `UnreadStore` owns everything the sync protocol mutates: the document
//! on disk, the cached index set used to detect deletions, and the last
//! served ETag. Every operation is a complete read-modify-write, so callers
//! that share a store across tasks wrap it in a single mutex.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = UnreadStore::open(&config)?;
//!
//! let idx = store.add_one(NewEntry { url, title, ..Default::default() })?;
//! let today = store.query(&Filter::Daily)?;
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::allocator::{self, NewEntry};
use crate::config::Config;
use crate::document::ConfigDocument;
use crate::models::{self, IndexSet};
use crate::query::{self, Filter, QueryResult};
use crate::reading;
use crate::reconcile::{self, ReconcileReport};
use crate::storage::{compute_etag, matches_if_none_match, DocumentPersistence, StorageError};

/// Result of a pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The caller's copy is current
    NotModified { etag: String },
    /// The current document text and its ETag
    Document { etag: String, body: String },
}

/// Result of a full-document push
#[derive(Debug, Default)]
pub struct PushOutcome {
    /// Indexes present after the push
    pub indexes: IndexSet,
    /// Cleanup report, when auto-remove ran
    pub reconcile: Option<ReconcileReport>,
}

/// The read-later document store
pub struct UnreadStore {
    persistence: DocumentPersistence,
    output_dir: PathBuf,
    auto_remove: bool,
    /// Indexes seen in the document after the last write
    indexes: IndexSet,
    /// ETag of the document last served by a pull, cleared by writes
    /// through this store. Pulls always hash the file on disk; the cached
    /// value only flags edits made by other processes.
    etag: Option<String>,
}

impl UnreadStore {
    /// Open the store described by the configuration
    ///
    /// Fails when no sync path is configured.
    pub fn open(config: &Config) -> Result<Self> {
        let document_path = config
            .document_path()
            .context("No sync path configured")?;
        let output_dir = config.output_dir().context("No output path configured")?;
        Self::open_at(document_path, output_dir, config.auto_remove)
    }

    /// Open a store for an explicit document and output directory
    ///
    /// Creates an empty document on first run. A document that exists but
    /// does not parse is left untouched; the store starts with an empty
    /// index cache and every list operation reports the format error.
    pub fn open_at(
        document_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        auto_remove: bool,
    ) -> Result<Self> {
        let persistence = DocumentPersistence::new(document_path);

        let indexes = match persistence.load_or_create() {
            Ok(doc) => doc.indexes().unwrap_or_else(|e| {
                warn!("Read-later list in {:?} is malformed: {}", persistence.path(), e);
                IndexSet::new()
            }),
            Err(e @ StorageError::InvalidFormat { .. }) => {
                warn!("{}", e);
                IndexSet::new()
            }
            Err(e) => {
                return Err(e).context("Failed to load or create document");
            }
        };

        info!(
            "Opened document {:?} with {} read-later entries",
            persistence.path(),
            indexes.len()
        );

        Ok(Self {
            persistence,
            output_dir: output_dir.into(),
            auto_remove,
            indexes,
            etag: None,
        })
    }

    /// Path of the document on disk
    pub fn document_path(&self) -> &Path {
        self.persistence.path()
    }

    /// Output directory cleaned up by reconciliation
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Cached index set
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// ETag of the document last served, if still valid
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    // ==================== Sync ====================

    /// Serve the document unless the caller's copy is current
    pub fn pull(&mut self, if_none_match: Option<&str>) -> Result<PullOutcome> {
        let bytes = self
            .persistence
            .load_bytes()
            .context("Failed to read document")?;

        let etag = compute_etag(&bytes);
        if self.etag.as_ref().is_some_and(|last| *last != etag) {
            info!("Document {:?} was changed outside the server", self.document_path());
        }
        self.etag = Some(etag.clone());

        if if_none_match.is_some_and(|header| matches_if_none_match(header, &etag)) {
            debug!("Document unchanged ({})", etag);
            return Ok(PullOutcome::NotModified { etag });
        }

        let body = String::from_utf8(bytes).context("Document is not valid UTF-8")?;
        Ok(PullOutcome::Document { etag, body })
    }

    /// Replace the whole document with a payload from the extension
    ///
    /// The payload is stored byte for byte. When auto-remove is enabled the
    /// output files of entries missing from the payload are deleted.
    pub fn push(&mut self, payload: &str) -> Result<PushOutcome> {
        let doc = ConfigDocument::parse(payload)?;
        let indexes = doc.indexes()?;

        self.persistence
            .save_raw(payload.as_bytes())
            .context("Failed to write pushed document")?;
        self.etag = None;

        let reconcile = if self.auto_remove {
            let removed = reconcile::removed_indexes(&self.indexes, &indexes);
            match reconcile::remove_orphans(&self.output_dir, &removed) {
                Ok(report) => {
                    if !report.removed.is_empty() {
                        info!(
                            "Removed {} output files for deleted entries {:?}",
                            report.deleted.len(),
                            report.removed
                        );
                    }
                    Some(report)
                }
                Err(e) => {
                    warn!("Output cleanup skipped: {}", e);
                    None
                }
            }
        } else {
            None
        };

        self.indexes = indexes.clone();
        Ok(PushOutcome { indexes, reconcile })
    }

    // ==================== Entries ====================

    /// Add one entry, returning its index
    pub fn add_one(&mut self, new: NewEntry) -> Result<i64> {
        let mut doc = self.load_document()?;
        let idx = allocator::allocate_one(&mut doc, new, &models::now())?;

        self.persistence
            .save(&doc)
            .context("Failed to save document")?;
        self.indexes.insert(idx);
        self.etag = None;

        debug!("Added read-later entry {}", idx);
        Ok(idx)
    }

    /// Add a batch of entries sharing `tags`, returning their indexes
    pub fn add_batch(
        &mut self,
        urls: &[String],
        titles: &[String],
        tags: &[String],
    ) -> Result<Vec<i64>> {
        allocator::validate_batch(urls, titles)?;

        let mut doc = self.load_document()?;
        let idxs = allocator::allocate_batch(&mut doc, urls, titles, tags, &models::now())?;

        self.persistence
            .save(&doc)
            .context("Failed to save document")?;
        self.indexes.extend(idxs.iter().copied());
        self.etag = None;

        debug!("Added {} read-later entries", idxs.len());
        Ok(idxs)
    }

    // ==================== Queries ====================

    /// Evaluate a list filter against today's local date
    pub fn query(&self, filter: &Filter) -> Result<QueryResult> {
        self.query_on(filter, models::now().date_naive())
    }

    /// Evaluate a list filter with an explicit "today"
    pub fn query_on(&self, filter: &Filter, today: NaiveDate) -> Result<QueryResult> {
        if filter.reads_output() {
            let files = reading::reading_index(&self.output_dir)
                .context("Failed to list output directory")?;
            return Ok(QueryResult::Files(files));
        }

        if let Filter::Unknown(name) = filter {
            warn!("Unknown list filter {:?}", name);
            return Ok(QueryResult::Entries(Vec::new()));
        }

        let entries = self.load_document()?.stored_entries()?;
        Ok(QueryResult::Entries(
            query::filter_entries(filter, entries, today)
                .into_iter()
                .map(|stored| stored.raw)
                .collect(),
        ))
    }

    fn load_document(&self) -> Result<ConfigDocument> {
        Ok(self.persistence.load()?)
    }
}
