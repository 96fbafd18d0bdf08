//! readsync Core Library
//!
//! This crate provides the core functionality for readsync, the local
//! companion server of a browser reading extension: the synchronized
//! settings document, the read-later list stored inside it, and the files
//! the extension saves to disk.
//!
//! # Architecture
//!
//! - **JSON document**: source of truth, owned by the extension. Only the
//!   `unrdist` key (the read-later list) is interpreted here.
//! - **Output directory**: saved articles named `<idx>-<title>.<ext>`,
//!   cleaned up when their entry leaves the list.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = UnreadStore::open(&config)?;
//!
//! // Add a link
//! let idx = store.add_one(NewEntry { url, title, ..Default::default() })?;
//!
//! // Query the list
//! let recent = store.query(&Filter::All)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Read-later store (main entry point)
//! - `document`: The synchronized JSON document
//! - `models`: Read-later entries
//! - `allocator`: Index allocation for new entries
//! - `reconcile`: Output cleanup after deletions
//! - `query`: Named list filters
//! - `reading`: Saved article lookup
//! - `output`: Output routing per file extension
//! - `assets`, `bundle`: Markdown bundles with downloaded images
//! - `storage`: Atomic persistence and ETags
//! - `config`: Server configuration

pub mod allocator;
pub mod assets;
pub mod bundle;
pub mod config;
pub mod document;
pub mod models;
pub mod output;
pub mod query;
pub mod reading;
pub mod reconcile;
pub mod storage;
pub mod store;

pub use allocator::{NewEntry, ValidationError};
pub use assets::{AssetFetcher, HttpAssetFetcher};
pub use bundle::{BundleKind, BundleReport};
pub use config::Config;
pub use document::{ConfigDocument, DocumentError};
pub use models::UnreadEntry;
pub use output::{OutputError, OutputRouter};
pub use query::{Filter, QueryResult};
pub use storage::{DocumentPersistence, StorageError};
pub use store::{PullOutcome, PushOutcome, UnreadStore};
