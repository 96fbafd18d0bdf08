//! Storage layer
//!
//! Handles persistence of the synchronized document.
//!
//! ## Architecture
//!
//! - **JSON document**: single source of truth, written atomically
//! - **ETag**: content hash of the bytes last read, for conditional pulls

pub mod error;
pub mod etag;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use etag::{compute_etag, matches_if_none_match};
pub use persistence::DocumentPersistence;
pub(crate) use persistence::atomic_write;
