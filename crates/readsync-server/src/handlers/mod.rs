//! Request handlers
//!
//! - `sync`: uid handshake and the settings document
//! - `files`: captured files, bundles and saved articles
//! - `unread`: the read-later API

pub mod files;
pub mod sync;
pub mod unread;
