//! Content hashes for conditional retrieval

use sha2::{Digest, Sha256};

/// Compute the entity tag of a document body
///
/// Lowercase hex SHA-256, so identical bytes always give the same tag.
pub fn compute_etag(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Whether an `If-None-Match` header value names `etag`
///
/// Accepts the bare tag, a quoted or weak tag, and comma separated lists.
pub fn matches_if_none_match(header: &str, etag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*"
            || candidate
                .trim_start_matches("W/")
                .trim_matches('"')
                .eq(etag)
    })
}
