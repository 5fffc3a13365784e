//! URL handling module
//!
//! This module provides relative link resolution, the substring blocklist
//! applied to discovered links, and the URL hash used to name artifacts.

mod filter;
mod resolve;

use sha2::{Digest, Sha256};

// Re-export main functions
pub use filter::LinkFilter;
pub use resolve::resolve_href;

/// Computes the content address of a URL
///
/// The address is the lowercase hex SHA-256 digest of the URL string exactly
/// as given. No canonicalization happens first, so `https://a.test` and
/// `https://a.test/` name different artifacts.
///
/// # Examples
///
/// ```
/// use landing_crawler::url::hash_url;
///
/// let hash = hash_url("https://example.com/");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_url("https://example.com/"));
/// ```
pub fn hash_url(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
