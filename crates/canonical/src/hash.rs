//! Hashing utilities for storage-key derivation.
//!
//! Older releases stored highlights under a hashed key instead of the raw
//! location. The digest is SHA-256 over the UTF-8 bytes, hex encoded and
//! truncated, so the same location always maps to the same key.
//!
//! ```rust
//! use canonical::{hash_text, short_digest};
//!
//! let full = hash_text("https://example.com/docs");
//! assert_eq!(full.len(), 64);
//! assert_eq!(short_digest("https://example.com/docs", 16), full[..16]);
//! ```

use sha2::{Digest, Sha256};

/// Hash arbitrary text with SHA-256 and return a hex digest.
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// First `len` hex characters of [`hash_text`]. `len` is capped at 64.
pub fn short_digest(text: &str, len: usize) -> String {
    let mut digest = hash_text(text);
    digest.truncate(len.min(64));
    digest
}
