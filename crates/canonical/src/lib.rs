//! Marky canonical text layer.
//!
//! Everything in this crate is a pure function of its input: no I/O, no clock
//! calls, no locale dependence.
//!
//! ## What we do
//!
//! - Whitespace normalization (collapses to single spaces)
//! - The similarity gate used to validate structurally resolved ranges
//! - Page identity derivation and the canonical/alias storage-key set
//! - SHA-256 digests for the legacy hashed key shape

mod error;
mod hash;
mod identity;
mod similarity;
mod whitespace;

pub use crate::error::CanonicalError;
pub use crate::hash::{hash_text, short_digest};
pub use crate::identity::{
    normalize_path, DocumentIdentity, KeySet, HASHED_KEY_PREFIX, KEY_PREFIX,
};
pub use crate::similarity::{compare_text, is_similar, Similarity, DEFAULT_LENGTH_TOLERANCE};
pub use crate::whitespace::{collapse_whitespace, is_blank};
