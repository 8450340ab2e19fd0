//! # Marky store
//!
//! Persistence for anchors. [`KeyValueStore`] is the async capability a host
//! provides (an in-memory map and a redb file are bundled); [`AnchorStore`]
//! layers the alias-aware merge, dedup and multi-key edit logic on top;
//! [`ExportBundle`] is the portable file format.

mod anchor_store;
mod backend;
mod error;
mod export;

pub use crate::anchor_store::{AnchorStore, ImportSummary};
pub use crate::backend::{BackendConfig, InMemoryStore, KeyValueStore};
#[cfg(feature = "backend-redb")]
pub use crate::backend::RedbStore;
pub use crate::error::StoreError;
pub use crate::export::{
    sanitize_filename, suggested_filename, ExportBundle, HighlightStats, EXPORT_SOURCE,
    EXPORT_VERSION,
};
