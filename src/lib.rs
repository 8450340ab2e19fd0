//! Workspace umbrella crate for Marky, a resilient text highlighter engine.
//!
//! A highlight is persisted as a portable [`Anchor`] and restored onto a
//! possibly changed document by layered resolution: the stored structural
//! path first, a tolerant text comparison next, and a context-scored full-text
//! search last. [`Highlighter`] ties the pieces together for one document.
//!
//! ```
//! use marky::{DocumentTree, HighlightColor, Highlighter, InMemoryStore, MarkyConfig, MemoryDocument};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let (mut doc, body) = MemoryDocument::with_body();
//! let p = doc.append_element(body, "p").unwrap();
//! let text = doc.append_text(p, "Highlights should outlive page edits.").unwrap();
//!
//! let mut highlighter = Highlighter::new(
//!     doc,
//!     InMemoryStore::new(),
//!     "https://example.com/article",
//!     MarkyConfig::default(),
//! )
//! .unwrap();
//! highlighter.init().await.unwrap();
//!
//! let range = highlighter.document().create_range(text, 0, text, 10).unwrap();
//! let anchor = highlighter.highlight_range(range, HighlightColor::Pink).await.unwrap();
//! assert_eq!(anchor.text, "Highlights");
//! # });
//! ```

pub mod config;
mod debounce;
mod error;
mod highlighter;

pub use anchor::{
    encode, encode_selection, resolve, resolve_by_content, resolve_structural, Anchor,
    AnchorConfig, AnchorError, HighlightColor, Resolution, ResolveError, Strategy,
};
pub use canonical::{compare_text, is_similar, CanonicalError, DocumentIdentity, KeySet, Similarity};
pub use dom::{
    DocumentTree, DomError, HighlightMark, MemoryDocument, NodeId, StructuralPath, TextRange,
};
pub use store::{
    AnchorStore, BackendConfig, ExportBundle, HighlightStats, ImportSummary, InMemoryStore,
    KeyValueStore, StoreError,
};

pub use crate::config::{ConfigLoadError, MarkyConfig};
pub use crate::debounce::Debouncer;
pub use crate::error::HighlighterError;
pub use crate::highlighter::{Highlighter, RestoreReport, RestoreState};
