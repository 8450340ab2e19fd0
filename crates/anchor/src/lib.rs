//! # Marky anchors
//!
//! A text selection is persisted as an [`Anchor`]: the structural path and
//! char offset of both endpoints, the selected text, and a window of
//! surrounding context. [`resolve`] maps an anchor back onto a possibly
//! changed document in layers:
//!
//! 1. the stored paths and offsets, accepted if the live text is identical
//! 2. the same candidate, accepted if it passes the tolerant similarity gate
//! 3. a full-text search scored by how much stored context reappears
//!
//! ```
//! use anchor::{encode, resolve, AnchorConfig, HighlightColor, Strategy};
//! use dom::{DocumentTree, MemoryDocument};
//!
//! let (mut doc, body) = MemoryDocument::with_body();
//! let p = doc.append_element(body, "p").unwrap();
//! let text = doc.append_text(p, "The quick brown fox").unwrap();
//!
//! let cfg = AnchorConfig::default();
//! let range = doc.create_range(text, 4, text, 9).unwrap();
//! let anchor = encode(&doc, range, HighlightColor::Green, &cfg).unwrap();
//!
//! let found = resolve(&doc, &anchor, &cfg).unwrap();
//! assert_eq!(found.strategy, Strategy::Structural);
//! assert_eq!(doc.range_text(&found.range).unwrap(), "quick");
//! ```

mod codec;
mod color;
mod config;
mod content;
mod error;
mod resolve;
mod structural;
mod types;

pub use crate::codec::{
    capture_context, element_offset, encode, encode_selection, new_anchor_id, structural_path_for,
};
pub use crate::color::{HighlightColor, UnknownColor};
pub use crate::config::AnchorConfig;
pub use crate::content::{occurrences, resolve_by_content, ContentMatch, BASE_SCORE};
pub use crate::error::{AnchorError, ResolveError};
pub use crate::resolve::{resolve, Resolution, Strategy};
pub use crate::structural::{locate_text_node, resolve_structural, StructuralMatch};
pub use crate::types::Anchor;
