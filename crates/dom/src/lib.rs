//! # Marky DOM
//!
//! The document side of the anchor engine: the [`DocumentTree`] capability a
//! host must provide, the [`StructuralPath`] element locator and its inverse,
//! and [`MemoryDocument`], an arena tree implementing the capability
//! including the wrap/unwrap transform.
//!
//! All offsets are char offsets into text-node contents.
//!
//! ```
//! use dom::{DocumentTree, HighlightMark, MemoryDocument};
//!
//! let (mut doc, body) = MemoryDocument::with_body();
//! let p = doc.append_element(body, "p").unwrap();
//! let text = doc.append_text(p, "Hello world").unwrap();
//!
//! let range = doc.create_range(text, 6, text, 11).unwrap();
//! assert_eq!(doc.range_text(&range).unwrap(), "world");
//!
//! doc.wrap_range(&range, &HighlightMark::new("h1", "yellow")).unwrap();
//! assert_eq!(doc.highlight_ids(), vec!["h1".to_string()]);
//! doc.unwrap_highlight("h1");
//! assert_eq!(doc.children(p).len(), 1);
//! ```

mod error;
mod memory;
mod node;
mod path;
mod range;
pub mod text;
mod tree;

pub use crate::error::{DomError, ParsePathError};
pub use crate::memory::MemoryDocument;
pub use crate::node::{HighlightMark, NodeId, HIGHLIGHT_TAG};
pub use crate::path::{PathRoot, PathStep, StructuralPath};
pub use crate::range::{Boundary, TextRange};
pub use crate::tree::DocumentTree;
