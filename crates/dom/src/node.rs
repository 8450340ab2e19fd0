use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag used for highlight wrapper elements.
pub const HIGHLIGHT_TAG: &str = "span";

/// Handle to a node owned by a [`DocumentTree`](crate::DocumentTree).
///
/// Handles stay valid for the lifetime of the tree; a removed node keeps its
/// handle but is no longer reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Marker carried by highlight wrapper elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightMark {
    pub id: String,
    pub color: String,
}

impl HighlightMark {
    pub fn new(id: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
        }
    }
}
