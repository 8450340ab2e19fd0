use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// A position inside a text node, counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A live range between two text-node boundaries.
///
/// Ranges handed out by the host may be reversed (the user dragged
/// backwards); use [`DocumentTree::normalize_range`](crate::DocumentTree::normalize_range)
/// before relying on `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl TextRange {
    pub const fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    pub const fn is_collapsed(&self) -> bool {
        self.start.node.index() == self.end.node.index() && self.start.offset == self.end.offset
    }

    /// The same range with its endpoints swapped.
    pub const fn reversed(self) -> Self {
        Self {
            start: self.end,
            end: self.start,
        }
    }
}
