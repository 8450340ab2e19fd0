use thiserror::Error;

use crate::node::NodeId;

/// Errors raised by document tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not a text node")]
    NotText(NodeId),
    #[error("node {0} is not an element")]
    NotElement(NodeId),
    #[error("offset {offset} is past the end of node {node} (length {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },
    #[error("node {0} is not attached to the document")]
    DetachedNode(NodeId),
    #[error("range end precedes its start")]
    InvertedRange,
}

/// Errors raised when parsing a serialized structural path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParsePathError {
    #[error("structural path is empty")]
    Empty,
    #[error("structural path {0:?} must start with '/' or id(\"...\")")]
    MissingRoot(String),
    #[error("invalid path step {0:?}, expected tag[index] with index >= 1")]
    BadStep(String),
    #[error("invalid identifier shortcut in {0:?}")]
    BadIdentifier(String),
}
