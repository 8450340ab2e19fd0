use dom::{DomError, NodeId};
use thiserror::Error;

/// Errors raised while creating or validating anchors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("no text is selected")]
    NoSelection,
    #[error("selection is collapsed")]
    CollapsedSelection,
    #[error("selection contains only whitespace")]
    WhitespaceOnly,
    #[error("node {0} has no addressable element ancestor")]
    Unaddressable(NodeId),
    #[error("invalid anchor configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid anchor record: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Signals produced while mapping an anchor back onto a document.
///
/// `StructuralMiss` and `StructuralMismatch` only route resolution to the
/// content search; `AnchorUnresolvable` means the anchor is skipped for the
/// current pass. None of them is ever shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("structural miss: {0}")]
    StructuralMiss(&'static str),
    #[error("structural mismatch: expected {expected:?}, found {found:?}")]
    StructuralMismatch { expected: String, found: String },
    #[error("anchor text not found in document")]
    AnchorUnresolvable,
}
