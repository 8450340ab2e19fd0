use anchor::AnchorError;
use canonical::CanonicalError;
use dom::DomError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by [`crate::Highlighter`] operations.
#[derive(Debug, Error)]
pub enum HighlighterError {
    /// The first restoration pass has not completed yet.
    #[error("highlighter is not ready")]
    NotReady,
    #[error(transparent)]
    Identity(#[from] CanonicalError),
    #[error(transparent)]
    Anchor(#[from] AnchorError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Dom(#[from] DomError),
}
