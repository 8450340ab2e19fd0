use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying key-value backend failed. Callers treat this as a
    /// transient I/O failure and abort the current operation.
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A key holds something other than a list of anchor records.
    #[error("stored value under {key:?} is not a list of anchors")]
    Corrupt { key: String },
    #[error("invalid import: {0}")]
    InvalidImport(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}
