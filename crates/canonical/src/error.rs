use thiserror::Error;

/// Errors that can occur while deriving a page identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid location {location:?}: {reason}")]
    InvalidUrl { location: String, reason: String },
    #[error("locations with scheme {0:?} cannot carry highlights")]
    UnsupportedScheme(String),
}
