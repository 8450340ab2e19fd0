//! Tunables for encoding and resolving anchors.
//!
//! The context windows are heuristics, not guarantees. Any combination is
//! accepted as long as the scoring order stays intact: a strong context match
//! must outscore a weak one, which must outscore no match at all.
//!
//! ```rust
//! use anchor::AnchorConfig;
//!
//! let cfg = AnchorConfig::default();
//! assert_eq!(cfg.context_window, 50);
//! assert!(cfg.validate().is_ok());
//!
//! let broken = AnchorConfig { weak_bonus: 30, ..AnchorConfig::default() };
//! assert!(broken.validate().is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AnchorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Chars of context captured on each side of a selection at encode time.
    #[serde(default = "AnchorConfig::default_context_window")]
    pub context_window: usize,
    /// Chars inspected on each side of a candidate during content search.
    #[serde(default = "AnchorConfig::default_search_window")]
    pub search_window: usize,
    /// Context chars that must match verbatim for the strong bonus.
    #[serde(default = "AnchorConfig::default_strong_context_len")]
    pub strong_context_len: usize,
    /// Context chars that must match verbatim for the weak bonus.
    #[serde(default = "AnchorConfig::default_weak_context_len")]
    pub weak_context_len: usize,
    #[serde(default = "AnchorConfig::default_strong_bonus")]
    pub strong_bonus: u32,
    #[serde(default = "AnchorConfig::default_weak_bonus")]
    pub weak_bonus: u32,
    /// Char-length drift tolerated by the similarity gate.
    #[serde(default = "AnchorConfig::default_length_tolerance")]
    pub length_tolerance: usize,
}

impl AnchorConfig {
    pub(crate) fn default_context_window() -> usize {
        50
    }

    pub(crate) fn default_search_window() -> usize {
        100
    }

    pub(crate) fn default_strong_context_len() -> usize {
        30
    }

    pub(crate) fn default_weak_context_len() -> usize {
        15
    }

    pub(crate) fn default_strong_bonus() -> u32 {
        20
    }

    pub(crate) fn default_weak_bonus() -> u32 {
        10
    }

    pub(crate) fn default_length_tolerance() -> usize {
        canonical::DEFAULT_LENGTH_TOLERANCE
    }

    pub fn validate(&self) -> Result<(), AnchorError> {
        if self.weak_context_len == 0 {
            return Err(AnchorError::InvalidConfig(
                "weak_context_len must be greater than zero".into(),
            ));
        }
        if self.weak_context_len > self.strong_context_len {
            return Err(AnchorError::InvalidConfig(
                "weak_context_len must not exceed strong_context_len".into(),
            ));
        }
        if self.strong_context_len > self.context_window {
            return Err(AnchorError::InvalidConfig(
                "strong_context_len must not exceed context_window".into(),
            ));
        }
        if self.search_window == 0 {
            return Err(AnchorError::InvalidConfig(
                "search_window must be greater than zero".into(),
            ));
        }
        if self.weak_bonus == 0 || self.strong_bonus <= self.weak_bonus {
            return Err(AnchorError::InvalidConfig(
                "bonuses must satisfy strong_bonus > weak_bonus > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            context_window: Self::default_context_window(),
            search_window: Self::default_search_window(),
            strong_context_len: Self::default_strong_context_len(),
            weak_context_len: Self::default_weak_context_len(),
            strong_bonus: Self::default_strong_bonus(),
            weak_bonus: Self::default_weak_bonus(),
            length_tolerance: Self::default_length_tolerance(),
        }
    }
}
