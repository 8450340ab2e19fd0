//! Whitespace normalization utilities.
//!
//! Re-rendering a page routinely changes incidental whitespace (indentation
//! inside inline elements, `\n` vs. a single space, non-breaking spaces)
//! without changing what the reader sees. [`collapse_whitespace`] maps all of
//! those variants onto one representation so the similarity gate can compare
//! a stored anchor against live text.
//!
//! # Algorithm
//!
//! 1. Split text on any Unicode whitespace sequence
//! 2. Join segments with single ASCII spaces
//! 3. Result has no leading/trailing whitespace
//!
//! # Examples
//!
//! ```rust
//! use canonical::collapse_whitespace;
//!
//! let normalized = collapse_whitespace("  hello   world  ");
//! assert_eq!(normalized, "hello world");
//! ```

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// All Unicode whitespace characters are treated as delimiters, including
/// tabs, carriage returns and non-breaking spaces.
///
/// # Examples
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("hello\n\n\tworld"), "hello world");
/// assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
/// assert_eq!(collapse_whitespace("   \n\t   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// Returns `true` when `text` has no non-whitespace character.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}
