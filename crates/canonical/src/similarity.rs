//! Similarity gate between stored anchor text and live document text.
//!
//! Structural paths are positional hints; a path can resolve perfectly and
//! still point at different words. Every structurally resolved range is
//! therefore compared against the text captured at creation time before it
//! is trusted.
//!
//! Two strings are similar when, after [`collapse_whitespace`]:
//! - they are equal, or
//! - their lengths (in chars) differ by at most the tolerance and the shorter
//!   one is a substring of the longer one.

use crate::whitespace::collapse_whitespace;

/// Maximum char-length drift accepted between normalized strings.
pub const DEFAULT_LENGTH_TOLERANCE: usize = 5;

/// Outcome of comparing two texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Similarity {
    /// Byte-for-byte identical.
    Exact,
    /// Identical once whitespace is collapsed.
    Normalized,
    /// One normalized string contains the other; `drift` chars differ.
    Contained { drift: usize },
    /// Not similar.
    Distinct,
}

impl Similarity {
    /// Whether the comparison should be accepted.
    pub fn is_match(self) -> bool {
        !matches!(self, Similarity::Distinct)
    }

    /// Whether the match needed any tolerance.
    pub fn is_tolerant(self) -> bool {
        matches!(self, Similarity::Normalized | Similarity::Contained { .. })
    }
}

/// Compare `a` and `b` with an explicit length tolerance.
///
/// The comparison is symmetric in its arguments.
pub fn compare_text(a: &str, b: &str, length_tolerance: usize) -> Similarity {
    if a == b {
        return Similarity::Exact;
    }

    let left = collapse_whitespace(a);
    let right = collapse_whitespace(b);
    if left == right {
        return Similarity::Normalized;
    }

    let left_len = left.chars().count();
    let right_len = right.chars().count();
    let drift = left_len.abs_diff(right_len);
    if drift > length_tolerance {
        return Similarity::Distinct;
    }

    let (shorter, longer) = if left_len <= right_len {
        (&left, &right)
    } else {
        (&right, &left)
    };
    if longer.contains(shorter.as_str()) {
        Similarity::Contained { drift }
    } else {
        Similarity::Distinct
    }
}

/// Default similarity test used to validate structural matches.
///
/// ```rust
/// use canonical::is_similar;
///
/// assert!(is_similar("hello  world", "hello world"));
/// assert!(is_similar("quick brown fox", "the quick brown fox"));
/// assert!(!is_similar("hello", "goodbye"));
/// ```
pub fn is_similar(a: &str, b: &str) -> bool {
    compare_text(a, b, DEFAULT_LENGTH_TOLERANCE).is_match()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflexive_for_assorted_inputs() {
        for text in ["", " ", "a", "hello world", "  tabs\tand\nnewlines ", "こんにちは"] {
            assert!(is_similar(text, text), "{text:?} must be similar to itself");
            assert_eq!(compare_text(text, text, 0), Similarity::Exact);
        }
    }

    #[test]
    fn symmetric_for_assorted_pairs() {
        let pairs = [
            ("hello world", "hello  world"),
            ("abc", "abcdef"),
            ("abc", "abcdefghij"),
            ("foo bar", "bar foo"),
            ("", "12345"),
            ("", "123456"),
        ];
        for (a, b) in pairs {
            assert_eq!(is_similar(a, b), is_similar(b, a), "{a:?} vs {b:?}");
            assert_eq!(compare_text(a, b, 5), compare_text(b, a, 5));
        }
    }

    #[test]
    fn whitespace_only_differences_are_normalized() {
        assert_eq!(
            compare_text("hello\n   world ", "hello world", 5),
            Similarity::Normalized
        );
    }

    #[test]
    fn containment_respects_tolerance() {
        assert_eq!(
            compare_text("brown fox", "brown fox!!", 5),
            Similarity::Contained { drift: 2 }
        );
        assert_eq!(
            compare_text("fox", "the quick fox", 5),
            Similarity::Distinct
        );
        assert_eq!(
            compare_text("fox", "the quick fox", 10),
            Similarity::Contained { drift: 10 }
        );
    }

    #[test]
    fn same_length_different_text_is_distinct() {
        assert_eq!(compare_text("abcde", "vwxyz", 5), Similarity::Distinct);
        assert!(!Similarity::Distinct.is_match());
        assert!(Similarity::Normalized.is_tolerant());
        assert!(!Similarity::Exact.is_tolerant());
    }
}
