//! Char-indexed string helpers.
//!
//! Every offset in this workspace counts Unicode scalar values, never bytes,
//! so slicing goes through these helpers instead of raw byte ranges.

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the char at `char_index`, or `text.len()` past the end.
pub fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Slice `text` by char positions. Out-of-range bounds are clamped.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_index(text, start);
    let to = byte_index(text, end.max(start));
    &text[from..to]
}

/// The last `count` chars of `text`.
pub fn last_chars(text: &str, count: usize) -> &str {
    let len = char_len(text);
    char_slice(text, len.saturating_sub(count), len)
}

/// The first `count` chars of `text`.
pub fn first_chars(text: &str, count: usize) -> &str {
    char_slice(text, 0, count)
}
