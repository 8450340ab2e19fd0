//! Context-scored full-text search.
//!
//! Used when the structural locator misses or its text no longer matches.
//! Every literal occurrence of the anchor text in a text node that is not
//! already highlighted is a candidate. Candidates are scored by how much of
//! the stored context reappears around them; the highest score wins and
//! ties go to the earliest candidate in document order.

use dom::text::{char_len, char_slice, first_chars, last_chars};
use dom::{Boundary, DocumentTree, TextRange};

use crate::config::AnchorConfig;
use crate::error::ResolveError;
use crate::types::Anchor;

/// Score of a candidate with no context corroboration.
pub const BASE_SCORE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMatch {
    pub range: TextRange,
    pub score: u32,
}

pub fn resolve_by_content<T: DocumentTree + ?Sized>(
    tree: &T,
    anchor: &Anchor,
    cfg: &AnchorConfig,
) -> Result<ContentMatch, ResolveError> {
    if anchor.text.is_empty() {
        return Err(ResolveError::AnchorUnresolvable);
    }
    let needle_len = char_len(&anchor.text);
    let scored = anchor.has_context();
    let mut best: Option<ContentMatch> = None;

    for node in tree.text_nodes_in_order(tree.root()) {
        if tree.is_inside_highlight(node) {
            continue;
        }
        let Some(text) = tree.text(node) else {
            continue;
        };
        for start in occurrences(text, &anchor.text) {
            let end = start + needle_len;
            let range = TextRange::new(Boundary::new(node, start), Boundary::new(node, end));
            if !scored {
                return Ok(ContentMatch {
                    range,
                    score: BASE_SCORE,
                });
            }
            let score = score_candidate(text, start, end, anchor, cfg);
            if best.is_none_or(|current| score > current.score) {
                best = Some(ContentMatch { range, score });
            }
        }
    }

    best.ok_or(ResolveError::AnchorUnresolvable)
}

/// Char offsets of every occurrence of `needle` in `haystack`, overlapping
/// occurrences included.
pub fn occurrences(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut found = Vec::new();
    let mut chars_before = 0;
    let mut last_byte = 0;
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let byte = from + pos;
        chars_before += haystack[last_byte..byte].chars().count();
        last_byte = byte;
        found.push(chars_before);
        // Step one char, not one needle, so overlaps are reported.
        let step = haystack[byte..].chars().next().map_or(1, char::len_utf8);
        from = byte + step;
    }
    found
}

fn score_candidate(
    text: &str,
    start: usize,
    end: usize,
    anchor: &Anchor,
    cfg: &AnchorConfig,
) -> u32 {
    let before = last_chars(char_slice(text, 0, start), cfg.search_window);
    let after = first_chars(char_slice(text, end, char_len(text)), cfg.search_window);

    let before_bonus = context_bonus(before, &anchor.context_before, cfg, last_chars);
    let after_bonus = context_bonus(after, &anchor.context_after, cfg, first_chars);
    BASE_SCORE + before_bonus + after_bonus
}

/// `window` is the live text beside the candidate; `stored` is the context
/// captured at encode time. `edge` picks the part of `stored` that borders
/// the selection.
fn context_bonus(
    window: &str,
    stored: &str,
    cfg: &AnchorConfig,
    edge: fn(&str, usize) -> &str,
) -> u32 {
    if stored.is_empty() {
        return 0;
    }
    if window.contains(edge(stored, cfg.strong_context_len)) {
        cfg.strong_bonus
    } else if window.contains(edge(stored, cfg.weak_context_len)) {
        cfg.weak_bonus
    } else {
        0
    }
}
