//! Selection → [`Anchor`] encoding.
//!
//! Each endpoint of the range is stored as the structural path of its
//! nearest addressable element plus a char offset into that element's
//! concatenated text. Context windows are read from the endpoint text nodes
//! themselves.
//!
//! There is no `decode`: resolution ([`crate::resolve`]) is the inverse.

use canonical::is_blank;
use chrono::Utc;
use dom::text::{char_len, char_slice, first_chars, last_chars};
use dom::{Boundary, DocumentTree, NodeId, PathStep, StructuralPath, TextRange};
use tracing::debug;
use uuid::Uuid;

use crate::color::HighlightColor;
use crate::config::AnchorConfig;
use crate::error::AnchorError;
use crate::types::Anchor;

const ID_SUFFIX_LEN: usize = 9;

/// Encode the host's current selection.
pub fn encode_selection<T: DocumentTree + ?Sized>(
    tree: &T,
    color: HighlightColor,
    cfg: &AnchorConfig,
) -> Result<Anchor, AnchorError> {
    let range = tree.current_selection().ok_or(AnchorError::NoSelection)?;
    encode(tree, range, color, cfg)
}

/// Encode `range` into a fresh anchor.
///
/// Fails closed on collapsed, empty and whitespace-only ranges. Reversed
/// ranges are normalized first.
pub fn encode<T: DocumentTree + ?Sized>(
    tree: &T,
    range: TextRange,
    color: HighlightColor,
    cfg: &AnchorConfig,
) -> Result<Anchor, AnchorError> {
    if range.is_collapsed() {
        return Err(AnchorError::CollapsedSelection);
    }
    let range = tree.normalize_range(range)?;
    let text = tree.range_text(&range)?;
    if text.is_empty() {
        return Err(AnchorError::CollapsedSelection);
    }
    if is_blank(&text) {
        return Err(AnchorError::WhitespaceOnly);
    }

    let (start_element, start_offset) = element_offset(tree, &range.start)?;
    let (end_element, end_offset) = element_offset(tree, &range.end)?;
    let (context_before, context_after) = capture_context(tree, &range, cfg.context_window);

    let created_at = Utc::now().timestamp_millis();
    let anchor = Anchor {
        id: new_anchor_id(created_at),
        text,
        color,
        note: String::new(),
        start_path: Some(structural_path_for(tree, start_element)),
        start_offset,
        end_path: Some(structural_path_for(tree, end_element)),
        end_offset,
        context_before,
        context_after,
        created_at,
    };
    debug!(
        anchor_id = %anchor.id,
        start = ?anchor.start_path.as_ref().map(ToString::to_string),
        start_offset,
        end_offset,
        "encoded anchor"
    );
    Ok(anchor)
}

/// `highlight_<millis>_<9 hex chars>`.
pub fn new_anchor_id(created_at: i64) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_SUFFIX_LEN)
        .collect();
    format!("highlight_{created_at}_{suffix}")
}

/// Structural path of `element`.
///
/// Climbs towards the root emitting `tag[k]` steps and stops early at the
/// first element whose identifier resolves uniquely back to itself.
pub fn structural_path_for<T: DocumentTree + ?Sized>(tree: &T, element: NodeId) -> StructuralPath {
    let mut steps = Vec::new();
    let mut current = Some(element);

    while let Some(node) = current {
        if let Some(id) = tree
            .element_id(node)
            .filter(|id| StructuralPath::is_addressable_id(id))
        {
            if tree.element_by_id(id) == Some(node) {
                steps.reverse();
                return StructuralPath::from_id(id, steps);
            }
        }
        let Some(tag) = tree.tag_name(node) else {
            break;
        };

        let parent = tree
            .parent(node)
            .and_then(|parent| tree.addressable_element(parent));
        let index = match parent {
            Some(parent) => {
                1 + tree
                    .addressable_children(parent)
                    .into_iter()
                    .take_while(|sibling| *sibling != node)
                    .filter(|sibling| {
                        tree.tag_name(*sibling)
                            .is_some_and(|sibling_tag| sibling_tag.eq_ignore_ascii_case(tag))
                    })
                    .count()
            }
            None => 1,
        };
        steps.push(PathStep::new(tag, index));
        current = parent;
    }

    steps.reverse();
    StructuralPath::from_document(steps)
}

/// Resolve a text boundary to `(element, offset into the element's text)`.
pub fn element_offset<T: DocumentTree + ?Sized>(
    tree: &T,
    boundary: &Boundary,
) -> Result<(NodeId, usize), AnchorError> {
    let element = tree
        .addressable_element(boundary.node)
        .ok_or(AnchorError::Unaddressable(boundary.node))?;

    let preceding: usize = tree
        .text_nodes_in_order(element)
        .into_iter()
        .take_while(|node| *node != boundary.node)
        .filter_map(|node| tree.text(node))
        .map(char_len)
        .sum();
    Ok((element, preceding + boundary.offset))
}

/// Up to `window` chars before the start and after the end of `range`,
/// taken from the boundary text nodes. Missing text yields empty context.
pub fn capture_context<T: DocumentTree + ?Sized>(
    tree: &T,
    range: &TextRange,
    window: usize,
) -> (String, String) {
    let before = tree
        .text(range.start.node)
        .map(|text| last_chars(char_slice(text, 0, range.start.offset), window).to_string())
        .unwrap_or_default();
    let after = tree
        .text(range.end.node)
        .map(|text| {
            let tail = char_slice(text, range.end.offset, char_len(text));
            first_chars(tail, window).to_string()
        })
        .unwrap_or_default();
    (before, after)
}
