//! Structural resolution: path + offset back to a live range.
//!
//! The stored path is a positional hint. A resolved candidate is only
//! accepted when its live text passes the similarity gate.

use canonical::{compare_text, is_blank, Similarity};
use dom::text::char_len;
use dom::{DocumentTree, NodeId, TextRange};

use crate::config::AnchorConfig;
use crate::error::ResolveError;
use crate::types::Anchor;

/// A structurally resolved candidate that passed the similarity gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMatch {
    pub range: TextRange,
    pub similarity: Similarity,
}

pub fn resolve_structural<T: DocumentTree + ?Sized>(
    tree: &T,
    anchor: &Anchor,
    cfg: &AnchorConfig,
) -> Result<StructuralMatch, ResolveError> {
    let start_path = anchor
        .start_path
        .as_ref()
        .ok_or(ResolveError::StructuralMiss("anchor has no start path"))?;
    let end_path = anchor
        .end_path
        .as_ref()
        .ok_or(ResolveError::StructuralMiss("anchor has no end path"))?;

    let start_element = tree
        .resolve_element_by_path(start_path)
        .ok_or(ResolveError::StructuralMiss("start path did not resolve"))?;
    let end_element = tree
        .resolve_element_by_path(end_path)
        .ok_or(ResolveError::StructuralMiss("end path did not resolve"))?;

    // Reversed offsets within one element come from records written before
    // ranges were normalized at encode time.
    let (start_offset, end_offset) = if start_element == end_element {
        (
            anchor.start_offset.min(anchor.end_offset),
            anchor.start_offset.max(anchor.end_offset),
        )
    } else {
        (anchor.start_offset, anchor.end_offset)
    };

    let (start_node, start_local) = locate_text_node(tree, start_element, start_offset)
        .ok_or(ResolveError::StructuralMiss("start element has no text"))?;
    let (end_node, end_local) = locate_text_node(tree, end_element, end_offset)
        .ok_or(ResolveError::StructuralMiss("end element has no text"))?;

    let range = tree
        .create_range(start_node, start_local, end_node, end_local)
        .map_err(|_| ResolveError::StructuralMiss("candidate range is invalid"))?;
    let found = tree
        .range_text(&range)
        .map_err(|_| ResolveError::StructuralMiss("candidate range is detached"))?;

    // Clamping can shrink the candidate to nothing, and an empty string is
    // contained in any short anchor text.
    if range.is_collapsed() || is_blank(&found) {
        return Err(ResolveError::StructuralMismatch {
            expected: anchor.text.clone(),
            found,
        });
    }

    let similarity = compare_text(&anchor.text, &found, cfg.length_tolerance);
    if !similarity.is_match() {
        return Err(ResolveError::StructuralMismatch {
            expected: anchor.text.clone(),
            found,
        });
    }
    Ok(StructuralMatch { range, similarity })
}

/// Map an element-relative char offset onto `(text node, local offset)`.
///
/// An offset that lands exactly between two nodes belongs to the earlier
/// one. Offsets past the end of the element's text clamp to the end of its
/// last text node, since content may have shrunk since the anchor was made.
pub fn locate_text_node<T: DocumentTree + ?Sized>(
    tree: &T,
    element: NodeId,
    offset: usize,
) -> Option<(NodeId, usize)> {
    let nodes = tree.text_nodes_in_order(element);
    let mut consumed = 0;
    for node in &nodes {
        let len = char_len(tree.text(*node)?);
        if consumed + len >= offset {
            return Some((*node, offset - consumed));
        }
        consumed += len;
    }

    let last = *nodes.last()?;
    Some((last, char_len(tree.text(last)?)))
}
