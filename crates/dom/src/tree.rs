use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::DomError;
use crate::node::{HighlightMark, NodeId};
use crate::path::StructuralPath;
use crate::range::{Boundary, TextRange};
use crate::text::{char_len, char_slice};

/// Host document capability consumed by the anchor engine.
///
/// Implementors expose a read view of an element/text tree plus the two
/// mutations the engine needs: wrapping a range in highlight elements and
/// removing those wrappers again. Everything else (document-order text walks,
/// range construction, path resolution) is provided on top of the required
/// methods and may be overridden when the host has a faster primitive.
pub trait DocumentTree {
    /// The document element.
    fn root(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name, `None` for text nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Unique identifier attribute of an element.
    fn element_id(&self, node: NodeId) -> Option<&str>;

    /// Contents of a text node, `None` for elements.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Mark carried by a highlight wrapper element.
    fn highlight(&self, node: NodeId) -> Option<&HighlightMark>;

    /// The user's current selection, if any.
    fn current_selection(&self) -> Option<TextRange>;

    /// Wrap `range` in highlight elements carrying `mark`.
    ///
    /// Returns the number of wrappers inserted; wrapping an id that is already
    /// present inserts nothing.
    fn wrap_range(&mut self, range: &TextRange, mark: &HighlightMark) -> Result<usize, DomError>;

    /// Remove every wrapper carrying `id`, merging the freed text back into
    /// its parent. Returns the number of wrappers removed.
    fn unwrap_highlight(&mut self, id: &str) -> usize;

    fn is_text(&self, node: NodeId) -> bool {
        self.text(node).is_some()
    }

    /// `root` and all of its descendants in document (pre-)order.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    fn text_nodes_in_order(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.is_text(*node))
            .collect()
    }

    /// Concatenated text of every text node under `node`.
    fn text_content(&self, node: NodeId) -> String {
        self.text_nodes_in_order(node)
            .into_iter()
            .filter_map(|text_node| self.text(text_node))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.element_id(*node) == Some(id))
    }

    fn resolve_element_by_path(&self, path: &StructuralPath) -> Option<NodeId> {
        path.resolve(self)
    }

    /// Nearest ancestor (or self) that is a highlight wrapper.
    fn enclosing_highlight(&self, node: NodeId) -> Option<&HighlightMark> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if let Some(mark) = self.highlight(candidate) {
                return Some(mark);
            }
            current = self.parent(candidate);
        }
        None
    }

    fn is_inside_highlight(&self, node: NodeId) -> bool {
        self.enclosing_highlight(node).is_some()
    }

    /// Ids of every highlight wrapper in the document, first occurrence order.
    fn highlight_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for node in self.descendants(self.root()) {
            if let Some(mark) = self.highlight(node) {
                if !ids.contains(&mark.id) {
                    ids.push(mark.id.clone());
                }
            }
        }
        ids
    }

    fn has_highlight(&self, id: &str) -> bool {
        self.descendants(self.root())
            .into_iter()
            .any(|node| self.highlight(node).is_some_and(|mark| mark.id == id))
    }

    /// Nearest element ancestor of `node` that is not a highlight wrapper.
    ///
    /// Elements are returned as-is unless they are wrappers themselves.
    fn addressable_element(&self, node: NodeId) -> Option<NodeId> {
        let mut current = if self.is_text(node) {
            self.parent(node)
        } else {
            Some(node)
        };
        while let Some(candidate) = current {
            if self.highlight(candidate).is_none() {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Child elements of `element`, looking through highlight wrappers.
    fn addressable_children(&self, element: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.children(element) {
            if self.is_text(child) {
                continue;
            }
            if self.highlight(child).is_some() {
                out.extend(self.addressable_children(child));
            } else {
                out.push(child);
            }
        }
        out
    }

    /// Position of every attached node in document order.
    fn document_order(&self) -> HashMap<NodeId, usize> {
        self.descendants(self.root())
            .into_iter()
            .enumerate()
            .map(|(position, node)| (node, position))
            .collect()
    }

    /// Order two boundaries; `None` if either node is detached.
    fn compare_boundaries(&self, a: &Boundary, b: &Boundary) -> Option<Ordering> {
        let order = self.document_order();
        let left = order.get(&a.node)?;
        let right = order.get(&b.node)?;
        Some(left.cmp(right).then(a.offset.cmp(&b.offset)))
    }

    /// `range` with `start <= end`, swapping reversed endpoints.
    fn normalize_range(&self, range: TextRange) -> Result<TextRange, DomError> {
        match self.compare_boundaries(&range.start, &range.end) {
            Some(Ordering::Greater) => Ok(range.reversed()),
            Some(_) => Ok(range),
            None => {
                let detached = if self.document_order().contains_key(&range.start.node) {
                    range.end.node
                } else {
                    range.start.node
                };
                Err(DomError::DetachedNode(detached))
            }
        }
    }

    /// Validate both boundaries and build a forward range.
    fn create_range(
        &self,
        start_node: NodeId,
        start_offset: usize,
        end_node: NodeId,
        end_offset: usize,
    ) -> Result<TextRange, DomError> {
        for (node, offset) in [(start_node, start_offset), (end_node, end_offset)] {
            let text = self.text(node).ok_or(DomError::NotText(node))?;
            let len = char_len(text);
            if offset > len {
                return Err(DomError::OffsetOutOfBounds { node, offset, len });
            }
        }
        let range = TextRange::new(
            Boundary::new(start_node, start_offset),
            Boundary::new(end_node, end_offset),
        );
        match self.compare_boundaries(&range.start, &range.end) {
            Some(Ordering::Greater) => Err(DomError::InvertedRange),
            Some(_) => Ok(range),
            None => Err(DomError::DetachedNode(start_node)),
        }
    }

    /// Live text covered by a forward range.
    fn range_text(&self, range: &TextRange) -> Result<String, DomError> {
        let nodes = self.text_nodes_in_order(self.root());
        let first = nodes
            .iter()
            .position(|node| *node == range.start.node)
            .ok_or(DomError::DetachedNode(range.start.node))?;
        let last = nodes
            .iter()
            .position(|node| *node == range.end.node)
            .ok_or(DomError::DetachedNode(range.end.node))?;
        if last < first {
            return Err(DomError::InvertedRange);
        }

        let mut out = String::new();
        for (position, node) in nodes.iter().enumerate().take(last + 1).skip(first) {
            let text = self.text(*node).unwrap_or_default();
            let from = if position == first { range.start.offset } else { 0 };
            let to = if position == last {
                range.end.offset
            } else {
                char_len(text)
            };
            out.push_str(char_slice(text, from, to));
        }
        Ok(out)
    }
}
