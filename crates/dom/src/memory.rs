//! Arena-backed in-memory document.
//!
//! `MemoryDocument` is the reference [`DocumentTree`] implementation: it is
//! what the engine's tests run against and what a host without a live DOM
//! (server-side rendering, offline re-anchoring of exported highlights) can
//! build from parsed markup.

use tracing::debug;

use crate::error::DomError;
use crate::node::{HighlightMark, NodeId, HIGHLIGHT_TAG};
use crate::range::TextRange;
use crate::text::{byte_index, char_len};
use crate::tree::DocumentTree;

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        id: Option<String>,
        highlight: Option<HighlightMark>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeSlot>,
    root: NodeId,
    selection: Option<TextRange>,
}

impl MemoryDocument {
    /// A document containing only a root element named `root_tag`.
    pub fn new(root_tag: &str) -> Self {
        let root = NodeSlot {
            data: NodeData::Element {
                tag: root_tag.to_ascii_lowercase(),
                id: None,
                highlight: None,
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId::new(0),
            selection: None,
        }
    }

    /// `<html><body></body></html>`; returns the document and the body.
    pub fn with_body() -> (Self, NodeId) {
        let mut doc = Self::new("html");
        let body = doc.push_element(doc.root, "body", None);
        (doc, body)
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        self.check_element(parent)?;
        Ok(self.push_element(parent, tag, None))
    }

    pub fn append_element_with_id(
        &mut self,
        parent: NodeId,
        tag: &str,
        id: &str,
    ) -> Result<NodeId, DomError> {
        self.check_element(parent)?;
        Ok(self.push_element(parent, tag, Some(id.to_string())))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        self.check_element(parent)?;
        let node = self.alloc(NodeData::Text(text.to_string()));
        self.attach(parent, node, None);
        Ok(node)
    }

    /// Insert a new element as the `index`-th child of `parent`.
    pub fn insert_element(
        &mut self,
        parent: NodeId,
        index: usize,
        tag: &str,
    ) -> Result<NodeId, DomError> {
        self.check_element(parent)?;
        let node = self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            id: None,
            highlight: None,
        });
        self.attach(parent, node, Some(index));
        Ok(node)
    }

    /// Replace the contents of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.slot_mut(node)?.data {
            NodeData::Text(contents) => {
                *contents = text.to_string();
                Ok(())
            }
            NodeData::Element { .. } => Err(DomError::NotText(node)),
        }
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root {
            return Err(DomError::NotElement(node));
        }
        self.slot(node)?;
        self.detach(node);
        Ok(())
    }

    pub fn set_selection(&mut self, range: TextRange) {
        self.selection = Some(range);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Split a text node at `offset`; the original keeps the prefix and the
    /// returned node (inserted right after it) holds the suffix.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self.text(node).ok_or(DomError::NotText(node))?;
        let len = char_len(text);
        if offset > len {
            return Err(DomError::OffsetOutOfBounds { node, offset, len });
        }
        let parent = self.parent(node).ok_or(DomError::DetachedNode(node))?;

        let split_at = byte_index(text, offset);
        let suffix = text[split_at..].to_string();
        if let NodeData::Text(contents) = &mut self.slot_mut(node)?.data {
            contents.truncate(split_at);
        }

        let position = self.child_position(parent, node);
        let right = self.alloc(NodeData::Text(suffix));
        self.attach(parent, right, position.map(|p| p + 1));
        Ok(right)
    }

    /// Merge adjacent text nodes and drop empty ones under `node`, recursively.
    pub fn normalize(&mut self, node: NodeId) {
        let children = match self.nodes.get(node.index()) {
            Some(slot) => slot.children.clone(),
            None => return,
        };

        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            match self.nodes[child.index()].data.clone() {
                NodeData::Text(contents) => {
                    if contents.is_empty() {
                        self.nodes[child.index()].parent = None;
                        continue;
                    }
                    let previous_text = kept
                        .last()
                        .filter(|prev| matches!(self.nodes[prev.index()].data, NodeData::Text(_)))
                        .copied();
                    match previous_text {
                        Some(prev) => {
                            if let NodeData::Text(prev_contents) = &mut self.nodes[prev.index()].data
                            {
                                prev_contents.push_str(&contents);
                            }
                            self.nodes[child.index()].parent = None;
                        }
                        None => kept.push(child),
                    }
                }
                NodeData::Element { .. } => {
                    self.normalize(child);
                    kept.push(child);
                }
            }
        }
        self.nodes[node.index()].children = kept;
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn push_element(&mut self, parent: NodeId, tag: &str, id: Option<String>) -> NodeId {
        let node = self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            id,
            highlight: None,
        });
        self.attach(parent, node, None);
        node
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, index: Option<usize>) {
        self.nodes[node.index()].parent = Some(parent);
        let children = &mut self.nodes[parent.index()].children;
        match index {
            Some(index) if index < children.len() => children.insert(index, node),
            _ => children.push(node),
        }
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()]
                .children
                .retain(|child| *child != node);
        }
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes[parent.index()]
            .children
            .iter()
            .position(|candidate| *candidate == child)
    }

    fn slot(&self, node: NodeId) -> Result<&NodeSlot, DomError> {
        self.nodes
            .get(node.index())
            .ok_or(DomError::UnknownNode(node))
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut NodeSlot, DomError> {
        self.nodes
            .get_mut(node.index())
            .ok_or(DomError::UnknownNode(node))
    }

    fn check_element(&self, node: NodeId) -> Result<(), DomError> {
        match self.slot(node)?.data {
            NodeData::Element { .. } => Ok(()),
            NodeData::Text(_) => Err(DomError::NotElement(node)),
        }
    }

    /// Move the contiguous children `first..=last` of `parent` into a new wrapper.
    fn wrap_run(&mut self, parent: NodeId, first: NodeId, last: NodeId, mark: &HighlightMark) {
        let (Some(from), Some(to)) = (
            self.child_position(parent, first),
            self.child_position(parent, last),
        ) else {
            return;
        };
        let wrapper = self.alloc(NodeData::Element {
            tag: HIGHLIGHT_TAG.to_string(),
            id: None,
            highlight: Some(mark.clone()),
        });
        let moved: Vec<NodeId> = self.nodes[parent.index()]
            .children
            .splice(from..=to, [wrapper])
            .collect();
        for child in &moved {
            self.nodes[child.index()].parent = Some(wrapper);
        }
        self.nodes[wrapper.index()].children = moved;
        self.nodes[wrapper.index()].parent = Some(parent);
    }
}

impl DocumentTree for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|slot| slot.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.index())
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    fn element_id(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Element { id, .. } => id.as_deref(),
            NodeData::Text(_) => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Text(contents) => Some(contents),
            NodeData::Element { .. } => None,
        }
    }

    fn highlight(&self, node: NodeId) -> Option<&HighlightMark> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Element { highlight, .. } => highlight.as_ref(),
            NodeData::Text(_) => None,
        }
    }

    fn current_selection(&self) -> Option<TextRange> {
        self.selection
    }

    fn wrap_range(&mut self, range: &TextRange, mark: &HighlightMark) -> Result<usize, DomError> {
        if self.has_highlight(&mark.id) {
            debug!(highlight_id = %mark.id, "highlight already wrapped");
            return Ok(0);
        }
        let range = self.create_range(
            range.start.node,
            range.start.offset,
            range.end.node,
            range.end.offset,
        )?;
        if range.is_collapsed() {
            return Ok(0);
        }

        let (start_node, end_node) = (range.start.node, range.end.node);
        let mut created = Vec::new();
        if range.end.offset < char_len(self.text(end_node).unwrap_or_default()) {
            created.push(self.split_text(end_node, range.end.offset)?);
        }
        let first = if range.start.offset > 0 {
            let right = self.split_text(start_node, range.start.offset)?;
            created.push(right);
            right
        } else {
            start_node
        };
        let last = if start_node == end_node { first } else { end_node };

        let order = self.text_nodes_in_order(self.root);
        let from = order.iter().position(|node| *node == first);
        let to = order.iter().position(|node| *node == last);
        let segment: Vec<NodeId> = match (from, to) {
            (Some(from), Some(to)) if from <= to => order[from..=to]
                .iter()
                .copied()
                .filter(|node| !self.text(*node).unwrap_or_default().is_empty())
                .collect(),
            _ => Vec::new(),
        };

        for node in created {
            if self.text(node).is_some_and(str::is_empty) {
                self.detach(node);
            }
        }

        let (Some(&head), Some(&tail)) = (segment.first(), segment.last()) else {
            return Ok(0);
        };

        let wrapped = match (self.parent(head), self.parent(tail)) {
            (Some(head_parent), Some(tail_parent)) if head_parent == tail_parent => {
                self.wrap_run(head_parent, head, tail, mark);
                1
            }
            _ => {
                for node in &segment {
                    if let Some(parent) = self.parent(*node) {
                        self.wrap_run(parent, *node, *node, mark);
                    }
                }
                segment.len()
            }
        };
        debug!(highlight_id = %mark.id, wrappers = wrapped, "wrapped range");
        Ok(wrapped)
    }

    fn unwrap_highlight(&mut self, id: &str) -> usize {
        let wrappers: Vec<NodeId> = self
            .descendants(self.root)
            .into_iter()
            .filter(|node| self.highlight(*node).is_some_and(|mark| mark.id == id))
            .collect();

        let mut removed = 0;
        for wrapper in wrappers {
            let Some(parent) = self.parent(wrapper) else {
                continue;
            };
            let Some(position) = self.child_position(parent, wrapper) else {
                continue;
            };
            let children = std::mem::take(&mut self.nodes[wrapper.index()].children);
            for child in &children {
                self.nodes[child.index()].parent = Some(parent);
            }
            let _ = self.nodes[parent.index()]
                .children
                .splice(position..=position, children);
            self.nodes[wrapper.index()].parent = None;
            self.normalize(parent);
            removed += 1;
        }
        removed
    }
}
