//! Markup tree data model.
//!
//! A component's markup is held as a tree: a synthetic root whose children
//! are the top-level nodes of the fragment. Nodes live in a `StableDiGraph`
//! so indices stay valid across removals, and edges represent
//! parent→child containment. Every element carries an `ElementKey` that
//! survives edits and is used to find the element again after the DOM
//! reports a click on it.

use crate::id::ElementKey;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A single `name="value"` pair. Names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes in source order (4 inline before heap alloc).
    pub attrs: SmallVec<[Attribute; 4]>,
    pub key: ElementKey,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing the existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self
                .attrs
                .push(Attribute::new(name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    /// The `class` attribute, or empty.
    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or_default()
    }

    /// The `id` attribute, or empty.
    pub fn html_id(&self) -> &str {
        self.attr("id").unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// Fragment root. Never serialized itself.
    Root,
    Element(Element),
    /// Decoded character data.
    Text(String),
    Comment(String),
}

impl MarkupNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

// ─── Tree ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MarkupTree {
    pub graph: StableDiGraph<MarkupNode, ()>,
    pub root: NodeIndex,

    /// Index from ElementKey → NodeIndex for fast lookup.
    key_index: HashMap<ElementKey, NodeIndex>,
    next_key: u32,
}

impl MarkupTree {
    /// Create an empty tree holding only the fragment root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(MarkupNode::Root);
        Self {
            graph,
            root,
            key_index: HashMap::new(),
            next_key: 0,
        }
    }

    /// Append an element under `parent`. Returns the new node's index.
    pub fn add_element(
        &mut self,
        parent: NodeIndex,
        tag: &str,
        attrs: SmallVec<[Attribute; 4]>,
    ) -> NodeIndex {
        let key = ElementKey(self.next_key);
        self.next_key += 1;
        let idx = self.graph.add_node(MarkupNode::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
            key,
        }));
        self.graph.add_edge(parent, idx, ());
        self.key_index.insert(key, idx);
        idx
    }

    pub fn add_text(&mut self, parent: NodeIndex, text: impl Into<String>) -> NodeIndex {
        let idx = self.graph.add_node(MarkupNode::Text(text.into()));
        self.graph.add_edge(parent, idx, ());
        idx
    }

    pub fn add_comment(&mut self, parent: NodeIndex, text: impl Into<String>) -> NodeIndex {
        let idx = self.graph.add_node(MarkupNode::Comment(text.into()));
        self.graph.add_edge(parent, idx, ());
        idx
    }

    /// Remove a node and everything below it, keeping the key index in sync.
    /// The root cannot be removed. Returns the number of nodes removed.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> usize {
        if idx == self.root || !self.graph.contains_node(idx) {
            return 0;
        }
        let mut stack = vec![idx];
        let mut doomed = Vec::new();
        while let Some(current) = stack.pop() {
            stack.extend(
                self.graph
                    .neighbors_directed(current, petgraph::Direction::Outgoing),
            );
            doomed.push(current);
        }
        for node in &doomed {
            if let Some(MarkupNode::Element(el)) = self.graph.remove_node(*node) {
                self.key_index.remove(&el.key);
            }
        }
        doomed.len()
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in document order.
    ///
    /// Sorted by `NodeIndex`. Nodes are only ever appended after their
    /// earlier siblings, and the one path that reuses freed slots
    /// (`set_text_content`) first empties the parent, so index order is
    /// insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        self.graph.node_weight(idx).and_then(MarkupNode::as_element)
    }

    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        match self.graph.node_weight_mut(idx) {
            Some(MarkupNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Look up an element by its key.
    pub fn index_of_key(&self, key: ElementKey) -> Option<NodeIndex> {
        self.key_index.get(&key).copied()
    }

    /// All elements in depth-first document order.
    pub fn elements(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.children(self.root).into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            if self.element(idx).is_some() {
                out.push(idx);
                stack.extend(self.children(idx).into_iter().rev());
            }
        }
        out
    }

    /// Concatenated text of all descendant text nodes (DOM `textContent`).
    pub fn text_content(&self, idx: NodeIndex) -> String {
        let mut out = String::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            match self.graph.node_weight(current) {
                Some(MarkupNode::Text(text)) => out.push_str(text),
                Some(MarkupNode::Element(_)) | Some(MarkupNode::Root) => {
                    stack.extend(self.children(current).into_iter().rev());
                }
                _ => {}
            }
        }
        out
    }

    /// Replace every child of `idx` with a single text node.
    /// An empty string leaves the node without children.
    pub fn set_text_content(&mut self, idx: NodeIndex, text: &str) {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        if !text.is_empty() {
            self.add_text(idx, text);
        }
    }

    /// Number of live elements.
    pub fn element_count(&self) -> usize {
        self.key_index.len()
    }
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}
