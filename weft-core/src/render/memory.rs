//! In-memory host.
//!
//! [`MemoryDocument`] is a small DOM-like tree kept in an arena: elements with
//! attributes and listeners, text nodes and comments, with parent links. It
//! implements [`Host`], so render effects can run without a browser, and it
//! offers the inspection helpers tests need (`text_content`, `to_html`,
//! serializable snapshots, event dispatch).
//!
//! Nodes are never freed; a detached node simply has no parent.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use super::host::{Host, Listener};

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

/// The event passed to listeners by [`MemoryDocument::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
    /// Event name, e.g. `click`.
    pub kind: String,
    /// Node the event was dispatched on.
    pub target: MemoryNode,
}

/// Kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Comment,
}

/// Serializable copy of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSnapshot {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<NodeSnapshot>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

enum NodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        listeners: Vec<(String, Listener<MemoryEvent>)>,
    },
    Text(String),
    Comment(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<MemoryNode>,
    children: Vec<MemoryNode>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn insert(&mut self, kind: NodeKind) -> MemoryNode {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        MemoryNode(self.nodes.len() - 1)
    }

    fn node(&self, node: MemoryNode) -> &NodeData {
        &self.nodes[node.0]
    }

    fn node_mut(&mut self, node: MemoryNode) -> &mut NodeData {
        &mut self.nodes[node.0]
    }

    fn detach(&mut self, node: MemoryNode) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).children.retain(|child| *child != node);
        }
    }
}

/// A DOM-like document held in memory.
///
/// Cloning shares the document.
#[derive(Clone, Default)]
pub struct MemoryDocument {
    arena: Rc<RefCell<Arena>>,
}

impl MemoryDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    /// Kind of `node`.
    pub fn node_type(&self, node: MemoryNode) -> NodeType {
        match self.arena.borrow().node(node).kind {
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
        }
    }

    /// Tag of an element; `None` for text and comments.
    pub fn tag(&self, node: MemoryNode) -> Option<String> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Value of an attribute on an element.
    pub fn attribute(&self, node: MemoryNode, name: &str) -> Option<String> {
        match &self.arena.borrow().node(node).kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// Current parent of `node`.
    pub fn parent(&self, node: MemoryNode) -> Option<MemoryNode> {
        self.arena.borrow().node(node).parent
    }

    /// Children of `node`, in order.
    pub fn children(&self, node: MemoryNode) -> Vec<MemoryNode> {
        self.arena.borrow().node(node).children.clone()
    }

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, node: MemoryNode) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        collect_text(&arena, node, &mut out);
        out
    }

    /// Markup for the subtree, for debugging and assertions.
    pub fn to_html(&self, node: MemoryNode) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        write_html(&arena, node, &mut out);
        out
    }

    /// Serializable copy of the subtree.
    pub fn snapshot(&self, node: MemoryNode) -> NodeSnapshot {
        let arena = self.arena.borrow();
        snapshot(&arena, node)
    }

    /// Invoke the `kind` listeners bound on `target`, in binding order.
    ///
    /// Events do not bubble. Returns the number of listeners invoked.
    pub fn dispatch(&self, target: MemoryNode, kind: &str) -> usize {
        let listeners: Vec<Listener<MemoryEvent>> = match &self.arena.borrow().node(target).kind {
            NodeKind::Element { listeners, .. } => listeners
                .iter()
                .filter(|(event, _)| event == kind)
                .map(|(_, listener)| Rc::clone(listener))
                .collect(),
            _ => Vec::new(),
        };

        let event = MemoryEvent {
            kind: kind.to_owned(),
            target,
        };
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }
}

fn collect_text(arena: &Arena, node: MemoryNode, out: &mut String) {
    let data = arena.node(node);
    match &data.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(_) => {}
        NodeKind::Element { .. } => {
            for child in &data.children {
                collect_text(arena, *child, out);
            }
        }
    }
}

fn write_html(arena: &Arena, node: MemoryNode, out: &mut String) {
    let data = arena.node(node);
    match &data.kind {
        NodeKind::Text(text) => out.push_str(&escape(text)),
        NodeKind::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        NodeKind::Element {
            tag, attributes, ..
        } => {
            let _ = write!(out, "<{tag}");
            for (name, value) in attributes {
                let _ = write!(out, " {name}=\"{}\"", escape(value));
            }
            out.push('>');
            for child in &data.children {
                write_html(arena, *child, out);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn snapshot(arena: &Arena, node: MemoryNode) -> NodeSnapshot {
    let data = arena.node(node);
    match &data.kind {
        NodeKind::Text(text) => NodeSnapshot::Text { text: text.clone() },
        NodeKind::Comment(text) => NodeSnapshot::Comment { text: text.clone() },
        NodeKind::Element {
            tag, attributes, ..
        } => NodeSnapshot::Element {
            tag: tag.clone(),
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            children: data
                .children
                .iter()
                .map(|child| snapshot(arena, *child))
                .collect(),
        },
    }
}

impl Host for MemoryDocument {
    type Node = MemoryNode;
    type Event = MemoryEvent;

    fn create_element(&self, tag: &str) -> MemoryNode {
        self.arena.borrow_mut().insert(NodeKind::Element {
            tag: tag.to_owned(),
            attributes: IndexMap::new(),
            listeners: Vec::new(),
        })
    }

    fn create_text_node(&self, text: &str) -> MemoryNode {
        self.arena
            .borrow_mut()
            .insert(NodeKind::Text(text.to_owned()))
    }

    fn create_comment(&self, text: &str) -> MemoryNode {
        self.arena
            .borrow_mut()
            .insert(NodeKind::Comment(text.to_owned()))
    }

    fn set_attribute(&self, node: &MemoryNode, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        match &mut arena.node_mut(*node).kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.to_owned(), value.to_owned());
            }
            _ => tracing::debug!(?node, name, "set_attribute on a non-element ignored"),
        }
    }

    fn add_event_listener(&self, node: &MemoryNode, event: &str, listener: Listener<MemoryEvent>) {
        let mut arena = self.arena.borrow_mut();
        match &mut arena.node_mut(*node).kind {
            NodeKind::Element { listeners, .. } => listeners.push((event.to_owned(), listener)),
            _ => tracing::debug!(?node, event, "add_event_listener on a non-element ignored"),
        }
    }

    fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        let mut arena = self.arena.borrow_mut();
        arena.detach(*child);
        arena.node_mut(*child).parent = Some(*parent);
        arena.node_mut(*parent).children.push(*child);
    }

    fn replace_child(&self, parent: &MemoryNode, new_child: &MemoryNode, old_child: &MemoryNode) {
        if new_child == old_child {
            return;
        }

        let mut arena = self.arena.borrow_mut();
        arena.detach(*new_child);

        let Some(index) = arena
            .node(*parent)
            .children
            .iter()
            .position(|child| child == old_child)
        else {
            tracing::debug!(?parent, ?old_child, "replace_child: old child not under parent");
            return;
        };

        arena.node_mut(*parent).children[index] = *new_child;
        arena.node_mut(*new_child).parent = Some(*parent);
        arena.node_mut(*old_child).parent = None;
    }

    fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        let mut arena = self.arena.borrow_mut();
        if arena.node(*child).parent == Some(*parent) {
            arena.detach(*child);
        }
    }

    fn parent_node(&self, node: &MemoryNode) -> Option<MemoryNode> {
        self.parent(*node)
    }
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("node_count", &self.node_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
