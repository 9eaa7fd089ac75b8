use std::collections::BTreeMap;

use foundation::{Arena, Idx};

use crate::binding::FieldBinding;

pub type NodeId = Idx<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Div,
    H1,
    H3,
    H4,
    P,
    Img,
    Input,
    Ul,
    Li,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::H1 => "h1",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::P => "p",
            Tag::Img => "img",
            Tag::Input => "input",
            Tag::Ul => "ul",
            Tag::Li => "li",
        }
    }

    pub fn is_void(self) -> bool {
        matches!(self, Tag::Img | Tag::Input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Content {
    #[default]
    Empty,
    /// Inserted as text; never interpreted as markup.
    Text(String),
    /// Inserted as raw markup. No sanitization happens here.
    Markup(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: Tag,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub content: Content,
    pub attributes: BTreeMap<String, String>,
    pub binding: Option<FieldBinding>,
    pub hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            content: Content::Empty,
            attributes: BTreeMap::new(),
            binding: None,
            hidden: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() && !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.content = Content::Markup(markup.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_binding(mut self, binding: FieldBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Headless node tree the story is built into.
///
/// The browser shell mirrors it into real elements; tests and the static HTML
/// preview use it directly.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Arena<Node>,
    root: NodeId,
    legend: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub const ROOT_ID: &'static str = "story";

    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::new(Tag::Div).with_id(Self::ROOT_ID));
        Self {
            nodes,
            root,
            legend: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    pub fn append(&mut self, parent: NodeId, node: Node) -> NodeId {
        self.insert(parent, None, node)
    }

    /// Inserts `node` under `parent`, before `before` when it is a child of
    /// `parent`, otherwise at the end.
    pub fn insert(&mut self, parent: NodeId, before: Option<NodeId>, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.alloc(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            let at = before
                .and_then(|b| p.children.iter().position(|c| *c == b))
                .unwrap_or(p.children.len());
            p.children.insert(at, id);
        }
        id
    }

    /// Detaches and drops `id` with its subtree.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        let mut stack = node.children.clone();
        while let Some(child) = stack.pop() {
            if let Some(n) = self.nodes.remove(child) {
                stack.extend(n.children);
            }
        }
        Some(node)
    }

    /// Child that directly follows `id` under the same parent.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id)?.parent?;
        let siblings = self.children(parent);
        let at = siblings.iter().position(|c| *c == id)?;
        siblings.get(at + 1).copied()
    }

    /// Pre-order walk of the subtree rooted at `from`, `from` included.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    pub fn find_by_dom_id(&self, dom_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.node(*id).and_then(|n| n.id.as_deref()) == Some(dom_id))
    }

    pub fn with_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(|n| n.has_class(class)))
            .collect()
    }

    pub fn legend(&self) -> &[String] {
        &self.legend
    }

    pub(crate) fn legend_mut(&mut self) -> &mut Vec<String> {
        &mut self.legend
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Node, Tag};

    #[test]
    fn insert_before_places_node_in_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.append(root, Node::new(Tag::P).with_text("a"));
        let c = doc.append(root, Node::new(Tag::P).with_text("c"));
        let b = doc.insert(root, Some(c), Node::new(Tag::P).with_text("b"));
        assert_eq!(doc.children(root), &[a, b, c]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.next_sibling(c), None);
    }

    #[test]
    fn remove_drops_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.append(root, Node::new(Tag::Div));
        let inner = doc.append(outer, Node::new(Tag::P));
        assert_eq!(doc.len(), 3);
        doc.remove(outer);
        assert!(doc.node(inner).is_none());
        assert!(doc.children(root).is_empty());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn classes_are_not_duplicated() {
        let node = Node::new(Tag::Div).with_class("step").with_class("step");
        assert_eq!(node.classes, vec!["step"]);
    }

    #[test]
    fn finds_nodes_by_dom_id() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.append(root, Node::new(Tag::Div).with_id("chapter-a"));
        assert_eq!(doc.find_by_dom_id("chapter-a"), Some(a));
        assert_eq!(doc.find_by_dom_id("story"), Some(root));
        assert_eq!(doc.find_by_dom_id("missing"), None);
    }
}
