use crate::binding::{FieldKind, FieldOwner};
use crate::document::{Content, Document, Node, NodeId};
use crate::html::{escape_text, strip_tags};

pub const CONTENT_EDITABLE: &str = "contenteditable";
pub const DATA_FIELD: &str = "data-field";
pub const DATA_CHAPTER_ID: &str = "data-chapter-id";
pub const EDITABLE_CLASS: &str = "editable-content";
pub const CHAPTER_TITLE_CLASS: &str = "chapter-title";
pub const IMAGE_INPUT_CLASS: &str = "image-url-input";

/// Mutable view of the rendered story.
///
/// [`Document`] implements it headlessly; the browser shell implements it over
/// live elements. Reads go to whatever the user currently sees, which is why
/// field values are read through the surface and not from the configuration.
pub trait Surface {
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Adds or strips the in-place editing marks of a bound node.
    fn set_editable(&mut self, node: NodeId, editable: bool);
    fn is_editable(&self, node: NodeId) -> bool;

    fn insert_node(&mut self, parent: NodeId, before: Option<NodeId>, node: Node) -> NodeId;
    fn remove_node(&mut self, node: NodeId);
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;
    fn first_child(&self, node: NodeId) -> Option<NodeId>;

    /// Current value of a field node, `None` when the node is gone.
    fn read_field(&self, node: NodeId, kind: FieldKind) -> Option<String>;

    /// Points an image at `src`, or hides it for `None`.
    fn set_image_source(&mut self, node: NodeId, src: Option<&str>);

    fn show_legend(&mut self, entries: &[String]);
    fn clear_legend(&mut self);
}

/// Applies or strips the editing marks on `node` in place.
pub fn mark_editable(node: &mut Node, editable: bool) {
    if editable {
        node.attributes
            .insert(CONTENT_EDITABLE.to_string(), "true".to_string());
        if let Some(binding) = &node.binding {
            node.attributes
                .insert(DATA_FIELD.to_string(), binding.field.name().to_string());
            if let FieldOwner::Chapter(id) = &binding.owner {
                node.attributes
                    .insert(DATA_CHAPTER_ID.to_string(), id.to_string());
            }
        }
        let is_chapter_title = node.binding.as_ref().is_some_and(|b| {
            b.chapter_id().is_some() && b.field == crate::binding::Field::Title
        });
        let class = if is_chapter_title {
            CHAPTER_TITLE_CLASS
        } else {
            EDITABLE_CLASS
        };
        if !node.has_class(class) {
            node.classes.push(class.to_string());
        }
    } else {
        node.attributes.remove(CONTENT_EDITABLE);
        node.attributes.remove(DATA_FIELD);
        node.attributes.remove(DATA_CHAPTER_ID);
        node.classes
            .retain(|c| c != EDITABLE_CLASS && c != CHAPTER_TITLE_CLASS);
    }
}

impl Surface for Document {
    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.node_mut(node) {
            if !n.has_class(class) {
                n.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.node_mut(node) {
            n.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node).is_some_and(|n| n.has_class(class))
    }

    fn set_editable(&mut self, node: NodeId, editable: bool) {
        if let Some(n) = self.node_mut(node) {
            mark_editable(n, editable);
        }
    }

    fn is_editable(&self, node: NodeId) -> bool {
        self.node(node)
            .is_some_and(|n| n.attr(CONTENT_EDITABLE) == Some("true"))
    }

    fn insert_node(&mut self, parent: NodeId, before: Option<NodeId>, node: Node) -> NodeId {
        self.insert(parent, before, node)
    }

    fn remove_node(&mut self, node: NodeId) {
        self.remove(node);
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        Document::next_sibling(self, node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    fn read_field(&self, node: NodeId, kind: FieldKind) -> Option<String> {
        let n = self.node(node)?;
        let value = match (kind, &n.content) {
            (FieldKind::Url, _) => n.attr("value").unwrap_or_default().to_string(),
            (_, Content::Empty) => String::new(),
            (FieldKind::Text, Content::Text(t)) => t.clone(),
            (FieldKind::Text, Content::Markup(m)) => strip_tags(m),
            (FieldKind::Markup, Content::Markup(m)) => m.clone(),
            (FieldKind::Markup, Content::Text(t)) => escape_text(t),
        };
        Some(value)
    }

    fn set_image_source(&mut self, node: NodeId, src: Option<&str>) {
        if let Some(n) = self.node_mut(node) {
            match src {
                Some(src) => {
                    n.attributes.insert("src".to_string(), src.to_string());
                    n.hidden = false;
                }
                None => n.hidden = true,
            }
        }
    }

    fn show_legend(&mut self, entries: &[String]) {
        *self.legend_mut() = entries.to_vec();
    }

    fn clear_legend(&mut self) {
        self.legend_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{CHAPTER_TITLE_CLASS, DATA_CHAPTER_ID, DATA_FIELD, EDITABLE_CLASS, Surface};
    use crate::binding::{Field, FieldBinding, FieldKind};
    use crate::document::{Document, Node, Tag};
    use foundation::ChapterId;

    #[test]
    fn editing_marks_round_trip() {
        let mut doc = Document::new();
        let root = doc.root();
        let id = ChapterId::new("a");
        let title = doc.append(
            root,
            Node::new(Tag::H3)
                .with_text("T")
                .with_binding(FieldBinding::chapter(&id, Field::Title)),
        );

        doc.set_editable(title, true);
        let n = doc.node(title).unwrap();
        assert!(doc.is_editable(title));
        assert_eq!(n.attr(DATA_FIELD), Some("title"));
        assert_eq!(n.attr(DATA_CHAPTER_ID), Some("a"));
        assert!(n.has_class(CHAPTER_TITLE_CLASS));

        doc.set_editable(title, false);
        let n = doc.node(title).unwrap();
        assert!(!doc.is_editable(title));
        assert_eq!(n.attr(DATA_FIELD), None);
        assert!(!n.has_class(CHAPTER_TITLE_CLASS));
    }

    #[test]
    fn header_fields_get_generic_class_and_no_chapter_id() {
        let mut doc = Document::new();
        let root = doc.root();
        let byline = doc.append(
            root,
            Node::new(Tag::P)
                .with_text("by")
                .with_binding(FieldBinding::header(Field::Byline)),
        );
        doc.set_editable(byline, true);
        let n = doc.node(byline).unwrap();
        assert!(n.has_class(EDITABLE_CLASS));
        assert_eq!(n.attr(DATA_CHAPTER_ID), None);
    }

    #[test]
    fn reads_text_markup_and_url() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append(root, Node::new(Tag::P).with_markup("<b>x</b> &amp; y"));
        let input = doc.append(root, Node::new(Tag::Input).with_attr("value", "u.png"));
        assert_eq!(doc.read_field(p, FieldKind::Markup).unwrap(), "<b>x</b> &amp; y");
        assert_eq!(doc.read_field(p, FieldKind::Text).unwrap(), "x & y");
        assert_eq!(doc.read_field(input, FieldKind::Url).unwrap(), "u.png");
        doc.remove(p);
        assert_eq!(doc.read_field(p, FieldKind::Text), None);
    }

    #[test]
    fn hiding_an_image_keeps_its_source() {
        let mut doc = Document::new();
        let root = doc.root();
        let img = doc.append(root, Node::new(Tag::Img).with_attr("src", "a.png"));
        doc.set_image_source(img, None);
        assert!(doc.node(img).unwrap().hidden);
        assert_eq!(doc.node(img).unwrap().attr("src"), Some("a.png"));
        doc.set_image_source(img, Some("b.png"));
        assert!(!doc.node(img).unwrap().hidden);
        assert_eq!(doc.node(img).unwrap().attr("src"), Some("b.png"));
    }
}
