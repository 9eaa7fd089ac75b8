//! The live page as a [`Surface`].
//!
//! A [`Document`] mirror keeps structure, bindings and edit marks; every
//! change is applied to both the mirror and the matching DOM element. Field
//! values are always read from the DOM, since that is where the author types.

use std::collections::HashMap;

use scene::{Content, Document, FieldKind, Node, NodeId, Surface, Tag};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, HtmlInputElement};

use crate::mapbox::js_error_text;

pub const STORY_ELEMENT_ID: &str = "story";
pub const LEGEND_ELEMENT_ID: &str = "legend";

fn check(what: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        warn!(error = %js_error_text(&e), "{what} failed");
    }
}

pub struct DomSurface {
    mirror: Document,
    page: web_sys::Document,
    elements: HashMap<NodeId, Element>,
    legend: Option<Element>,
}

impl DomSurface {
    /// Creates elements for everything in `mirror` under the `#story` element.
    pub fn mount(mirror: Document, page: web_sys::Document) -> Result<Self, JsValue> {
        let story = page
            .get_element_by_id(STORY_ELEMENT_ID)
            .ok_or_else(|| JsValue::from_str("missing #story element"))?;
        let legend = page.get_element_by_id(LEGEND_ELEMENT_ID);

        let mut surface = Self {
            mirror,
            page,
            elements: HashMap::new(),
            legend,
        };
        let root = surface.mirror.root();
        surface.elements.insert(root, story);
        for node in surface.mirror.descendants(root).into_iter().skip(1) {
            let parent_el = surface
                .mirror
                .node(node)
                .and_then(|n| n.parent())
                .and_then(|p| surface.elements.get(&p).cloned());
            let Some(parent_el) = parent_el else {
                continue;
            };
            let el = surface.create(node)?;
            parent_el.append_child(&el)?;
            surface.elements.insert(node, el);
        }
        Ok(surface)
    }

    pub fn mirror(&self) -> &Document {
        &self.mirror
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(&node)
    }

    fn create(&self, id: NodeId) -> Result<Element, JsValue> {
        let node = self
            .mirror
            .node(id)
            .ok_or_else(|| JsValue::from_str("node vanished from mirror"))?;
        let el = self.page.create_element(node.tag.as_str())?;
        if let Some(dom_id) = &node.id {
            el.set_id(dom_id);
        }
        sync_marks(&el, node)?;
        match &node.content {
            Content::Empty => {}
            Content::Text(t) => el.set_text_content(Some(t)),
            Content::Markup(m) => el.set_inner_html(m),
        }
        if node.hidden {
            set_hidden(&el, true)?;
        }
        Ok(el)
    }

    /// Pushes the mirror's classes and attributes for `node` to its element.
    fn sync(&self, node: NodeId) {
        if let (Some(n), Some(el)) = (self.mirror.node(node), self.elements.get(&node)) {
            check("attribute sync", sync_marks(el, n));
        }
    }
}

fn sync_marks(el: &Element, node: &Node) -> Result<(), JsValue> {
    el.set_class_name(&node.classes.join(" "));
    let stale: Vec<String> = el
        .get_attribute_names()
        .iter()
        .filter_map(|a| a.as_string())
        .filter(|a| a != "id" && a != "class" && a != "style" && !node.attributes.contains_key(a))
        .collect();
    for name in stale {
        el.remove_attribute(&name)?;
    }
    for (name, value) in &node.attributes {
        el.set_attribute(name, value)?;
    }
    Ok(())
}

fn set_hidden(el: &Element, hidden: bool) -> Result<(), JsValue> {
    let Some(el) = el.dyn_ref::<HtmlElement>() else {
        return Ok(());
    };
    let style = el.style();
    if hidden {
        style.set_property("display", "none")
    } else {
        style.remove_property("display").map(|_| ())
    }
}

impl Surface for DomSurface {
    fn add_class(&mut self, node: NodeId, class: &str) {
        self.mirror.add_class(node, class);
        if let Some(el) = self.elements.get(&node) {
            check("add class", el.class_list().add_1(class));
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.mirror.remove_class(node, class);
        if let Some(el) = self.elements.get(&node) {
            check("remove class", el.class_list().remove_1(class));
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements
            .get(&node)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn set_editable(&mut self, node: NodeId, editable: bool) {
        self.mirror.set_editable(node, editable);
        self.sync(node);
    }

    fn is_editable(&self, node: NodeId) -> bool {
        self.mirror.is_editable(node)
    }

    fn insert_node(&mut self, parent: NodeId, before: Option<NodeId>, node: Node) -> NodeId {
        let id = self.mirror.insert(parent, before, node);
        let parent_el = self.elements.get(&parent).cloned();
        let before_el = before.and_then(|b| self.elements.get(&b).cloned());
        match (self.create(id), parent_el) {
            (Ok(el), Some(parent_el)) => {
                let placed = parent_el
                    .insert_before(&el, before_el.as_deref())
                    .map(|_| ());
                check("insert", placed);
                self.elements.insert(id, el);
            }
            (Err(e), _) => warn!(error = %js_error_text(&e), "could not create element"),
            (Ok(_), None) => warn!("parent has no element"),
        }
        id
    }

    fn remove_node(&mut self, node: NodeId) {
        for id in self.mirror.descendants(node) {
            if let Some(el) = self.elements.remove(&id) {
                if id == node {
                    el.remove();
                }
            }
        }
        self.mirror.remove(node);
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.mirror.next_sibling(node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.mirror.children(node).first().copied()
    }

    fn read_field(&self, node: NodeId, kind: FieldKind) -> Option<String> {
        let el = self.elements.get(&node)?;
        let value = match kind {
            FieldKind::Text => el.dyn_ref::<HtmlElement>()?.inner_text(),
            FieldKind::Markup => el.inner_html(),
            FieldKind::Url => el.dyn_ref::<HtmlInputElement>()?.value(),
        };
        Some(value)
    }

    fn set_image_source(&mut self, node: NodeId, src: Option<&str>) {
        self.mirror.set_image_source(node, src);
        let Some(el) = self.elements.get(&node) else {
            return;
        };
        match src {
            Some(src) => {
                check("image source", el.set_attribute("src", src));
                check("show image", set_hidden(el, false));
            }
            None => check("hide image", set_hidden(el, true)),
        }
    }

    fn show_legend(&mut self, entries: &[String]) {
        self.mirror.show_legend(entries);
        let Some(legend) = &self.legend else {
            return;
        };
        legend.set_inner_html("");
        let list = match self.page.create_element(Tag::Ul.as_str()) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %js_error_text(&e), "could not create legend");
                return;
            }
        };
        for entry in entries {
            match self.page.create_element(Tag::Li.as_str()) {
                Ok(item) => {
                    item.set_inner_html(entry);
                    check("legend entry", list.append_child(&item).map(|_| ()));
                }
                Err(e) => warn!(error = %js_error_text(&e), "could not create legend entry"),
            }
        }
        check("legend", legend.append_child(&list).map(|_| ()));
    }

    fn clear_legend(&mut self) {
        self.mirror.clear_legend();
        if let Some(legend) = &self.legend {
            legend.set_inner_html("");
        }
    }
}
