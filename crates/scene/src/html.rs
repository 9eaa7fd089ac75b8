//! Static HTML rendering of a [`Document`], used by the CLI preview.

use std::fmt::Write as _;

use crate::document::{Content, Document, NodeId};

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Rough text content of a markup fragment: tags dropped, the five basic
/// entities decoded.
pub fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn render_html(doc: &Document) -> String {
    let mut out = String::new();
    write_node(&mut out, doc, doc.root(), 0);
    out
}

fn write_node(out: &mut String, doc: &Document, id: NodeId, depth: usize) {
    let Some(node) = doc.node(id) else { return };
    let pad = "  ".repeat(depth);
    let tag = node.tag.as_str();

    let _ = write!(out, "{pad}<{tag}");
    if let Some(dom_id) = &node.id {
        let _ = write!(out, " id=\"{}\"", escape_text(dom_id));
    }
    if !node.classes.is_empty() {
        let _ = write!(out, " class=\"{}\"", escape_text(&node.classes.join(" ")));
    }
    for (name, value) in &node.attributes {
        let _ = write!(out, " {name}=\"{}\"", escape_text(value));
    }
    if node.hidden {
        out.push_str(" style=\"display: none\"");
    }
    out.push('>');

    if node.tag.is_void() {
        out.push('\n');
        return;
    }

    match &node.content {
        Content::Empty => {}
        Content::Text(t) => out.push_str(&escape_text(t)),
        Content::Markup(m) => out.push_str(m),
    }
    if node.children().is_empty() {
        let _ = writeln!(out, "</{tag}>");
        return;
    }
    out.push('\n');
    for child in node.children() {
        write_node(out, doc, *child, depth + 1);
    }
    let _ = writeln!(out, "{pad}</{tag}>");
}

#[cfg(test)]
mod tests {
    use super::{escape_text, render_html, strip_tags};
    use crate::builder::build_story;
    use crate::document::Document;
    use foundation::{CameraState, LngLat};
    use formats::{Alignment, Chapter, StoryConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_text_nodes_but_not_markup() {
        let mut config = StoryConfig::new("t", "s", Alignment::Left);
        let mut a = Chapter::new("a", CameraState::new(LngLat::new(0.0, 0.0), 1.0));
        a.title = Some("Fish & <Chips>".into());
        a.description = Some("<b>bold</b>".into());
        config.chapters.push(a);

        let mut doc = Document::new();
        build_story(&mut doc, &config);
        let expected = "\
<div id=\"story\">
  <div id=\"features\" class=\"lefty\">
    <div id=\"a\" class=\"step active\">
      <div class=\"chapter\">
        <h3>Fish &amp; &lt;Chips&gt;</h3>
        <p><b>bold</b></p>
      </div>
    </div>
  </div>
</div>
";
        assert_eq!(render_html(&doc), expected);
    }

    #[test]
    fn strip_tags_decodes_entities_once() {
        assert_eq!(strip_tags("<a href='x'>A &amp;lt; B</a>"), "A &lt; B");
        assert_eq!(escape_text("'\""), "&#39;&quot;");
    }
}
