use foundation::{ChapterId, Viewport};
use formats::{Chapter, StoryConfig};
use tracing::debug;

use crate::binding::{Field, FieldBinding, FieldKind};
use crate::document::{Document, Node, NodeId, Tag};

pub const HEADER_ID: &str = "header";
pub const FEATURES_ID: &str = "features";
pub const STEP_CLASS: &str = "step";
pub const ACTIVE_CLASS: &str = "active";
pub const CHAPTER_CLASS: &str = "chapter";
pub const BYLINE_CLASS: &str = "byline";
pub const IMAGE_CREDIT_CLASS: &str = "imageCredit";

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderNodes {
    pub root: NodeId,
    pub toptitle: Option<NodeId>,
    pub title: Option<NodeId>,
    pub byline: Option<NodeId>,
    pub description: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterNodes {
    pub id: ChapterId,
    /// The `.step` element the scroll observer watches.
    pub container: NodeId,
    /// The themed `.chapter` element holding the fields.
    pub body: NodeId,
    pub title: Option<NodeId>,
    pub image: Option<NodeId>,
    pub image_credit: Option<NodeId>,
    pub description: Option<NodeId>,
}

/// Handles to everything [`build_story`] created.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryLayout {
    pub header: Option<HeaderNodes>,
    pub features: NodeId,
    pub chapters: Vec<ChapterNodes>,
}

impl StoryLayout {
    pub fn chapter(&self, id: &str) -> Option<&ChapterNodes> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn chapter_mut(&mut self, id: &str) -> Option<&mut ChapterNodes> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    /// Nodes that can be edited in place, header first, then chapters in
    /// story order. Image nodes are excluded; images are edited through a
    /// separate URL input.
    pub fn editable_fields(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(h) = &self.header {
            out.extend([h.toptitle, h.title, h.byline, h.description].into_iter().flatten());
        }
        for c in &self.chapters {
            out.extend([c.title, c.image_credit, c.description].into_iter().flatten());
        }
        out
    }
}

/// Story as it should be rendered on `viewport`: narrow screens see every
/// chapter one zoom level further out. Applied once, before the first build.
pub fn config_for_viewport(
    config: &StoryConfig,
    viewport: Viewport,
    threshold_px: f64,
) -> StoryConfig {
    if viewport.is_narrow(threshold_px) {
        debug!(width = viewport.width, "narrow viewport, zooming chapters out");
        config.with_zoom_offset(-1.0)
    } else {
        config.clone()
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Appends the header and the chapter column for `config` under the document
/// root. Call once per document; a second call appends a second copy.
pub fn build_story(doc: &mut Document, config: &StoryConfig) -> StoryLayout {
    let root = doc.root();
    let theme = config.theme.as_deref().unwrap_or_default();

    let header = config.has_header().then(|| {
        let node = doc.append(
            root,
            Node::new(Tag::Div).with_id(HEADER_ID).with_class(theme),
        );
        let mut field = |tag: Tag, value: Option<&str>, field: Field, class: Option<&str>| {
            value.map(|v| {
                let mut n = Node::new(tag).with_binding(FieldBinding::header(field));
                n = match field.kind() {
                    FieldKind::Markup => n.with_markup(v),
                    _ => n.with_text(v),
                };
                if let Some(class) = class {
                    n = n.with_class(class);
                }
                doc.append(node, n)
            })
        };
        HeaderNodes {
            root: node,
            toptitle: field(Tag::H4, present(&config.toptitle), Field::TopTitle, None),
            title: field(Tag::H1, present(&config.title), Field::Title, None),
            byline: field(
                Tag::P,
                present(&config.byline),
                Field::Byline,
                Some(BYLINE_CLASS),
            ),
            description: field(Tag::P, present(&config.description), Field::Description, None),
        }
    });

    let features = doc.append(
        root,
        Node::new(Tag::Div)
            .with_id(FEATURES_ID)
            .with_class(config.alignment.css_class()),
    );

    let chapters = config
        .chapters
        .iter()
        .enumerate()
        .map(|(idx, chapter)| build_chapter(doc, features, chapter, theme, idx == 0))
        .collect();

    StoryLayout {
        header,
        features,
        chapters,
    }
}

fn build_chapter(
    doc: &mut Document,
    features: NodeId,
    chapter: &Chapter,
    theme: &str,
    first: bool,
) -> ChapterNodes {
    let mut container = Node::new(Tag::Div)
        .with_id(chapter.id.as_str())
        .with_class(STEP_CLASS);
    if first {
        container = container.with_class(ACTIVE_CLASS);
    }
    let container = doc.append(features, container);
    let body = doc.append(
        container,
        Node::new(Tag::Div).with_class(CHAPTER_CLASS).with_class(theme),
    );
    let bind = |field| FieldBinding::chapter(&chapter.id, field);

    let title = present(&chapter.title).map(|t| {
        doc.append(
            body,
            Node::new(Tag::H3).with_text(t).with_binding(bind(Field::Title)),
        )
    });
    let image = present(&chapter.image).map(|src| {
        doc.append(
            body,
            Node::new(Tag::Img)
                .with_attr("src", src)
                .with_binding(bind(Field::Image)),
        )
    });
    let image_credit = present(&chapter.image_credit).map(|credit| {
        doc.append(
            body,
            Node::new(Tag::P)
                .with_class(IMAGE_CREDIT_CLASS)
                .with_markup(credit)
                .with_binding(bind(Field::ImageCredit)),
        )
    });
    let description = present(&chapter.description).map(|d| {
        doc.append(
            body,
            Node::new(Tag::P)
                .with_markup(d)
                .with_binding(bind(Field::Description)),
        )
    });

    ChapterNodes {
        id: chapter.id.clone(),
        container,
        body,
        title,
        image,
        image_credit,
        description,
    }
}
