use foundation::ChapterId;
use formats::StoryConfig;
use scene::{
    ChapterNodes, DATA_CHAPTER_ID, Field, FieldBinding, FieldOwner, IMAGE_INPUT_CLASS, Node,
    NodeId, StoryLayout, Surface, Tag,
};
use tracing::{debug, info};

/// Class set on `<body>` while editing.
pub const EDIT_MODE_BODY_CLASS: &str = "edit-mode";
pub const IMAGE_INPUT_PLACEHOLDER: &str = "Image URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    ReadOnly,
    Editing,
}

impl EditState {
    /// Label for the button that switches out of this state.
    pub fn toggle_label(self) -> &'static str {
        match self {
            EditState::ReadOnly => "Edit Mode",
            EditState::Editing => "Exit Edit Mode",
        }
    }

    pub fn save_visible(self) -> bool {
        self == EditState::Editing
    }
}

/// URL input inserted for one chapter while editing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub chapter: ChapterId,
    pub node: NodeId,
}

/// In-place editing over a built story.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: EditState,
    working: Option<StoryConfig>,
    inputs: Vec<ImageInput>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        self.state == EditState::Editing
    }

    /// The story as edited so far. Created on the first entry into edit mode
    /// and updated with the page edits each time edit mode is left.
    pub fn working_copy(&self) -> Option<&StoryConfig> {
        self.working.as_ref()
    }

    pub fn image_inputs(&self) -> &[ImageInput] {
        &self.inputs
    }

    pub fn image_input(&self, chapter: &str) -> Option<NodeId> {
        self.inputs
            .iter()
            .find(|i| i.chapter == chapter)
            .map(|i| i.node)
    }

    /// Makes every bound field editable and inserts one URL input per
    /// chapter, filled from a fresh copy of the working story (of `config`
    /// the first time). A no-op when already editing.
    pub fn enter(
        &mut self,
        config: &StoryConfig,
        layout: &mut StoryLayout,
        surface: &mut dyn Surface,
    ) {
        if self.is_editing() {
            return;
        }
        let working = self.working.as_ref().unwrap_or(config).clone();

        for node in layout.editable_fields() {
            surface.set_editable(node, true);
        }

        self.inputs.clear();
        for chapter in &working.chapters {
            let Some(nodes) = layout.chapter_mut(chapter.id.as_str()) else {
                continue;
            };
            let url = chapter.image.as_deref().unwrap_or_default();
            let input = insert_image_input(surface, nodes, url);
            if !url.is_empty() && nodes.image.is_none() {
                nodes.image = Some(insert_image_after(surface, nodes, input, url));
            }
            self.inputs.push(ImageInput {
                chapter: chapter.id.clone(),
                node: input,
            });
        }

        self.working = Some(working);
        self.state = EditState::Editing;
        info!(inputs = self.inputs.len(), "entered edit mode");
    }

    /// Folds the page edits into the working copy, then strips editability
    /// and removes the URL inputs. Image nodes stay.
    pub fn exit(&mut self, layout: &StoryLayout, surface: &mut dyn Surface) {
        if !self.is_editing() {
            return;
        }
        if let Some(working) = &self.working {
            let edited = self.read_edits(working, layout, &*surface);
            self.working = Some(edited);
        }
        for node in layout.editable_fields() {
            surface.set_editable(node, false);
        }
        for input in self.inputs.drain(..) {
            surface.remove_node(input.node);
        }
        self.state = EditState::ReadOnly;
        info!("left edit mode");
    }

    /// Mirrors a typed URL into the chapter's image. Creates the image after
    /// the input when missing; hides it when `url` is empty. Returns false
    /// when the chapter has no input.
    pub fn preview_image(
        &self,
        layout: &mut StoryLayout,
        chapter: &str,
        url: &str,
        surface: &mut dyn Surface,
    ) -> bool {
        let Some(input) = self.image_input(chapter) else {
            debug!(chapter, "no image input for chapter");
            return false;
        };
        let Some(nodes) = layout.chapter_mut(chapter) else {
            return false;
        };
        let url = url.trim();
        match nodes.image {
            Some(image) if url.is_empty() => surface.set_image_source(image, None),
            Some(image) => surface.set_image_source(image, Some(url)),
            None if url.is_empty() => {}
            None => nodes.image = Some(insert_image_after(surface, nodes, input, url)),
        }
        true
    }

    /// Deep copy of the working story, or of `original` before any edit
    /// session, with every bound field that is currently editable replaced by
    /// its trimmed on-page value. Fields without a node keep their value.
    /// `original` itself is never changed.
    pub fn collect_edited_data(
        &self,
        original: &StoryConfig,
        layout: &StoryLayout,
        surface: &dyn Surface,
    ) -> StoryConfig {
        let base = self.working.as_ref().unwrap_or(original);
        if !self.is_editing() {
            return base.clone();
        }
        self.read_edits(base, layout, surface)
    }

    fn read_edits(
        &self,
        base: &StoryConfig,
        layout: &StoryLayout,
        surface: &dyn Surface,
    ) -> StoryConfig {
        let mut out = base.clone();
        for (node, binding) in bound_fields(layout) {
            if !surface.is_editable(node) {
                continue;
            }
            if let Some(value) = surface.read_field(node, binding.field.kind()) {
                set_field(&mut out, &binding, value.trim());
            }
        }
        for input in &self.inputs {
            let binding = FieldBinding::chapter(&input.chapter, Field::Image);
            if let Some(value) = surface.read_field(input.node, binding.field.kind()) {
                set_field(&mut out, &binding, value.trim());
            }
        }
        out
    }
}

fn insert_image_input(surface: &mut dyn Surface, nodes: &ChapterNodes, url: &str) -> NodeId {
    let before = match nodes.title {
        Some(title) => surface.next_sibling(title),
        None => surface.first_child(nodes.body),
    };
    let input = Node::new(Tag::Input)
        .with_class(IMAGE_INPUT_CLASS)
        .with_attr("type", "text")
        .with_attr("placeholder", IMAGE_INPUT_PLACEHOLDER)
        .with_attr("value", url)
        .with_attr(DATA_CHAPTER_ID, nodes.id.as_str())
        .with_binding(FieldBinding::chapter(&nodes.id, Field::Image));
    surface.insert_node(nodes.body, before, input)
}

fn insert_image_after(
    surface: &mut dyn Surface,
    nodes: &ChapterNodes,
    input: NodeId,
    url: &str,
) -> NodeId {
    let before = surface.next_sibling(input);
    let image = Node::new(Tag::Img)
        .with_attr("src", url)
        .with_binding(FieldBinding::chapter(&nodes.id, Field::Image));
    surface.insert_node(nodes.body, before, image)
}

/// Text and markup field nodes with the field each one shows.
fn bound_fields(layout: &StoryLayout) -> Vec<(NodeId, FieldBinding)> {
    let mut out = Vec::new();
    if let Some(h) = &layout.header {
        for (node, field) in [
            (h.toptitle, Field::TopTitle),
            (h.title, Field::Title),
            (h.byline, Field::Byline),
            (h.description, Field::Description),
        ] {
            if let Some(node) = node {
                out.push((node, FieldBinding::header(field)));
            }
        }
    }
    for c in &layout.chapters {
        for (node, field) in [
            (c.title, Field::Title),
            (c.image_credit, Field::ImageCredit),
            (c.description, Field::Description),
        ] {
            if let Some(node) = node {
                out.push((node, FieldBinding::chapter(&c.id, field)));
            }
        }
    }
    out
}

fn set_field(config: &mut StoryConfig, binding: &FieldBinding, value: &str) {
    let slot = match &binding.owner {
        FieldOwner::Header => match binding.field {
            Field::TopTitle => &mut config.toptitle,
            Field::Title => &mut config.title,
            Field::Byline => &mut config.byline,
            Field::Description => &mut config.description,
            Field::Image | Field::ImageCredit => return,
        },
        FieldOwner::Chapter(id) => {
            let Some(chapter) = config.chapters.iter_mut().find(|c| c.id == *id) else {
                return;
            };
            match binding.field {
                Field::Title => &mut chapter.title,
                Field::Description => &mut chapter.description,
                Field::ImageCredit => &mut chapter.image_credit,
                // An empty input only clears an image that was there.
                Field::Image if value.is_empty() && chapter.image.is_none() => return,
                Field::Image => &mut chapter.image,
                Field::TopTitle | Field::Byline => return,
            }
        }
    };
    *slot = Some(value.to_string());
}
