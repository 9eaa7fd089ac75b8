use foundation::ChapterId;

/// Which record a rendered field belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldOwner {
    Header,
    Chapter(ChapterId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TopTitle,
    Title,
    Byline,
    Description,
    Image,
    ImageCredit,
}

/// How a field's current value is read back from its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Rendered text, no markup.
    Text,
    /// Inner markup, kept verbatim.
    Markup,
    /// Value of a text input.
    Url,
}

impl Field {
    /// Name used in the exported file and in `data-field` attributes.
    pub fn name(self) -> &'static str {
        match self {
            Field::TopTitle => "toptitle",
            Field::Title => "title",
            Field::Byline => "byline",
            Field::Description => "description",
            Field::Image => "image",
            Field::ImageCredit => "imageCredit",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::TopTitle | Field::Title | Field::Byline => FieldKind::Text,
            Field::Description | Field::ImageCredit => FieldKind::Markup,
            Field::Image => FieldKind::Url,
        }
    }
}

/// Link from a rendered node back to the configuration field it shows.
/// Recorded when the node is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldBinding {
    pub owner: FieldOwner,
    pub field: Field,
}

impl FieldBinding {
    pub fn header(field: Field) -> Self {
        Self {
            owner: FieldOwner::Header,
            field,
        }
    }

    pub fn chapter(id: &ChapterId, field: Field) -> Self {
        Self {
            owner: FieldOwner::Chapter(id.clone()),
            field,
        }
    }

    pub fn chapter_id(&self) -> Option<&ChapterId> {
        match &self.owner {
            FieldOwner::Chapter(id) => Some(id),
            FieldOwner::Header => None,
        }
    }
}
