use crate::literal::{Fields, Layout, Literal, render};
use crate::story_config::{Chapter, LayerOpacityTrigger, StoryConfig};
use foundation::CameraState;

/// Name the exported file assigns the story to.
pub const DEFAULT_BINDING: &str = "config";

/// `var config = { ... };` text for `config`.
///
/// Output is stable: keys come out in a fixed order per record type, never in
/// the order they were read.
pub fn serialize(config: &StoryConfig) -> String {
    serialize_with_binding(config, DEFAULT_BINDING)
}

pub fn serialize_with_binding(config: &StoryConfig, binding: &str) -> String {
    format!("var {binding} = {};", render(&story_literal(config), 0))
}

/// Root order: accessToken, style, theme, showMarkers, alignment, toptitle,
/// title, byline, description, chapters.
pub fn story_literal(config: &StoryConfig) -> Literal {
    let mut f = Fields::new();
    f.push_str("accessToken", &config.access_token)
        .push_str("style", &config.style)
        .push_opt_str("theme", config.theme.as_deref())
        .push("showMarkers", Literal::Bool(config.show_markers))
        .push_str("alignment", config.alignment.as_str())
        .push_opt_str("toptitle", config.toptitle.as_deref())
        .push_opt_str("title", config.title.as_deref())
        .push_opt_str("byline", config.byline.as_deref())
        .push_opt_str("description", config.description.as_deref())
        .push(
            "chapters",
            Literal::List(
                config.chapters.iter().map(chapter_literal).collect(),
                Layout::Block,
            ),
        );
    f.into_record(Layout::Block)
}

/// Chapter order: id, title, image, imageCredit, description, location,
/// onChapterEnter, onChapterExit, chapterLegend.
pub fn chapter_literal(chapter: &Chapter) -> Literal {
    let mut f = Fields::new();
    f.push_str("id", chapter.id.as_str())
        .push_opt_str("title", chapter.title.as_deref())
        .push_opt_str("image", chapter.image.as_deref())
        .push_opt_str("imageCredit", chapter.image_credit.as_deref())
        .push_opt_str("description", chapter.description.as_deref())
        .push("location", location_literal(&chapter.location))
        .push("onChapterEnter", triggers_literal(&chapter.on_chapter_enter))
        .push("onChapterExit", triggers_literal(&chapter.on_chapter_exit));
    if let Some(legend) = &chapter.chapter_legend {
        f.push("chapterLegend", Literal::from_json(legend, Layout::Inline));
    }
    f.into_record(Layout::Block)
}

fn location_literal(location: &CameraState) -> Literal {
    let center = Literal::List(
        vec![
            Literal::Number(location.center.lng),
            Literal::Number(location.center.lat),
        ],
        Layout::Packed,
    );
    let mut f = Fields::new();
    f.push("center", center)
        .push("zoom", Literal::Number(location.zoom))
        .push("pitch", Literal::Number(location.pitch))
        .push("bearing", Literal::Number(location.bearing));
    f.into_record(Layout::Block)
}

fn triggers_literal(triggers: &[LayerOpacityTrigger]) -> Literal {
    let items = triggers
        .iter()
        .map(|t| {
            let mut f = Fields::new();
            f.push_str("layer", &t.layer)
                .push("opacity", Literal::Number(t.opacity));
            f.into_record(Layout::Json)
        })
        .collect();
    Literal::List(items, Layout::Json)
}
