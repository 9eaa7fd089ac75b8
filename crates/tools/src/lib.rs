//! Offline operations on story files, shared by the `storymap` binary.

use std::fmt;
use std::path::Path;

use formats::{
    ReadError, StoryConfig, config_from_value, parse_source, serialize_with_binding, validate,
};
use foundation::{NARROW_VIEWPORT_THRESHOLD_PX, Viewport};
use layers::recording::{MapCall, RecordingMap};
use runtime::{SessionError, StepOutcome, StoryOptions, StorySession};
use scene::Document;
use serde::Serialize;

#[derive(Debug)]
pub enum ToolError {
    Io(std::io::Error),
    Read(ReadError),
    Session(SessionError),
    Json(serde_json::Error),
    /// `fmt --check` found a file that is not in canonical form.
    NotFormatted(String),
    BadLayerSpec(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Io(e) => write!(f, "I/O error: {e}"),
            ToolError::Read(e) => write!(f, "{e}"),
            ToolError::Session(e) => write!(f, "{e}"),
            ToolError::Json(e) => write!(f, "JSON error: {e}"),
            ToolError::NotFormatted(path) => write!(f, "{path} is not formatted"),
            ToolError::BadLayerSpec(spec) => {
                write!(f, "layer '{spec}' must be written as <id>=<type>")
            }
        }
    }
}

impl std::error::Error for ToolError {}

impl From<ReadError> for ToolError {
    fn from(e: ReadError) -> Self {
        ToolError::Read(e)
    }
}

impl From<SessionError> for ToolError {
    fn from(e: SessionError) -> Self {
        ToolError::Session(e)
    }
}

pub fn read_file(path: &Path) -> Result<String, ToolError> {
    std::fs::read_to_string(path).map_err(ToolError::Io)
}

/// Story text plus the variable it was assigned to, if any.
pub fn load(src: &str) -> Result<(Option<String>, StoryConfig), ToolError> {
    let source = parse_source(src)?;
    let config = config_from_value(source.value)?;
    validate(&config).map_err(ReadError::Invalid)?;
    Ok((source.binding, config))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: String,
    pub has_title: bool,
    pub has_image: bool,
    pub on_enter: usize,
    pub on_exit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub binding: Option<String>,
    pub alignment: String,
    pub theme: Option<String>,
    pub show_markers: bool,
    pub header: bool,
    pub chapters: Vec<ChapterSummary>,
}

impl Summary {
    pub fn of(binding: Option<String>, config: &StoryConfig) -> Self {
        Self {
            binding,
            alignment: config.alignment.as_str().to_string(),
            theme: config.theme.clone(),
            show_markers: config.show_markers,
            header: config.has_header(),
            chapters: config
                .chapters
                .iter()
                .map(|c| ChapterSummary {
                    id: c.id.to_string(),
                    has_title: c.title.as_deref().is_some_and(|t| !t.is_empty()),
                    has_image: c.image.as_deref().is_some_and(|t| !t.is_empty()),
                    on_enter: c.on_chapter_enter.len(),
                    on_exit: c.on_chapter_exit.len(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} chapters, {} aligned, theme {}, markers {}",
            self.chapters.len(),
            self.alignment,
            self.theme.as_deref().unwrap_or("none"),
            if self.show_markers { "on" } else { "off" },
        )?;
        for c in &self.chapters {
            writeln!(
                f,
                "  {:<24} enter {:>2}  exit {:>2}{}",
                c.id,
                c.on_enter,
                c.on_exit,
                if c.has_image { "  image" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// Canonical text for a story. Keeps the original variable name.
pub fn format_source(src: &str) -> Result<String, ToolError> {
    let (binding, config) = load(src)?;
    let binding = binding.unwrap_or_else(|| formats::DEFAULT_BINDING.to_string());
    Ok(serialize_with_binding(&config, &binding) + "\n")
}

/// Static HTML for the story as a browser of the given width would build it.
pub fn render_preview(config: StoryConfig, narrow: bool) -> Result<String, ToolError> {
    let viewport = if narrow {
        Viewport::new(NARROW_VIEWPORT_THRESHOLD_PX - 1.0, 800.0)
    } else {
        Viewport::default()
    };
    let mut doc = Document::new();
    StorySession::create(config, viewport, StoryOptions::default(), &mut doc)?;
    Ok(scene::html::render_html(&doc))
}

pub fn to_json(config: &StoryConfig) -> Result<String, ToolError> {
    serde_json::to_string_pretty(config).map_err(ToolError::Json)
}

pub fn from_json(text: &str) -> Result<String, ToolError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(ToolError::Json)?;
    let config = config_from_value(value)?;
    validate(&config).map_err(ReadError::Invalid)?;
    Ok(serialize_with_binding(&config, formats::DEFAULT_BINDING) + "\n")
}

/// Parses `id=type` pairs naming the layers of the map style.
pub fn parse_layers(specs: &[String]) -> Result<Vec<(String, String)>, ToolError> {
    specs
        .iter()
        .map(|spec| match spec.split_once('=') {
            Some((id, kind)) if !id.is_empty() && !kind.is_empty() => {
                Ok((id.to_string(), kind.to_string()))
            }
            _ => Err(ToolError::BadLayerSpec(spec.clone())),
        })
        .collect()
}

/// Scrolls through every chapter top to bottom against a recording map and
/// returns one line per map call. Each chapter is entered, then exited before
/// the next one is entered.
pub fn walk(config: StoryConfig, layers: &[(String, String)]) -> Result<Vec<String>, ToolError> {
    let mut doc = Document::new();
    let ids: Vec<String> = config.chapters.iter().map(|c| c.id.to_string()).collect();
    let mut session =
        StorySession::create(config, Viewport::default(), StoryOptions::default(), &mut doc)?;
    let mut map =
        RecordingMap::with_layers(layers.iter().map(|(id, t)| (id.as_str(), t.as_str())));

    let mut lines = Vec::new();
    session.initial_marker(&mut map);
    drain(&mut map, &mut lines, "start");
    for id in &ids {
        if let StepOutcome::Entered(_) = session.on_step_enter(id, &mut doc, &mut map)? {
            drain(&mut map, &mut lines, &format!("enter {id}"));
        }
        if let StepOutcome::Exited(_) = session.on_step_exit(id, &mut doc, &mut map)? {
            drain(&mut map, &mut lines, &format!("exit {id}"));
        }
    }
    Ok(lines)
}

fn drain(map: &mut RecordingMap, lines: &mut Vec<String>, step: &str) {
    for call in map.calls.drain(..) {
        let line = match call {
            MapCall::FlyTo(cam) => format!(
                "{step}: fly to [{}, {}] zoom {} pitch {} bearing {}",
                cam.center.lng, cam.center.lat, cam.zoom, cam.pitch, cam.bearing
            ),
            MapCall::Marker(at) => format!("{step}: marker at [{}, {}]", at.lng, at.lat),
            MapCall::Paint {
                layer,
                property,
                value,
            } => format!("{step}: {layer}.{property} = {value}"),
        };
        lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Summary, ToolError, format_source, from_json, load, parse_layers, render_preview, to_json,
        walk,
    };
    use pretty_assertions::assert_eq;

    const STORY: &str = r#"
        // trimmed example
        let story = {
            style: "mapbox://styles/x",
            accessToken: 'tok',
            alignment: 'right',
            chapters: [
                {
                    id: 'one',
                    title: 'First',
                    location: { center: [1, 2], zoom: 4 },
                    onChapterEnter: [{ layer: 'water', opacity: 0.5 }],
                    onChapterExit: [],
                },
                {
                    id: 'two',
                    location: { zoom: 6, center: [3, 4], pitch: 30 },
                },
            ],
        };
    "#;

    #[test]
    fn format_keeps_binding_and_is_stable() {
        let once = format_source(STORY).unwrap();
        assert!(once.starts_with("var story = {"));
        assert_eq!(format_source(&once).unwrap(), once);
    }

    #[test]
    fn summary_counts_triggers() {
        let (binding, config) = load(STORY).unwrap();
        let summary = Summary::of(binding, &config);
        assert_eq!(summary.binding.as_deref(), Some("story"));
        assert_eq!(summary.alignment, "right");
        assert_eq!(summary.chapters.len(), 2);
        assert_eq!(summary.chapters[0].on_enter, 1);
        assert!(summary.to_string().starts_with("2 chapters, right aligned"));
    }

    #[test]
    fn json_round_trip_matches_formatted_text() {
        let (_, config) = load(STORY).unwrap();
        let json = to_json(&config).unwrap();
        let text = from_json(&json).unwrap();
        let (_, back) = load(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn narrow_preview_is_the_same_markup() {
        let (_, config) = load(STORY).unwrap();
        let wide = render_preview(config.clone(), false).unwrap();
        let narrow = render_preview(config, true).unwrap();
        assert!(wide.contains("id=\"one\""));
        assert!(wide.contains("class=\"righty\""));
        assert_eq!(wide, narrow);
    }

    #[test]
    fn walk_reports_every_call() {
        let (_, config) = load(STORY).unwrap();
        let layers = parse_layers(&["water=fill".to_string()]).unwrap();
        let lines = walk(config, &layers).unwrap();
        assert_eq!(
            lines,
            vec![
                "enter one: fly to [1, 2] zoom 4 pitch 0 bearing 0".to_string(),
                "enter one: water.fill-opacity = 0.5".to_string(),
                "enter two: fly to [3, 4] zoom 6 pitch 30 bearing 0".to_string(),
            ]
        );
    }

    #[test]
    fn walk_fails_on_missing_layer() {
        let (_, config) = load(STORY).unwrap();
        let err = walk(config, &[]).unwrap_err();
        assert!(matches!(err, ToolError::Session(_)));
    }

    #[test]
    fn bad_layer_spec_is_rejected() {
        assert!(matches!(
            parse_layers(&["water".to_string()]),
            Err(ToolError::BadLayerSpec(_))
        ));
    }
}
