use foundation::{CameraState, ChapterId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Horizontal placement of the chapter column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    /// Class put on the `features` column.
    pub fn css_class(self) -> &'static str {
        match self {
            Alignment::Left => "lefty",
            Alignment::Center => "centered",
            Alignment::Right => "righty",
        }
    }
}

/// Root of an authored story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryConfig {
    pub access_token: String,
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub show_markers: bool,
    pub alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toptitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    /// May contain markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// May contain markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_credit: Option<String>,
    /// May contain markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: CameraState,
    #[serde(default)]
    pub on_chapter_enter: Vec<LayerOpacityTrigger>,
    #[serde(default)]
    pub on_chapter_exit: Vec<LayerOpacityTrigger>,
    /// Free-form legend value. An explicit `null` is kept as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub chapter_legend: Option<Value>,
}

/// Sets the opacity of one map layer when a chapter is entered or exited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerOpacityTrigger {
    pub layer: String,
    pub opacity: f64,
}

impl LayerOpacityTrigger {
    pub fn new(layer: impl Into<String>, opacity: f64) -> Self {
        Self {
            layer: layer.into(),
            opacity,
        }
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl StoryConfig {
    pub fn new(
        access_token: impl Into<String>,
        style: impl Into<String>,
        alignment: Alignment,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            style: style.into(),
            theme: None,
            show_markers: false,
            alignment,
            toptitle: None,
            title: None,
            byline: None,
            description: None,
            chapters: Vec::new(),
        }
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn chapter_index(&self, id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.id == id)
    }

    pub fn has_header(&self) -> bool {
        [&self.toptitle, &self.title, &self.byline, &self.description]
            .into_iter()
            .any(|f| f.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// Copy with every chapter's zoom shifted by `delta`.
    pub fn with_zoom_offset(&self, delta: f64) -> StoryConfig {
        let mut out = self.clone();
        for chapter in &mut out.chapters {
            chapter.location.zoom += delta;
        }
        out
    }
}

impl Chapter {
    pub fn new(id: impl Into<String>, location: CameraState) -> Self {
        Self {
            id: ChapterId::new(id),
            title: None,
            image: None,
            image_credit: None,
            description: None,
            location,
            on_chapter_enter: Vec::new(),
            on_chapter_exit: Vec::new(),
            chapter_legend: None,
        }
    }

    /// Legend lines for display: a string is one entry, an array yields one
    /// entry per item, `null` yields none.
    pub fn legend_entries(&self) -> Vec<String> {
        fn entry(v: &Value) -> Option<String> {
            match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        }

        match &self.chapter_legend {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().filter_map(entry).collect(),
            Some(v) => entry(v).into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Alignment, Chapter, StoryConfig};
    use foundation::{CameraState, LngLat};
    use serde_json::json;

    fn chapter_json() -> serde_json::Value {
        json!({
            "id": "intro",
            "title": "Intro",
            "location": {"center": [-73.9, 40.7], "zoom": 12},
            "unknownKey": true
        })
    }

    #[test]
    fn chapter_defaults_triggers_to_empty() {
        let chapter: Chapter = serde_json::from_value(chapter_json()).unwrap();
        assert!(chapter.on_chapter_enter.is_empty());
        assert!(chapter.on_chapter_exit.is_empty());
        assert_eq!(chapter.chapter_legend, None);
        assert_eq!(chapter.location.center, LngLat::new(-73.9, 40.7));
    }

    #[test]
    fn explicit_null_legend_is_preserved() {
        let mut v = chapter_json();
        v["chapterLegend"] = serde_json::Value::Null;
        let chapter: Chapter = serde_json::from_value(v).unwrap();
        assert_eq!(chapter.chapter_legend, Some(serde_json::Value::Null));
        assert!(chapter.legend_entries().is_empty());
    }

    #[test]
    fn legend_entries_flatten_arrays_and_strings() {
        let mut chapter = Chapter::new("a", CameraState::new(LngLat::new(0.0, 0.0), 1.0));
        chapter.chapter_legend = Some(json!(["Parks", "Water", null]));
        assert_eq!(chapter.legend_entries(), vec!["Parks", "Water"]);
        chapter.chapter_legend = Some(json!("Single"));
        assert_eq!(chapter.legend_entries(), vec!["Single"]);
    }

    #[test]
    fn missing_location_is_a_shape_error() {
        let err = serde_json::from_value::<Chapter>(json!({"id": "x"})).unwrap_err();
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn header_presence_ignores_empty_strings() {
        let mut config = StoryConfig::new("tok", "mapbox://styles/x", Alignment::Left);
        assert!(!config.has_header());
        config.byline = Some(String::new());
        assert!(!config.has_header());
        config.toptitle = Some("Top".into());
        assert!(config.has_header());
    }

    #[test]
    fn zoom_offset_leaves_original_untouched() {
        let mut config = StoryConfig::new("tok", "style", Alignment::Center);
        config
            .chapters
            .push(Chapter::new("a", CameraState::new(LngLat::new(1.0, 2.0), 10.0)));
        let narrowed = config.with_zoom_offset(-1.0);
        assert_eq!(narrowed.chapters[0].location.zoom, 9.0);
        assert_eq!(config.chapters[0].location.zoom, 10.0);
    }

    #[test]
    fn alignment_maps_to_column_class() {
        assert_eq!(Alignment::Left.css_class(), "lefty");
        assert_eq!(Alignment::Center.css_class(), "centered");
        assert_eq!(Alignment::Right.css_class(), "righty");
    }
}
