use formats::StoryConfig;
use foundation::CameraState;

/// Query parameter value appended to every style and tile request.
pub const PLUGIN_NAME: &str = "journalismScrollytelling";

/// Construction options for the map, taken from the story.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub container: String,
    pub access_token: String,
    pub style: String,
    /// Initial camera: the first chapter's location.
    pub camera: CameraState,
    pub scroll_zoom: bool,
    pub plugin_name: String,
}

impl MapOptions {
    pub const CONTAINER_ID: &'static str = "map";

    /// `None` when the story has no chapters to start from.
    pub fn from_story(config: &StoryConfig) -> Option<Self> {
        let first = config.chapters.first()?;
        Some(Self {
            container: Self::CONTAINER_ID.to_string(),
            access_token: config.access_token.clone(),
            style: config.style.clone(),
            camera: first.location,
            scroll_zoom: false,
            plugin_name: PLUGIN_NAME.to_string(),
        })
    }

    pub fn transform_request(&self, url: &str) -> String {
        transform_request_url(url, &self.plugin_name)
    }
}

/// Appends `pluginName=<plugin>` to `url`, starting a query string if there
/// is none yet.
pub fn transform_request_url(url: &str, plugin: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}pluginName={plugin}")
}

#[cfg(test)]
mod tests {
    use super::{MapOptions, PLUGIN_NAME, transform_request_url};
    use formats::{Alignment, Chapter, StoryConfig};
    use foundation::{CameraState, LngLat};

    #[test]
    fn appends_plugin_parameter() {
        assert_eq!(
            transform_request_url("https://api.test/styles/v1/x", PLUGIN_NAME),
            "https://api.test/styles/v1/x?pluginName=journalismScrollytelling"
        );
        assert_eq!(
            transform_request_url("https://api.test/tiles?access_token=t", PLUGIN_NAME),
            "https://api.test/tiles?access_token=t&pluginName=journalismScrollytelling"
        );
    }

    #[test]
    fn starts_at_first_chapter() {
        let mut config = StoryConfig::new("tok", "mapbox://styles/s", Alignment::Left);
        assert_eq!(MapOptions::from_story(&config), None);
        let cam = CameraState::new(LngLat::new(5.0, 6.0), 7.0).with_bearing(20.0);
        config.chapters.push(Chapter::new("a", cam));
        config
            .chapters
            .push(Chapter::new("b", CameraState::new(LngLat::new(0.0, 0.0), 1.0)));
        let opts = MapOptions::from_story(&config).unwrap();
        assert_eq!(opts.camera, cam);
        assert_eq!(opts.access_token, "tok");
        assert!(!opts.scroll_zoom);
        assert_eq!(opts.container, "map");
    }
}
