use foundation::NARROW_VIEWPORT_THRESHOLD_PX;
use layers::PLUGIN_NAME;

/// Runtime knobs for a story page. All fields have documented defaults that
/// match the authoring template.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryOptions {
    /// Viewports narrower than this (CSS px) zoom every chapter out by one.
    pub narrow_viewport_threshold_px: f64,
    /// Selector the scroll observer watches.
    pub step_selector: String,
    /// Fraction of the viewport height at which a step triggers.
    pub step_offset: f64,
    /// Ask the observer for progress notifications.
    pub progress: bool,
    /// Scrolling back above this offset (px) clears the legend box.
    pub legend_clear_scroll_y: f64,
    /// Value of the `pluginName` query parameter on map requests.
    pub plugin_name: String,
    /// Suggested name for the exported file.
    pub export_file_name: String,
    /// Variable the exported file assigns the story to.
    pub binding_name: String,
}

impl Default for StoryOptions {
    fn default() -> Self {
        Self {
            narrow_viewport_threshold_px: NARROW_VIEWPORT_THRESHOLD_PX,
            step_selector: ".step".to_string(),
            step_offset: 0.5,
            progress: true,
            legend_clear_scroll_y: 1010.0,
            plugin_name: PLUGIN_NAME.to_string(),
            export_file_name: "config.js".to_string(),
            binding_name: formats::DEFAULT_BINDING.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoryOptions;

    #[test]
    fn defaults_match_template() {
        let o = StoryOptions::default();
        assert_eq!(o.narrow_viewport_threshold_px, 775.0);
        assert_eq!(o.step_selector, ".step");
        assert_eq!(o.step_offset, 0.5);
        assert!(o.progress);
        assert_eq!(o.export_file_name, "config.js");
        assert_eq!(o.binding_name, "config");
    }
}
