use foundation::ChapterId;
use formats::StoryConfig;
use layers::{LayerError, MapSurface, apply_triggers};
use scene::{ACTIVE_CLASS, StoryLayout, Surface};
use tracing::debug;

use crate::options::StoryOptions;

/// Arguments for the scroll observer's `setup` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    pub selector: String,
    pub offset: f64,
    pub progress: bool,
}

impl StepConfig {
    pub fn from_options(options: &StoryOptions) -> Self {
        Self {
            selector: options.step_selector.clone(),
            offset: options.step_offset,
            progress: options.progress,
        }
    }
}

/// The scroll-position observer. It reports step transitions back through
/// [`ScrollBinder::on_step_enter`] and [`ScrollBinder::on_step_exit`].
pub trait ScrollObserver {
    fn setup(&mut self, step: &StepConfig);
    /// Recomputes step offsets after the viewport changed size.
    fn resize(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Entered(ChapterId),
    Exited(ChapterId),
    /// The element id matched no chapter; nothing was changed.
    UnknownChapter(String),
}

/// Turns step notifications into active markers, camera moves and layer
/// opacity changes.
#[derive(Debug, Clone)]
pub struct ScrollBinder {
    active: Option<ChapterId>,
    show_markers: bool,
    legend_clear_scroll_y: f64,
}

impl ScrollBinder {
    /// The first chapter starts out active, matching the built document.
    pub fn new(story: &StoryConfig, options: &StoryOptions) -> Self {
        Self {
            active: story.chapters.first().map(|c| c.id.clone()),
            show_markers: story.show_markers,
            legend_clear_scroll_y: options.legend_clear_scroll_y,
        }
    }

    pub fn active(&self) -> Option<&ChapterId> {
        self.active.as_ref()
    }

    pub fn attach(&self, observer: &mut dyn ScrollObserver, step: &StepConfig) {
        observer.setup(step);
    }

    pub fn on_resize(&self, observer: &mut dyn ScrollObserver) {
        observer.resize();
    }

    pub fn on_step_enter(
        &mut self,
        story: &StoryConfig,
        layout: &StoryLayout,
        element_id: &str,
        surface: &mut dyn Surface,
        map: &mut dyn MapSurface,
    ) -> Result<StepOutcome, LayerError> {
        let (Some(chapter), Some(nodes)) = (story.chapter(element_id), layout.chapter(element_id))
        else {
            debug!(element_id, "step enter for unknown chapter");
            return Ok(StepOutcome::UnknownChapter(element_id.to_string()));
        };

        if let Some(prev) = self.active.take().filter(|prev| *prev != chapter.id) {
            if let Some(prev_nodes) = layout.chapter(prev.as_str()) {
                surface.remove_class(prev_nodes.container, ACTIVE_CLASS);
            }
        }
        surface.add_class(nodes.container, ACTIVE_CLASS);
        self.active = Some(chapter.id.clone());

        map.fly_to(&chapter.location);
        if self.show_markers {
            map.set_marker(chapter.location.center);
        }
        let legend = chapter.legend_entries();
        if !legend.is_empty() {
            surface.show_legend(&legend);
        }
        apply_triggers(map, &chapter.on_chapter_enter)?;

        debug!(chapter = %chapter.id, "entered chapter");
        Ok(StepOutcome::Entered(chapter.id.clone()))
    }

    pub fn on_step_exit(
        &mut self,
        story: &StoryConfig,
        layout: &StoryLayout,
        element_id: &str,
        surface: &mut dyn Surface,
        map: &mut dyn MapSurface,
    ) -> Result<StepOutcome, LayerError> {
        let (Some(chapter), Some(nodes)) = (story.chapter(element_id), layout.chapter(element_id))
        else {
            debug!(element_id, "step exit for unknown chapter");
            return Ok(StepOutcome::UnknownChapter(element_id.to_string()));
        };

        surface.remove_class(nodes.container, ACTIVE_CLASS);
        if self.active.as_ref() == Some(&chapter.id) {
            self.active = None;
        }
        apply_triggers(map, &chapter.on_chapter_exit)?;

        debug!(chapter = %chapter.id, "exited chapter");
        Ok(StepOutcome::Exited(chapter.id.clone()))
    }

    /// Clears the legend once the reader is back near the top of the page.
    pub fn on_scroll(&self, scroll_y: f64, surface: &mut dyn Surface) {
        if scroll_y <= self.legend_clear_scroll_y {
            surface.clear_legend();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ScrollBinder, ScrollObserver, StepConfig, StepOutcome};
    use crate::options::StoryOptions;
    use formats::{Alignment, Chapter, LayerOpacityTrigger, StoryConfig};
    use foundation::{CameraState, ChapterId, LngLat};
    use layers::recording::{MapCall, RecordingMap};
    use layers::LayerError;
    use pretty_assertions::assert_eq;
    use scene::{ACTIVE_CLASS, Document, StoryLayout, build_story};

    fn cam(lng: f64) -> CameraState {
        CameraState::new(LngLat::new(lng, 0.0), 10.0)
    }

    fn story() -> StoryConfig {
        let mut config = StoryConfig::new("t", "s", Alignment::Left);
        let mut a = Chapter::new("A", cam(1.0));
        a.on_chapter_enter
            .push(LayerOpacityTrigger::new("water", 0.0));
        a.on_chapter_exit
            .push(LayerOpacityTrigger::new("water", 1.0));
        let b = Chapter::new("B", cam(2.0));
        config.chapters = vec![a, b];
        config
    }

    fn setup(config: &StoryConfig) -> (Document, StoryLayout, ScrollBinder, RecordingMap) {
        let mut doc = Document::new();
        let layout = build_story(&mut doc, config);
        let binder = ScrollBinder::new(config, &StoryOptions::default());
        (doc, layout, binder, RecordingMap::with_layers([("water", "fill")]))
    }

    fn active(doc: &Document) -> Vec<String> {
        doc.with_class(ACTIVE_CLASS)
            .into_iter()
            .filter_map(|id| doc.node(id).and_then(|n| n.id.clone()))
            .collect()
    }

    #[test]
    fn enter_enter_exit_sequence() {
        let config = story();
        let (mut doc, layout, mut binder, mut map) = setup(&config);

        let out = binder
            .on_step_enter(&config, &layout, "A", &mut doc, &mut map)
            .unwrap();
        assert_eq!(out, StepOutcome::Entered(ChapterId::new("A")));
        assert_eq!(
            map.calls,
            vec![
                MapCall::FlyTo(cam(1.0)),
                MapCall::paint("water", "fill-opacity", 0.0)
            ]
        );
        assert_eq!(active(&doc), vec!["A"]);

        map.calls.clear();
        binder
            .on_step_enter(&config, &layout, "B", &mut doc, &mut map)
            .unwrap();
        assert_eq!(map.calls, vec![MapCall::FlyTo(cam(2.0))]);
        assert_eq!(active(&doc), vec!["B"]);

        map.calls.clear();
        binder
            .on_step_exit(&config, &layout, "A", &mut doc, &mut map)
            .unwrap();
        assert_eq!(map.calls, vec![MapCall::paint("water", "fill-opacity", 1.0)]);
        // B stays active; exiting A only touches A.
        assert_eq!(active(&doc), vec!["B"]);
        assert_eq!(binder.active(), Some(&ChapterId::new("B")));
    }

    #[test]
    fn unknown_chapter_touches_nothing() {
        let config = story();
        let (mut doc, layout, mut binder, mut map) = setup(&config);
        let out = binder
            .on_step_enter(&config, &layout, "nope", &mut doc, &mut map)
            .unwrap();
        assert_eq!(out, StepOutcome::UnknownChapter("nope".into()));
        let out = binder
            .on_step_exit(&config, &layout, "nope", &mut doc, &mut map)
            .unwrap();
        assert_eq!(out, StepOutcome::UnknownChapter("nope".into()));
        assert!(map.calls.is_empty());
        assert_eq!(active(&doc), vec!["A"]);
    }

    #[test]
    fn at_most_one_active_after_any_sequence() {
        let config = story();
        let (mut doc, layout, mut binder, mut map) = setup(&config);
        for (enter, id) in [(true, "B"), (true, "A"), (false, "A"), (true, "B"), (true, "B")] {
            if enter {
                binder
                    .on_step_enter(&config, &layout, id, &mut doc, &mut map)
                    .unwrap();
            } else {
                binder
                    .on_step_exit(&config, &layout, id, &mut doc, &mut map)
                    .unwrap();
            }
            assert!(active(&doc).len() <= 1);
        }
        assert_eq!(active(&doc), vec!["B"]);
    }

    #[test]
    fn exit_clears_active() {
        let config = story();
        let (mut doc, layout, mut binder, mut map) = setup(&config);
        binder
            .on_step_exit(&config, &layout, "A", &mut doc, &mut map)
            .unwrap();
        assert!(active(&doc).is_empty());
        assert_eq!(binder.active(), None);
    }

    #[test]
    fn markers_follow_chapters_when_enabled() {
        let mut config = story();
        config.show_markers = true;
        let (mut doc, layout, mut binder, mut map) = setup(&config);
        binder
            .on_step_enter(&config, &layout, "B", &mut doc, &mut map)
            .unwrap();
        assert_eq!(
            map.calls,
            vec![MapCall::FlyTo(cam(2.0)), MapCall::Marker(LngLat::new(2.0, 0.0))]
        );
    }

    #[test]
    fn missing_layer_propagates() {
        let config = story();
        let (mut doc, layout, mut binder, _) = setup(&config);
        let mut map = RecordingMap::new();
        let err = binder
            .on_step_enter(&config, &layout, "A", &mut doc, &mut map)
            .unwrap_err();
        assert_eq!(
            err,
            LayerError::UnknownLayer {
                layer: "water".into()
            }
        );
    }

    #[test]
    fn legend_shows_on_enter_and_clears_near_top() {
        let mut config = story();
        config.chapters[1].chapter_legend = Some(serde_json_legend());
        let (mut doc, layout, mut binder, mut map) = setup(&config);
        binder
            .on_step_enter(&config, &layout, "B", &mut doc, &mut map)
            .unwrap();
        assert_eq!(doc.legend(), &["Parks".to_string()]);
        binder.on_scroll(2000.0, &mut doc);
        assert_eq!(doc.legend().len(), 1);
        binder.on_scroll(1010.0, &mut doc);
        assert!(doc.legend().is_empty());
    }

    fn serde_json_legend() -> serde_json::Value {
        serde_json::Value::Array(vec![serde_json::Value::String("Parks".into())])
    }

    #[derive(Default)]
    struct CountingObserver {
        setups: Vec<StepConfig>,
        resizes: usize,
    }

    impl ScrollObserver for CountingObserver {
        fn setup(&mut self, step: &StepConfig) {
            self.setups.push(step.clone());
        }

        fn resize(&mut self) {
            self.resizes += 1;
        }
    }

    #[test]
    fn attach_and_resize_reach_observer() {
        let config = story();
        let (_, _, binder, _) = setup(&config);
        let mut observer = CountingObserver::default();
        let step = StepConfig::from_options(&StoryOptions::default());
        binder.attach(&mut observer, &step);
        binder.on_resize(&mut observer);
        binder.on_resize(&mut observer);
        assert_eq!(observer.setups, vec![step]);
        assert_eq!(observer.resizes, 2);
    }
}
