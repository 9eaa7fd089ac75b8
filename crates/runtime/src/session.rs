use std::fmt;

use formats::{ConfigError, StoryConfig, serialize_with_binding, validate};
use foundation::{ChapterId, Viewport};
use layers::{LayerError, MapOptions, MapSurface};
use scene::{Document, StoryLayout, Surface, build_story, config_for_viewport};
use tracing::info;

use crate::binder::{ScrollBinder, ScrollObserver, StepConfig, StepOutcome};
use crate::edit::{EditSession, EditState};
use crate::export::{Downloader, ExportOutcome, Notifier, SaveError, SavePicker, export_text};
use crate::options::StoryOptions;

#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Layer(LayerError),
    Save(SaveError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "invalid story: {e}"),
            SessionError::Layer(e) => write!(f, "map error: {e}"),
            SessionError::Save(e) => write!(f, "export failed: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Config(e) => Some(e),
            SessionError::Layer(e) => Some(e),
            SessionError::Save(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        SessionError::Config(e)
    }
}

impl From<LayerError> for SessionError {
    fn from(e: LayerError) -> Self {
        SessionError::Layer(e)
    }
}

impl From<SaveError> for SessionError {
    fn from(e: SaveError) -> Self {
        SessionError::Save(e)
    }
}

/// One story page: the configuration it was built from, the nodes it built,
/// and the scroll and edit state on top of them.
///
/// Two copies of the story are kept. `authored` is what the author wrote and
/// what gets exported; `rendered` has the viewport zoom adjustment applied and
/// drives the camera.
#[derive(Debug, Clone)]
pub struct StorySession {
    authored: StoryConfig,
    rendered: StoryConfig,
    layout: StoryLayout,
    binder: ScrollBinder,
    edit: EditSession,
    options: StoryOptions,
}

impl StorySession {
    /// Validates `config` and builds its page into `doc`. Nothing is built
    /// when validation fails.
    pub fn create(
        config: StoryConfig,
        viewport: Viewport,
        options: StoryOptions,
        doc: &mut Document,
    ) -> Result<Self, SessionError> {
        validate(&config)?;
        let rendered = config_for_viewport(&config, viewport, options.narrow_viewport_threshold_px);
        let layout = build_story(doc, &rendered);
        let binder = ScrollBinder::new(&rendered, &options);
        info!(
            chapters = rendered.chapters.len(),
            narrow = viewport.is_narrow(options.narrow_viewport_threshold_px),
            "story built"
        );
        Ok(Self {
            authored: config,
            rendered,
            layout,
            binder,
            edit: EditSession::new(),
            options,
        })
    }

    pub fn authored(&self) -> &StoryConfig {
        &self.authored
    }

    pub fn rendered(&self) -> &StoryConfig {
        &self.rendered
    }

    pub fn layout(&self) -> &StoryLayout {
        &self.layout
    }

    pub fn options(&self) -> &StoryOptions {
        &self.options
    }

    pub fn edit_state(&self) -> EditState {
        self.edit.state()
    }

    pub fn active_chapter(&self) -> Option<&ChapterId> {
        self.binder.active()
    }

    pub fn map_options(&self) -> Option<MapOptions> {
        MapOptions::from_story(&self.rendered).map(|mut opts| {
            opts.plugin_name = self.options.plugin_name.clone();
            opts
        })
    }

    /// Puts the marker on the first chapter when markers are enabled.
    pub fn initial_marker(&self, map: &mut dyn MapSurface) {
        if !self.rendered.show_markers {
            return;
        }
        if let Some(first) = self.rendered.chapters.first() {
            map.set_marker(first.location.center);
        }
    }

    pub fn step_config(&self) -> StepConfig {
        StepConfig::from_options(&self.options)
    }

    /// Hands the step settings to the observer. Call after the map's style
    /// has loaded.
    pub fn attach(&self, observer: &mut dyn ScrollObserver) {
        self.binder.attach(observer, &self.step_config());
    }

    pub fn on_step_enter(
        &mut self,
        element_id: &str,
        surface: &mut dyn Surface,
        map: &mut dyn MapSurface,
    ) -> Result<StepOutcome, SessionError> {
        Ok(self
            .binder
            .on_step_enter(&self.rendered, &self.layout, element_id, surface, map)?)
    }

    pub fn on_step_exit(
        &mut self,
        element_id: &str,
        surface: &mut dyn Surface,
        map: &mut dyn MapSurface,
    ) -> Result<StepOutcome, SessionError> {
        Ok(self
            .binder
            .on_step_exit(&self.rendered, &self.layout, element_id, surface, map)?)
    }

    pub fn on_resize(&self, observer: &mut dyn ScrollObserver) {
        self.binder.on_resize(observer);
    }

    pub fn on_scroll(&self, scroll_y: f64, surface: &mut dyn Surface) {
        self.binder.on_scroll(scroll_y, surface);
    }

    pub fn enter_edit(&mut self, surface: &mut dyn Surface) {
        self.edit.enter(&self.authored, &mut self.layout, surface);
    }

    /// Leaves edit mode. Page edits move into the edit session's working
    /// copy; the authored story is left as it was loaded.
    pub fn exit_edit(&mut self, surface: &mut dyn Surface) {
        self.edit.exit(&self.layout, surface);
    }

    /// Switches edit mode and returns the new state.
    pub fn toggle_edit(&mut self, surface: &mut dyn Surface) -> EditState {
        match self.edit.state() {
            EditState::ReadOnly => self.enter_edit(surface),
            EditState::Editing => self.exit_edit(surface),
        }
        self.edit.state()
    }

    pub fn preview_image(&mut self, chapter: &str, url: &str, surface: &mut dyn Surface) -> bool {
        self.edit
            .preview_image(&mut self.layout, chapter, url, surface)
    }

    pub fn collect_edited_data(&self, surface: &dyn Surface) -> StoryConfig {
        self.edit
            .collect_edited_data(&self.authored, &self.layout, surface)
    }

    /// The story with on-page edits, as the text of a config file.
    pub fn export_text(&self, surface: &dyn Surface) -> String {
        serialize_with_binding(&self.collect_edited_data(surface), &self.options.binding_name)
    }

    pub async fn export<P: SavePicker>(
        &self,
        surface: &dyn Surface,
        picker: Option<&mut P>,
        downloader: &mut dyn Downloader,
        notifier: &mut dyn Notifier,
    ) -> Result<ExportOutcome, SessionError> {
        let text = self.export_text(surface);
        Ok(export_text(
            &self.options.export_file_name,
            &text,
            picker,
            downloader,
            notifier,
        )
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionError, StorySession};
    use crate::edit::EditState;
    use crate::export::fakes::{Downloads, Messages, ScriptedPicker};
    use crate::export::{ExportOutcome, SAVED_MESSAGE};
    use crate::options::StoryOptions;
    use formats::{Alignment, Chapter, ConfigError, StoryConfig, read_config};
    use foundation::{CameraState, LngLat, Viewport};
    use layers::recording::{MapCall, RecordingMap};
    use pretty_assertions::assert_eq;
    use scene::{ACTIVE_CLASS, Content, Document, Surface};

    fn story() -> StoryConfig {
        let mut config = StoryConfig::new("tok", "mapbox://styles/s", Alignment::Left);
        config.show_markers = true;
        let mut a = Chapter::new("a", CameraState::new(LngLat::new(1.0, 2.0), 9.0));
        a.title = Some("Alpha".into());
        let b = Chapter::new("b", CameraState::new(LngLat::new(3.0, 4.0), 12.0));
        config.chapters = vec![a, b];
        config
    }

    fn wide() -> Viewport {
        Viewport::new(1280.0, 800.0)
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let mut doc = Document::new();
        let before = doc.len();
        let err = StorySession::create(
            StoryConfig::new("t", "s", Alignment::Left),
            wide(),
            StoryOptions::default(),
            &mut doc,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Config(ConfigError::NoChapters)));
        assert_eq!(doc.len(), before);
    }

    #[test]
    fn narrow_viewport_zooms_camera_but_not_export() {
        let mut doc = Document::new();
        let session = StorySession::create(
            story(),
            Viewport::new(400.0, 800.0),
            StoryOptions::default(),
            &mut doc,
        )
        .unwrap();
        assert_eq!(session.map_options().unwrap().camera.zoom, 8.0);
        assert_eq!(session.rendered().chapters[1].location.zoom, 11.0);
        let exported = read_config(&session.export_text(&doc)).unwrap();
        assert_eq!(exported, story());
    }

    #[test]
    fn scroll_flow_moves_camera_and_marker() {
        let mut doc = Document::new();
        let mut session =
            StorySession::create(story(), wide(), StoryOptions::default(), &mut doc).unwrap();
        let mut map = RecordingMap::new();
        session.initial_marker(&mut map);
        session.on_step_enter("b", &mut doc, &mut map).unwrap();

        let b = CameraState::new(LngLat::new(3.0, 4.0), 12.0);
        assert_eq!(
            map.calls,
            vec![
                MapCall::Marker(LngLat::new(1.0, 2.0)),
                MapCall::FlyTo(b),
                MapCall::Marker(b.center),
            ]
        );
        let active = session.layout().chapters[1].container;
        assert!(doc.has_class(active, ACTIVE_CLASS));
        assert_eq!(session.active_chapter().map(|c| c.as_str()), Some("b"));
    }

    #[test]
    fn edit_then_export_saves_trimmed_title() {
        let mut doc = Document::new();
        let mut session =
            StorySession::create(story(), wide(), StoryOptions::default(), &mut doc).unwrap();
        assert_eq!(session.toggle_edit(&mut doc), EditState::Editing);

        let title = session.layout().chapters[0].title.unwrap();
        doc.node_mut(title).unwrap().content = Content::Text(" Edited ".into());

        let mut picker = ScriptedPicker::new(Ok(()));
        let mut downloads = Downloads::default();
        let mut messages = Messages::default();
        let out = pollster::block_on(session.export(
            &doc,
            Some(&mut picker),
            &mut downloads,
            &mut messages,
        ))
        .unwrap();
        assert_eq!(out, ExportOutcome::Saved);
        assert_eq!(messages.0, vec![SAVED_MESSAGE.to_string()]);

        let (name, text) = &picker.saved[0];
        assert_eq!(name, "config.js");
        assert!(text.starts_with("var config = {"));
        let saved = read_config(text).unwrap();
        let mut expected = story();
        expected.chapters[0].title = Some("Edited".into());
        assert_eq!(saved, expected);
    }

    #[test]
    fn exit_edit_leaves_authored_story_untouched() {
        let mut doc = Document::new();
        let original = story();
        let mut session =
            StorySession::create(original.clone(), wide(), StoryOptions::default(), &mut doc)
                .unwrap();
        session.enter_edit(&mut doc);
        let title = session.layout().chapters[0].title.unwrap();
        doc.node_mut(title).unwrap().content = Content::Text("Kept".into());
        assert_eq!(session.toggle_edit(&mut doc), EditState::ReadOnly);

        assert_eq!(session.authored(), &original);
        assert!(!doc.is_editable(title));
        // The edit still reaches the export, and a second session starts from it.
        assert_eq!(
            session.collect_edited_data(&doc).chapters[0].title.as_deref(),
            Some("Kept")
        );
        assert!(session.export_text(&doc).contains("title: 'Kept'"));
        session.enter_edit(&mut doc);
        assert_eq!(session.authored(), &original);
        assert_eq!(
            session.collect_edited_data(&doc).chapters[0].title.as_deref(),
            Some("Kept")
        );
    }

    #[test]
    fn custom_binding_name_is_used() {
        let mut doc = Document::new();
        let options = StoryOptions {
            binding_name: "story".into(),
            ..StoryOptions::default()
        };
        let session = StorySession::create(story(), wide(), options, &mut doc).unwrap();
        assert!(session.export_text(&doc).starts_with("var story = {"));
    }
}
