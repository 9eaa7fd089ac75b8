//! Browser entry point: builds the story from `window.config`, then wires the
//! map, the scroll observer, and the edit/save buttons to a [`StorySession`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use foundation::Viewport;
use runtime::{EDIT_MODE_BODY_CLASS, EditState, StoryOptions, StorySession, export_text};
use scene::{DATA_CHAPTER_ID, Document, IMAGE_INPUT_CLASS};
use tracing::{error, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement, HtmlInputElement};

mod dom;
mod logging;
mod mapbox;
mod save;
mod scrollama;

use dom::DomSurface;
use mapbox::{MapboxMap, js_error_text};
use save::{AlertNotifier, BlobDownloader, BrowserPicker};
use scrollama::Scroller;

pub const TOGGLE_BUTTON_ID: &str = "toggle-edit-mode";
pub const SAVE_BUTTON_ID: &str = "save-config";
const CONFIG_GLOBAL: &str = "config";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

struct App {
    session: StorySession,
    surface: DomSurface,
    map: MapboxMap,
}

type Shared<T> = Rc<RefCell<T>>;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen(start)]
pub fn start() {
    logging::init(tracing::Level::INFO);
}

/// Builds the page. Call once `config.js`, `mapboxgl` and `scrollama` are
/// loaded and the `#story` element exists.
#[wasm_bindgen]
pub fn run_story() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
    let page = window.document().ok_or_else(|| js_err("no document"))?;

    let config = read_window_config(&window)?;
    let viewport = Viewport::new(
        window.inner_width()?.as_f64().unwrap_or_default(),
        window.inner_height()?.as_f64().unwrap_or_default(),
    );

    let mut mirror = Document::new();
    let session = StorySession::create(config, viewport, StoryOptions::default(), &mut mirror)
        .map_err(js_err)?;
    let surface = DomSurface::mount(mirror, page.clone())?;
    let map_options = session
        .map_options()
        .ok_or_else(|| js_err("story has no chapters"))?;
    let mut map = MapboxMap::new(&map_options)?;
    session.initial_marker(&mut map);

    let app = Rc::new(RefCell::new(App {
        session,
        surface,
        map,
    }));
    let scroller = Rc::new(RefCell::new(step_observer(&app)));

    wire_map_load(&app, &scroller);
    wire_window(&window, &app, &scroller)?;
    wire_edit_controls(&page, &app)?;
    info!("story ready");
    Ok(())
}

/// `window.config`, round-tripped through JSON.
fn read_window_config(window: &web_sys::Window) -> Result<formats::StoryConfig, JsValue> {
    let raw = js_sys::Reflect::get(window, &JsValue::from_str(CONFIG_GLOBAL))?;
    if raw.is_undefined() {
        return Err(js_err("window.config is not defined"));
    }
    let text: String = js_sys::JSON::stringify(&raw)?.into();
    let value: serde_json::Value = serde_json::from_str(&text).map_err(js_err)?;
    formats::config_from_value(value).map_err(js_err)
}

fn step_observer(app: &Shared<App>) -> Scroller {
    let on_enter = {
        let app = app.clone();
        move |id: String| {
            let mut app = app.borrow_mut();
            let App {
                session,
                surface,
                map,
            } = &mut *app;
            if let Err(e) = session.on_step_enter(&id, surface, map) {
                error!(chapter = %id, error = %e, "step enter failed");
            }
        }
    };
    let on_exit = {
        let app = app.clone();
        move |id: String| {
            let mut app = app.borrow_mut();
            let App {
                session,
                surface,
                map,
            } = &mut *app;
            if let Err(e) = session.on_step_exit(&id, surface, map) {
                error!(chapter = %id, error = %e, "step exit failed");
            }
        }
    };
    Scroller::new(on_enter, on_exit)
}

/// Scroll wiring waits for the style so the first triggers find their layers.
fn wire_map_load(app: &Shared<App>, scroller: &Shared<Scroller>) {
    let app_for_load = app.clone();
    let scroller = scroller.clone();
    app.borrow().map.on_load(move || {
        let app = app_for_load.borrow();
        app.session.attach(&mut *scroller.borrow_mut());
        info!("scroll observer attached");
    });
}

fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    f: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(f) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

fn wire_window(
    window: &web_sys::Window,
    app: &Shared<App>,
    scroller: &Shared<Scroller>,
) -> Result<(), JsValue> {
    {
        let app = app.clone();
        let scroller = scroller.clone();
        listen(window, "resize", move |_| {
            app.borrow()
                .session
                .on_resize(&mut *scroller.borrow_mut());
        })?;
    }
    {
        let app = app.clone();
        let w = window.clone();
        listen(window, "scroll", move |_| {
            let Ok(y) = w.scroll_y() else { return };
            let mut app = app.borrow_mut();
            let App {
                session, surface, ..
            } = &mut *app;
            session.on_scroll(y, surface);
        })?;
    }
    Ok(())
}

fn wire_edit_controls(page: &web_sys::Document, app: &Shared<App>) -> Result<(), JsValue> {
    let toggle = page.get_element_by_id(TOGGLE_BUTTON_ID);
    let save = page.get_element_by_id(SAVE_BUTTON_ID);

    if let Some(button) = &toggle {
        let app = app.clone();
        let page = page.clone();
        let button_el = button.clone();
        let save = save.clone();
        listen(button, "click", move |_| {
            let state = {
                let mut app = app.borrow_mut();
                let App {
                    session, surface, ..
                } = &mut *app;
                session.toggle_edit(surface)
            };
            update_edit_chrome(&page, &button_el, save.as_ref(), state);
        })?;
    }

    if let Some(button) = &save {
        let app = app.clone();
        listen(button, "click", move |_| {
            let (file_name, text) = {
                let app = app.borrow();
                (
                    app.session.options().export_file_name.clone(),
                    app.session.export_text(&app.surface),
                )
            };
            spawn_local(async move {
                let mut picker = BrowserPicker::detect();
                let outcome = export_text(
                    &file_name,
                    &text,
                    picker.as_mut(),
                    &mut BlobDownloader,
                    &mut AlertNotifier,
                )
                .await;
                match outcome {
                    Ok(outcome) => info!(?outcome, "export finished"),
                    Err(e) => error!(error = %e, "export failed"),
                }
            });
        })?;
    }

    // Image URL inputs come and go with edit mode; listen once on the story.
    if let Some(story) = page.get_element_by_id(dom::STORY_ELEMENT_ID) {
        let app = app.clone();
        listen(&story, "input", move |event| {
            let Some(input) = event
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            if !input.class_list().contains(IMAGE_INPUT_CLASS) {
                return;
            }
            let Some(chapter) = input.get_attribute(DATA_CHAPTER_ID) else {
                return;
            };
            let mut app = app.borrow_mut();
            let App {
                session, surface, ..
            } = &mut *app;
            session.preview_image(&chapter, &input.value(), surface);
        })?;
    }
    Ok(())
}

fn update_edit_chrome(
    page: &web_sys::Document,
    toggle: &Element,
    save: Option<&Element>,
    state: EditState,
) {
    let editing = state == EditState::Editing;
    let result = (|| -> Result<(), JsValue> {
        if let Some(body) = page.body() {
            if editing {
                body.class_list().add_1(EDIT_MODE_BODY_CLASS)?;
            } else {
                body.class_list().remove_1(EDIT_MODE_BODY_CLASS)?;
            }
        }
        toggle.class_list().toggle_with_force("active", editing)?;
        toggle.set_text_content(Some(state.toggle_label()));
        if let Some(save) = save.and_then(|s| s.dyn_ref::<HtmlElement>()) {
            let display = if state.save_visible() { "block" } else { "none" };
            save.style().set_property("display", display)?;
        }
        Ok(())
    })();
    if let Err(e) = result {
        error!(error = %js_error_text(&e), "could not update edit controls");
    }
}
