//! Bindings to the global `scrollama` step observer.

use runtime::{ScrollObserver, StepConfig};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    pub type JsScroller;

    #[wasm_bindgen(js_name = scrollama)]
    fn scrollama() -> JsScroller;

    #[wasm_bindgen(method, catch)]
    fn setup(this: &JsScroller, options: &JsValue) -> Result<JsScroller, JsValue>;

    #[wasm_bindgen(method, js_name = onStepEnter)]
    fn on_step_enter(this: &JsScroller, listener: &js_sys::Function) -> JsScroller;

    #[wasm_bindgen(method, js_name = onStepExit)]
    fn on_step_exit(this: &JsScroller, listener: &js_sys::Function) -> JsScroller;

    #[wasm_bindgen(method)]
    fn resize(this: &JsScroller);
}

type StepListener = Closure<dyn FnMut(JsValue)>;

/// `response.element.id` of a scrollama step notification.
fn step_element_id(response: &JsValue) -> Option<String> {
    let element = js_sys::Reflect::get(response, &JsValue::from_str("element")).ok()?;
    js_sys::Reflect::get(&element, &JsValue::from_str("id"))
        .ok()?
        .as_string()
}

pub struct Scroller {
    inner: JsScroller,
    enter: StepListener,
    exit: StepListener,
}

impl Scroller {
    /// The callbacks receive the id of the step element.
    pub fn new(
        mut on_enter: impl FnMut(String) + 'static,
        mut on_exit: impl FnMut(String) + 'static,
    ) -> Self {
        let enter = Closure::wrap(Box::new(move |response: JsValue| {
            if let Some(id) = step_element_id(&response) {
                on_enter(id);
            }
        }) as Box<dyn FnMut(JsValue)>);
        let exit = Closure::wrap(Box::new(move |response: JsValue| {
            if let Some(id) = step_element_id(&response) {
                on_exit(id);
            }
        }) as Box<dyn FnMut(JsValue)>);
        Self {
            inner: scrollama(),
            enter,
            exit,
        }
    }
}

impl ScrollObserver for Scroller {
    fn setup(&mut self, step: &StepConfig) {
        let opts = js_sys::Object::new();
        let fields = [
            ("step", JsValue::from_str(&step.selector)),
            ("offset", JsValue::from_f64(step.offset)),
            ("progress", JsValue::from_bool(step.progress)),
        ];
        for (key, value) in fields {
            let _ = js_sys::Reflect::set(&opts, &JsValue::from_str(key), &value);
        }
        if let Err(e) = self.inner.setup(&opts) {
            warn!(error = %crate::mapbox::js_error_text(&e), "scrollama setup failed");
            return;
        }
        self.inner.on_step_enter(self.enter.as_ref().unchecked_ref());
        self.inner.on_step_exit(self.exit.as_ref().unchecked_ref());
    }

    fn resize(&mut self) {
        self.inner.resize();
    }
}
