//! Bindings to the global `mapboxgl` library.

use foundation::{CameraState, LngLat};
use layers::{LayerError, MapOptions, MapSurface};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
export function storymap_set_access_token(token) {
    mapboxgl.accessToken = token;
}
")]
extern "C" {
    fn storymap_set_access_token(token: &str);
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Map)]
    pub type JsMap;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Map")]
    fn new(options: &JsValue) -> JsMap;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &JsMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = setPaintProperty)]
    fn set_paint_property(
        this: &JsMap,
        layer: &str,
        property: &str,
        value: f64,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &JsMap, options: &JsValue);

    #[wasm_bindgen(method)]
    fn on(this: &JsMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Marker)]
    pub type JsMarker;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Marker")]
    fn new() -> JsMarker;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &JsMarker, at: &JsValue) -> JsMarker;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &JsMarker, map: &JsMap) -> JsMarker;
}

pub(crate) fn js_error_text(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

/// A live map plus the story marker, created on first use.
pub struct MapboxMap {
    map: JsMap,
    marker: Option<JsMarker>,
    _transform: Closure<dyn Fn(String) -> JsValue>,
}

impl MapboxMap {
    pub fn new(options: &MapOptions) -> Result<Self, JsValue> {
        storymap_set_access_token(&options.access_token);

        let plugin = options.plugin_name.clone();
        let transform = Closure::wrap(Box::new(move |url: String| {
            let out = js_sys::Object::new();
            let url = layers::transform_request_url(&url, &plugin);
            if let Err(e) = set(&out, "url", &JsValue::from_str(&url)) {
                warn!(error = %js_error_text(&e), "could not rewrite request url");
            }
            out.into()
        }) as Box<dyn Fn(String) -> JsValue>);

        let camera = &options.camera;
        let opts = js_sys::Object::new();
        set(&opts, "container", &JsValue::from_str(&options.container))?;
        set(&opts, "style", &JsValue::from_str(&options.style))?;
        set(&opts, "center", &to_js(&camera.center)?)?;
        set(&opts, "zoom", &JsValue::from_f64(camera.zoom))?;
        set(&opts, "bearing", &JsValue::from_f64(camera.bearing))?;
        set(&opts, "pitch", &JsValue::from_f64(camera.pitch))?;
        set(&opts, "scrollZoom", &JsValue::from_bool(options.scroll_zoom))?;
        set(&opts, "transformRequest", transform.as_ref())?;

        Ok(Self {
            map: JsMap::new(&opts),
            marker: None,
            _transform: transform,
        })
    }

    /// Runs `f` once the style has loaded.
    pub fn on_load(&self, f: impl FnMut() + 'static) {
        let cb = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        self.map.on("load", cb.as_ref().unchecked_ref());
        cb.forget();
    }
}

impl MapSurface for MapboxMap {
    fn layer_type(&self, layer: &str) -> Option<String> {
        let found = self.map.get_layer(layer);
        if found.is_undefined() || found.is_null() {
            return None;
        }
        js_sys::Reflect::get(&found, &JsValue::from_str("type"))
            .ok()
            .and_then(|t| t.as_string())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: f64,
    ) -> Result<(), LayerError> {
        self.map
            .set_paint_property(layer, property, value)
            .map_err(|e| LayerError::Map(js_error_text(&e)))
    }

    fn fly_to(&mut self, camera: &CameraState) {
        match to_js(camera) {
            Ok(opts) => self.map.fly_to(&opts),
            Err(e) => warn!(error = %js_error_text(&e), "could not encode camera"),
        }
    }

    fn set_marker(&mut self, at: LngLat) {
        let at = match to_js(&at) {
            Ok(at) => at,
            Err(e) => {
                warn!(error = %js_error_text(&e), "could not encode marker position");
                return;
            }
        };
        match &self.marker {
            Some(marker) => {
                marker.set_lng_lat(&at);
            }
            None => {
                let marker = JsMarker::new();
                marker.set_lng_lat(&at).add_to(&self.map);
                self.marker = Some(marker);
            }
        }
    }
}
