//! File export: the save dialog where the browser has one, a blob download
//! otherwise.

use runtime::{Downloader, Notifier, SaveError, SavePicker};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::mapbox::js_error_text;

const MIME_TYPE: &str = "text/javascript";

#[wasm_bindgen(inline_js = "
export function storymap_has_save_picker() {
    return 'showSaveFilePicker' in window;
}

export async function storymap_save_with_picker(name, text) {
    const handle = await window.showSaveFilePicker({
        suggestedName: name,
        types: [{
            description: 'JavaScript files',
            accept: { 'text/javascript': ['.js'] }
        }]
    });
    const writable = await handle.createWritable();
    await writable.write(text);
    await writable.close();
}
")]
extern "C" {
    fn storymap_has_save_picker() -> bool;

    #[wasm_bindgen(catch)]
    fn storymap_save_with_picker(name: &str, text: &str) -> Result<js_sys::Promise, JsValue>;
}

fn save_error(err: JsValue) -> SaveError {
    let name = js_sys::Reflect::get(&err, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string());
    match name.as_deref() {
        Some("AbortError") => SaveError::Aborted,
        _ => SaveError::Failed(js_error_text(&err)),
    }
}

pub struct BrowserPicker;

impl BrowserPicker {
    /// `None` when the browser has no File System Access API.
    pub fn detect() -> Option<Self> {
        storymap_has_save_picker().then_some(BrowserPicker)
    }
}

impl SavePicker for BrowserPicker {
    async fn save(&mut self, file_name: &str, contents: &str) -> Result<(), SaveError> {
        let promise = storymap_save_with_picker(file_name, contents).map_err(save_error)?;
        JsFuture::from(promise).await.map_err(save_error)?;
        Ok(())
    }
}

pub struct BlobDownloader;

impl BlobDownloader {
    fn download_inner(file_name: &str, contents: &str) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?;

        let parts = js_sys::Array::of1(&JsValue::from_str(contents));
        let props = web_sys::BlobPropertyBag::new();
        props.set_type(MIME_TYPE);
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &props)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;

        let anchor: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(file_name);
        body.append_child(&anchor)?;
        anchor.click();
        body.remove_child(&anchor)?;
        web_sys::Url::revoke_object_url(&url)
    }
}

impl Downloader for BlobDownloader {
    fn download(&mut self, file_name: &str, contents: &str) -> Result<(), SaveError> {
        Self::download_inner(file_name, contents).map_err(|e| SaveError::Failed(js_error_text(&e)))
    }
}

/// `window.alert`.
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn notify(&mut self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
