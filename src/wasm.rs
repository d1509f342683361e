//! JavaScript bindings. Options cross the boundary as plain JS objects using
//! the same field names as the Rust option structs' serde form.

use js_sys::{Array, Promise, Reflect, Uint8Array, Uint8ClampedArray};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{console, Blob, Url};

use crate::error::{Error, Result};
use crate::export::{DownloadOptions, DownloadTarget};
use crate::options::Options;
use crate::qr_reader::{DecodeOptions, QrCodeResult};
use crate::renderer::QrCodeStyling;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn main_js() -> std::result::Result<(), JsValue> {
    #[cfg(debug_assertions)]
    {
        console_error_panic_hook::set_once();
        // a second start call keeps the logger already installed
        let _ = console_log::init_with_level(log::Level::Debug);
    }

    Ok(())
}

fn to_js(err: Error) -> JsValue {
    let message = err.to_string();
    console::error_2(&JsValue::from_str("qr-styling:"), &JsValue::from_str(&message));
    js_sys::Error::new(&message).into()
}

#[allow(deprecated)]
fn options_from<T: DeserializeOwned + Default>(value: &JsValue) -> std::result::Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    value
        .into_serde()
        .map_err(|err| to_js(Error::Config(err)))
}

/// Browser downloads through a temporary object URL and anchor click.
pub struct BrowserDownload;

impl DownloadTarget for BrowserDownload {
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<()> {
        let browser = |err: JsValue| Error::Browser(format!("{:?}", err));

        let mut options = web_sys::BlobPropertyBag::new();
        options.type_(mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(
            &Array::of1(&Uint8Array::from(data)),
            &options,
        )
        .map_err(browser)?;

        let blob_url = Url::create_object_url_with_blob(&blob).map_err(browser)?;

        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| Error::Browser("no document".to_owned()))?;
        let a: web_sys::HtmlAnchorElement = document
            .create_element("A")
            .map_err(browser)?
            .unchecked_into();
        a.set_href(&blob_url);
        a.set_download(file_name);
        a.click();

        Url::revoke_object_url(&blob_url).map_err(browser)
    }
}

/// Handle to a generated code, returned to JavaScript.
#[wasm_bindgen]
pub struct QrCode {
    inner: QrCodeStyling,
}

#[wasm_bindgen]
impl QrCode {
    pub fn svg(&self) -> String {
        self.inner.svg().to_owned()
    }

    pub fn append(&self, container: &web_sys::Element) -> std::result::Result<(), JsValue> {
        self.inner.append(container).map_err(to_js)
    }

    pub fn update(&mut self, options: JsValue) -> std::result::Result<(), JsValue> {
        let options: Options = options_from(&options)?;
        self.inner.update(options).map_err(to_js)
    }

    /// Resolves once the download has been handed to the browser.
    pub fn download(&self, options: JsValue) -> Promise {
        let qr_code = self.inner.clone();
        let options = options_from::<DownloadOptions>(&options);
        wasm_bindgen_futures::future_to_promise(async move {
            crate::download(&qr_code, Some(options?))
                .await
                .map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

#[wasm_bindgen]
pub fn generate(
    options: JsValue,
    container: Option<web_sys::Element>,
) -> std::result::Result<QrCode, JsValue> {
    let options: Options = options_from(&options)?;
    let container = container.as_ref().map(|element| element as &dyn crate::Container);
    let inner = crate::generate(options, container).map_err(to_js)?;
    Ok(QrCode { inner })
}

#[allow(deprecated)]
fn result_to_js(result: &QrCodeResult) -> std::result::Result<JsValue, JsValue> {
    let object = JsValue::from_serde(result).map_err(|err| to_js(Error::Config(err)))?;
    let binary_data = Uint8ClampedArray::new_with_length(result.binary_data.len() as u32);
    binary_data.copy_from(&result.binary_data);
    Reflect::set(&object, &JsValue::from_str("binaryData"), &binary_data)?;
    Ok(object)
}

/// Decodes RGBA `ImageData` pixels; resolves to `null` when nothing is found.
/// `binaryData` is a `Uint8ClampedArray`.
#[wasm_bindgen]
pub fn decode(
    data: Clamped<Vec<u8>>,
    width: u32,
    height: u32,
    options: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    let options: DecodeOptions = options_from(&options)?;
    match crate::decode(&data.0, width, height, Some(options)) {
        Some(result) => result_to_js(&result),
        None => Ok(JsValue::NULL),
    }
}
