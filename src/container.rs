use image::RgbaImage;

use crate::error::Result;

/// What a renderer hands to its display container.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    /// Standalone SVG markup.
    Svg(String),
    /// A rasterized canvas, straight (non-premultiplied) RGBA.
    Canvas(RgbaImage),
}

/// A display surface a rendered QR code can be attached to.
///
/// The container is owned by the caller; renderers only borrow it to append.
pub trait Container {
    fn append(&self, element: Element) -> Result<()>;
}

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::{Clamped, JsCast, JsValue};
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

    use super::{Container, Element};
    use crate::error::{Error, Result};

    fn browser(err: JsValue) -> Error {
        Error::Browser(format!("{:?}", err))
    }

    impl Container for web_sys::Element {
        fn append(&self, element: Element) -> Result<()> {
            match element {
                Element::Svg(svg) => self
                    .insert_adjacent_html("beforeend", &svg)
                    .map_err(browser),
                Element::Canvas(image) => {
                    let document = self
                        .owner_document()
                        .ok_or_else(|| Error::Browser("container is not in a document".to_owned()))?;
                    let canvas: HtmlCanvasElement =
                        document.create_element("canvas").map_err(browser)?.unchecked_into();
                    canvas.set_width(image.width());
                    canvas.set_height(image.height());

                    let context: CanvasRenderingContext2d = canvas
                        .get_context("2d")
                        .map_err(browser)?
                        .ok_or_else(|| Error::Browser("no 2d context".to_owned()))?
                        .unchecked_into();
                    let (width, height) = image.dimensions();
                    let data = ImageData::new_with_u8_clamped_array_and_sh(
                        Clamped(image.as_raw().as_slice()),
                        width,
                        height,
                    )
                    .map_err(browser)?;
                    context.put_image_data(&data, 0.0, 0.0).map_err(browser)?;

                    self.append_child(&canvas).map_err(browser)?;
                    Ok(())
                }
            }
        }
    }
}
