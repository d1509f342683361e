//! Center logo loading and sizing.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};

/// A decoded logo, re-encoded as a data URI for embedding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logo {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl Logo {
    /// Loads a logo from a `data:` URI or a file path.
    pub fn load(source: &str) -> Result<Self> {
        let bytes = if let Some(rest) = source.strip_prefix("data:") {
            let (header, payload) = rest.split_once(',').ok_or_else(|| Error::ImageSource {
                source_name: abbreviate(source),
                reason: "data URI has no payload".to_owned(),
            })?;
            if !header.ends_with(";base64") {
                return Err(Error::ImageSource {
                    source_name: abbreviate(source),
                    reason: "only base64 data URIs are supported".to_owned(),
                });
            }
            STANDARD.decode(payload.trim())?
        } else if source.starts_with("http://") || source.starts_with("https://") {
            return Err(Error::ImageSource {
                source_name: source.to_owned(),
                reason: "remote images are not fetched; pass a data URI or a file".to_owned(),
            });
        } else {
            std::fs::read(Path::new(source)).map_err(|err| Error::ImageSource {
                source_name: source.to_owned(),
                reason: err.to_string(),
            })?
        };

        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        Ok(Logo {
            data_uri: format!("data:{};base64,{}", format.to_mime_type(), STANDARD.encode(bytes)),
            width: decoded.width(),
            height: decoded.height(),
        })
    }
}

fn abbreviate(source: &str) -> String {
    source.chars().take(32).collect()
}

/// Pixel size of the logo and how many modules it hides per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
    pub hide_x_dots: usize,
    pub hide_y_dots: usize,
}

/// Fits a logo of the given aspect ratio over the center of the symbol.
///
/// The hidden area is an odd number of modules per axis, never more than
/// `max_hidden_dots` modules in total and never more than
/// `max_hidden_axis_dots` on one axis.
pub fn calculate_image_size(
    original_width: f64,
    original_height: f64,
    max_hidden_dots: f64,
    max_hidden_axis_dots: usize,
    dot_size: f64,
) -> ImageSize {
    if original_width <= 0.0 || original_height <= 0.0 || max_hidden_dots <= 0.0 || dot_size <= 0.0
    {
        return ImageSize::default();
    }

    let k = original_height / original_width;
    let max_axis = max_hidden_axis_dots as i64;

    let mut hide_x = (max_hidden_dots / k).sqrt().floor() as i64;
    if hide_x <= 0 {
        hide_x = 1;
    }
    if max_axis > 0 && max_axis < hide_x {
        hide_x = max_axis;
    }
    if hide_x % 2 == 0 {
        hide_x -= 1;
    }
    let mut width = hide_x as f64 * dot_size;
    let mut hide_y = 1 + 2 * ((hide_x as f64 * k - 1.0) / 2.0).ceil() as i64;
    let mut height = (width * k).round();

    if (hide_y * hide_x) as f64 > max_hidden_dots || (max_axis > 0 && max_axis < hide_y) {
        if max_axis > 0 && max_axis < hide_y {
            hide_y = max_axis;
            if hide_y % 2 == 0 {
                hide_y -= 1;
            }
        } else {
            hide_y -= 2;
        }
        height = hide_y as f64 * dot_size;
        hide_x = 1 + 2 * ((hide_y as f64 / k - 1.0) / 2.0).ceil() as i64;
        width = (height / k).round();
    }

    ImageSize {
        width,
        height,
        hide_x_dots: hide_x.max(0) as usize,
        hide_y_dots: hide_y.max(0) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn loads_base64_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png(8, 4)));
        let logo = Logo::load(&uri).unwrap();
        assert_eq!((logo.width, logo.height), (8, 4));
        assert!(logo.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn rejects_unusable_sources() {
        assert!(matches!(
            Logo::load("https://example.com/logo.png"),
            Err(Error::ImageSource { .. })
        ));
        assert!(matches!(
            Logo::load("data:image/png,raw"),
            Err(Error::ImageSource { .. })
        ));
        assert!(matches!(
            Logo::load("/definitely/not/here.png"),
            Err(Error::ImageSource { .. })
        ));
        assert!(Logo::from_bytes(b"not an image").is_err());
    }

    #[test]
    fn square_logo_hides_odd_square_area() {
        // 25 modules, Q level, imageSize 0.4: floor(0.25 * 0.4 * 625) = 62
        let size = calculate_image_size(100.0, 100.0, 62.0, 25 - 14, 10.0);
        assert_eq!(size.hide_x_dots, 7);
        assert_eq!(size.hide_y_dots, 7);
        assert_eq!(size.width, 70.0);
        assert_eq!(size.height, 70.0);
    }

    #[test]
    fn wide_logo_is_limited_by_axis() {
        let size = calculate_image_size(400.0, 100.0, 62.0, 11, 10.0);
        assert!(size.hide_x_dots <= 11);
        assert_eq!(size.hide_x_dots % 2, 1);
        assert_eq!(size.hide_y_dots % 2, 1);
        assert!(size.hide_x_dots * size.hide_y_dots <= 62);
        assert!(size.width > size.height);
    }

    #[test]
    fn degenerate_input_hides_nothing() {
        assert_eq!(calculate_image_size(0.0, 10.0, 62.0, 11, 10.0), ImageSize::default());
        assert_eq!(calculate_image_size(10.0, 10.0, 0.0, 11, 10.0), ImageSize::default());
    }
}
