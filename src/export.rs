//! Exporting a rendered code as file data, and where downloads go.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::renderer::QrCodeStyling;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl Extension {
    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Png => "png",
            Extension::Jpeg => "jpeg",
            Extension::Webp => "webp",
            Extension::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Extension::Png => "image/png",
            Extension::Jpeg => "image/jpeg",
            Extension::Webp => "image/webp",
            Extension::Svg => "image/svg+xml",
        }
    }
}

/// Caller-supplied export options; unset fields fall back to `qr` / `png`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Extension>,
}

/// A fully specified export request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub name: String,
    pub extension: Extension,
}

impl Download {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension.as_str())
    }
}

impl Default for Download {
    fn default() -> Self {
        Download {
            name: "qr".to_owned(),
            extension: Extension::Png,
        }
    }
}

impl DownloadOptions {
    pub fn resolve(self) -> Download {
        let defaults = Download::default();
        Download {
            name: self.name.unwrap_or(defaults.name),
            extension: self.extension.unwrap_or(defaults.extension),
        }
    }
}

/// Receives exported files.
pub trait DownloadTarget {
    fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<()>;
}

/// Writes downloads into a directory.
#[derive(Clone, Debug)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        DirectoryTarget {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn current() -> Self {
        Self::new(".")
    }
}

impl DownloadTarget for DirectoryTarget {
    fn save(&self, file_name: &str, _mime_type: &str, data: &[u8]) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let path = self.dir.join(file_name);
        std::fs::write(&path, data)?;
        log::info!("saved {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}

/// Renders SVG markup into a `width` x `height` bitmap.
pub fn rasterize(svg: &str, width: u32, height: u32) -> Result<RgbaImage> {
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default())?;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(Error::Canvas { width, height })?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut image = RgbaImage::new(width, height);
    for (out, pixel) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = pixel.demultiply();
        *out = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    Ok(image)
}

impl QrCodeStyling {
    /// File contents of this code in the given format.
    pub async fn get_raw_data(&self, extension: Extension) -> Result<Vec<u8>> {
        if self.symbol().is_none() {
            return Err(Error::EmptyQrCode);
        }

        if extension == Extension::Svg {
            let mut data = b"<?xml version=\"1.0\" standalone=\"no\"?>\r\n".to_vec();
            data.extend_from_slice(self.svg().as_bytes());
            return Ok(data);
        }

        let options = self.resolved_options();
        let image = DynamicImage::ImageRgba8(rasterize(self.svg(), options.width, options.height)?);
        let mut data = Vec::new();
        let mut cursor = Cursor::new(&mut data);
        match extension {
            Extension::Png => image.write_to(&mut cursor, ImageFormat::Png)?,
            Extension::Webp => image.write_to(&mut cursor, ImageFormat::WebP)?,
            Extension::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, ImageFormat::Jpeg)?,
            Extension::Svg => unreachable!("handled above"),
        }
        Ok(data)
    }

    /// Exports this code and hands the file to `target`.
    pub async fn download(&self, download: &Download, target: &dyn DownloadTarget) -> Result<()> {
        let data = self.get_raw_data(download.extension).await?;
        log::debug!("exporting {} ({} bytes)", download.file_name(), data.len());
        target.save(&download.file_name(), download.extension.mime_type(), &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use futures::executor::block_on;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(String, String, usize)>>);

    impl DownloadTarget for Recorder {
        fn save(&self, file_name: &str, mime_type: &str, data: &[u8]) -> Result<()> {
            self.0
                .borrow_mut()
                .push((file_name.to_owned(), mime_type.to_owned(), data.len()));
            Ok(())
        }
    }

    fn qr_code() -> QrCodeStyling {
        QrCodeStyling::new(Options::new("export me").with_defaults()).unwrap()
    }

    #[test]
    fn download_options_default_to_qr_png() {
        let download = DownloadOptions::default().resolve();
        assert_eq!(download.file_name(), "qr.png");

        let download = DownloadOptions {
            name: Some("ticket".to_owned()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(download.file_name(), "ticket.png");
    }

    #[test]
    fn raw_data_matches_format() {
        let qr = qr_code();
        let png = block_on(qr.get_raw_data(Extension::Png)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let jpeg = block_on(qr.get_raw_data(Extension::Jpeg)).unwrap();
        assert_eq!(&jpeg[..2], b"\xff\xd8");

        let webp = block_on(qr.get_raw_data(Extension::Webp)).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");

        let svg = block_on(qr.get_raw_data(Extension::Svg)).unwrap();
        assert!(svg.starts_with(b"<?xml"));
    }

    #[test]
    fn rasterized_png_has_requested_size() {
        let qr = qr_code();
        let png = block_on(qr.get_raw_data(Extension::Png)).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 300));
        // top-left finder module is dark, the corner of the canvas is background
        let rgba = decoded.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(rgba.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn download_hands_file_to_target() {
        let recorder = Recorder::default();
        let download = DownloadOptions {
            extension: Some(Extension::Svg),
            name: Some("badge".to_owned()),
        }
        .resolve();
        block_on(qr_code().download(&download, &recorder)).unwrap();

        let saved = recorder.0.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "badge.svg");
        assert_eq!(saved[0].1, "image/svg+xml");
        assert!(saved[0].2 > 0);
    }

    #[test]
    fn empty_code_cannot_be_exported() {
        let empty = QrCodeStyling::new(Options::default().with_defaults()).unwrap();
        let recorder = Recorder::default();
        let result = block_on(empty.download(&Download::default(), &recorder));
        assert!(matches!(result, Err(Error::EmptyQrCode)));
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn directory_target_writes_file() {
        let dir = std::env::temp_dir().join(format!("qr-styling-{}", uuid::Uuid::new_v4()));
        let target = DirectoryTarget::new(&dir);
        target.save("code.svg", "image/svg+xml", b"<svg/>").unwrap();
        assert_eq!(std::fs::read(dir.join("code.svg")).unwrap(), b"<svg/>");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
