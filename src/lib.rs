//! Styled QR codes: generate them from merged options, read them back out of
//! pixel data, and export them as files.
//!
//! The three entry points mirror each other:
//!
//! ```no_run
//! use qr_styling::{decode, download, generate, Options};
//!
//! # async fn run() -> qr_styling::Result<()> {
//! let qr_code = generate(Options::new("https://example.com"), None)?;
//! download(&qr_code, None).await?; // writes ./qr.png
//!
//! # let (pixels, width, height) = (Vec::<u8>::new(), 0, 0);
//! if let Some(result) = decode(&pixels, width, height, None) {
//!     println!("{}", result.data);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Symbols are encoded with `qrcodegen`, drawn as SVG, rasterized with
//! `resvg` and read with `rqrr`. On `wasm32` the same surface is exported to
//! JavaScript and renders into DOM elements.

mod container;
mod error;
mod export;
mod logo;
pub mod options;
mod qr_generator;
mod qr_reader;
mod renderer;
mod shapes;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use container::{Container, Element};
pub use error::{Error, Result};
pub use export::{DirectoryTarget, Download, DownloadOptions, DownloadTarget, Extension};
pub use options::{Gradient, Options};
pub use qr_generator::Symbol;
pub use qr_reader::{DecodeOptions, InversionAttempts, Location, Point, QrCodeResult};
pub use renderer::QrCodeStyling;

/// Builds a renderer from `options` laid over the defaults, attaching it to
/// `container` when one is given.
pub fn generate(options: Options, container: Option<&dyn Container>) -> Result<QrCodeStyling> {
    let options = options.with_defaults();
    let qr_code = QrCodeStyling::new(options)?;
    if let Some(container) = container {
        qr_code.append(container)?;
    }
    log::debug!(
        "generated {}x{} code, attached: {}",
        qr_code.resolved_options().width,
        qr_code.resolved_options().height,
        container.is_some()
    );
    Ok(qr_code)
}

/// Reads a QR code out of an RGBA buffer. Returns `None` for unreadable or
/// malformed input.
pub fn decode(
    data: &[u8],
    width: u32,
    height: u32,
    options: Option<DecodeOptions>,
) -> Option<QrCodeResult> {
    let options = options.unwrap_or_default().with_defaults();
    qr_reader::decode(data, width, height, &options)
}

/// Exports `qr_code` with the platform's download mechanism: a file in the
/// current directory, or a browser download on `wasm32`.
pub async fn download(qr_code: &QrCodeStyling, options: Option<DownloadOptions>) -> Result<()> {
    download_to(qr_code, options, &platform_target()).await
}

pub async fn download_to(
    qr_code: &QrCodeStyling,
    options: Option<DownloadOptions>,
    target: &dyn DownloadTarget,
) -> Result<()> {
    let download = options.unwrap_or_default().resolve();
    qr_code.download(&download, target).await
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_target() -> DirectoryTarget {
    DirectoryTarget::current()
}

#[cfg(target_arch = "wasm32")]
fn platform_target() -> wasm::BrowserDownload {
    wasm::BrowserDownload
}
