use thiserror::Error;

/// Failures raised by the collaborators behind the facade.
///
/// Nothing here is classified or recovered locally; each variant only carries
/// the underlying error up to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("data too long for the requested version and error correction level: {0}")]
    DataTooLong(#[from] qrcodegen::DataTooLong),

    #[error("data {data:?} cannot be encoded in {mode} mode")]
    InvalidMode { mode: &'static str, data: String },

    #[error("type number {0} is outside 0..=40")]
    InvalidTypeNumber(u8),

    #[error("QR code is empty")]
    EmptyQrCode,

    #[error("failed to load image {source_name}: {reason}")]
    ImageSource { source_name: String, reason: String },

    #[error("failed to decode image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to parse rendered SVG: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser call failed: {0}")]
    Browser(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
