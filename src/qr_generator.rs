use qrcodegen::{QrCode, QrCodeEcc, QrSegment, Version};

use crate::error::{Error, Result};
use crate::options::{ErrorCorrectionLevel, Mode, ResolvedQrOptions};

impl From<ErrorCorrectionLevel> for QrCodeEcc {
    fn from(level: ErrorCorrectionLevel) -> Self {
        match level {
            ErrorCorrectionLevel::L => QrCodeEcc::Low,
            ErrorCorrectionLevel::M => QrCodeEcc::Medium,
            ErrorCorrectionLevel::Q => QrCodeEcc::Quartile,
            ErrorCorrectionLevel::H => QrCodeEcc::High,
        }
    }
}

/// Module grid of an encoded symbol, row-major, `true` for dark modules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    version: u8,
    size: usize,
    modules: Vec<bool>,
}

impl Symbol {
    fn from_qr(qr: &QrCode) -> Self {
        let size = qr.size();
        let mut modules = Vec::with_capacity((size * size) as usize);
        for row in 0..size {
            for col in 0..size {
                modules.push(qr.get_module(col, row));
            }
        }
        Symbol {
            version: qr.version().value(),
            size: size as usize,
            modules,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Modules per side.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.modules[row * self.size + col]
    }
}

/// Encodes `data` into a symbol.
///
/// A type number of 0 picks the smallest version that fits; anything else
/// pins the version. The error correction level is never boosted.
pub fn encode_data(data: &str, options: &ResolvedQrOptions) -> Result<Symbol> {
    let segments = segments(data, options.mode)?;
    let (min_version, max_version) = match options.type_number {
        0 => (Version::MIN, Version::MAX),
        n if n <= 40 => (Version::new(n), Version::new(n)),
        n => return Err(Error::InvalidTypeNumber(n)),
    };

    let qr = QrCode::encode_segments_advanced(
        &segments,
        options.error_correction_level.into(),
        min_version,
        max_version,
        None,
        false,
    )?;
    log::debug!(
        "encoded {} bytes as version {} ({} modules)",
        data.len(),
        qr.version().value(),
        qr.size()
    );
    Ok(Symbol::from_qr(&qr))
}

fn segments(data: &str, mode: Option<Mode>) -> Result<Vec<QrSegment>> {
    let invalid = |mode| Error::InvalidMode {
        mode,
        data: data.to_owned(),
    };

    match mode {
        None => Ok(QrSegment::make_segments(data)),
        Some(Mode::Numeric) if QrSegment::is_numeric(data) => Ok(vec![QrSegment::make_numeric(data)]),
        Some(Mode::Numeric) => Err(invalid("Numeric")),
        Some(Mode::Alphanumeric) if QrSegment::is_alphanumeric(data) => {
            Ok(vec![QrSegment::make_alphanumeric(data)])
        }
        Some(Mode::Alphanumeric) => Err(invalid("Alphanumeric")),
        Some(Mode::Byte) => Ok(vec![QrSegment::make_bytes(data.as_bytes())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(type_number: u8, mode: Option<Mode>) -> ResolvedQrOptions {
        ResolvedQrOptions {
            type_number,
            mode,
            error_correction_level: ErrorCorrectionLevel::Q,
        }
    }

    #[test]
    fn automatic_version_is_smallest_fit() {
        let qr = encode_data("hello", &options(0, None)).unwrap();
        assert_eq!(qr.version(), 1);
        assert_eq!(qr.size(), 21);
        // finder pattern corner is dark, the separator next to it light
        assert!(qr.is_dark(0, 0));
        assert!(!qr.is_dark(7, 7));
        assert!(!qr.is_dark(21, 0));
    }

    #[test]
    fn type_number_pins_version() {
        let qr = encode_data("hello", &options(5, None)).unwrap();
        assert_eq!(qr.version(), 5);
        assert_eq!(qr.size(), 37);
    }

    #[test]
    fn too_long_for_pinned_version() {
        let data = "x".repeat(200);
        assert!(matches!(
            encode_data(&data, &options(1, None)),
            Err(Error::DataTooLong(_))
        ));
        assert!(matches!(
            encode_data("x", &options(41, None)),
            Err(Error::InvalidTypeNumber(41))
        ));
    }

    #[test]
    fn explicit_mode_must_match_data() {
        assert!(encode_data("0123456789", &options(0, Some(Mode::Numeric))).is_ok());
        assert!(encode_data("HELLO WORLD", &options(0, Some(Mode::Alphanumeric))).is_ok());
        assert!(encode_data("hello", &options(0, Some(Mode::Byte))).is_ok());
        assert!(matches!(
            encode_data("12a", &options(0, Some(Mode::Numeric))),
            Err(Error::InvalidMode { mode: "Numeric", .. })
        ));
        assert!(matches!(
            encode_data("lower", &options(0, Some(Mode::Alphanumeric))),
            Err(Error::InvalidMode { .. })
        ));
    }
}
