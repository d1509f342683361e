//! Reading QR codes out of raw RGBA pixel data.

use serde::{Deserialize, Serialize};

/// Which luminance images the decoder is given, and in what order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InversionAttempts {
    AttemptBoth,
    DontInvert,
    OnlyInvert,
    InvertFirst,
}

impl Default for InversionAttempts {
    fn default() -> Self {
        InversionAttempts::AttemptBoth
    }
}

impl InversionAttempts {
    /// `false` is the image as given, `true` its inversion.
    pub fn passes(self) -> &'static [bool] {
        match self {
            InversionAttempts::AttemptBoth => &[false, true],
            InversionAttempts::DontInvert => &[false],
            InversionAttempts::OnlyInvert => &[true],
            InversionAttempts::InvertFirst => &[true, false],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inversion_attempts: Option<InversionAttempts>,
}

impl DecodeOptions {
    pub fn defaults() -> Self {
        DecodeOptions {
            inversion_attempts: Some(InversionAttempts::AttemptBoth),
        }
    }

    /// Caller options laid over [`DecodeOptions::defaults`].
    pub fn with_defaults(self) -> Self {
        DecodeOptions {
            inversion_attempts: self
                .inversion_attempts
                .or(Self::defaults().inversion_attempts),
        }
    }

    pub fn inversion_attempts(&self) -> InversionAttempts {
        self.inversion_attempts.unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub top_right_corner: Point,
    pub top_left_corner: Point,
    pub bottom_right_corner: Point,
    pub bottom_left_corner: Point,
    pub top_right_finder_pattern: Point,
    pub top_left_finder_pattern: Point,
    pub bottom_left_finder_pattern: Point,
    /// Absent for version 1 symbols, which have no alignment pattern.
    pub bottom_right_alignment_pattern: Option<Point>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResult {
    pub binary_data: Vec<u8>,
    pub data: String,
    pub version: u32,
    pub location: Location,
}

/// Decodes the first readable symbol in an RGBA buffer of `width` x `height`.
///
/// Buffers whose length does not match the dimensions, and images without a
/// readable symbol, give `None`.
pub fn decode(data: &[u8], width: u32, height: u32, options: &DecodeOptions) -> Option<QrCodeResult> {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 || w.checked_mul(h).and_then(|n| n.checked_mul(4)) != Some(data.len()) {
        log::warn!(
            "rejecting pixel buffer of {} bytes for a {}x{} image",
            data.len(),
            width,
            height
        );
        return None;
    }

    let luma: Vec<u8> = data
        .chunks_exact(4)
        .map(|px| {
            let value = 0.2126 * px[0] as f64 + 0.7152 * px[1] as f64 + 0.0722 * px[2] as f64;
            value.round().min(255.0) as u8
        })
        .collect();

    let strategy = options.inversion_attempts();
    for &inverted in strategy.passes() {
        if let Some(result) = scan(&luma, w, h, inverted) {
            log::debug!(
                "decoded version {} symbol ({} bytes, inverted: {})",
                result.version,
                result.binary_data.len(),
                inverted
            );
            return Some(result);
        }
    }
    log::debug!("no symbol found using {:?}", strategy);
    None
}

fn scan(luma: &[u8], width: usize, height: usize, inverted: bool) -> Option<QrCodeResult> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        let value = luma[y * width + x];
        if inverted {
            255 - value
        } else {
            value
        }
    });

    prepared.detect_grids().into_iter().find_map(|grid| {
        let mut binary_data = Vec::new();
        let meta = match grid.decode_to(&mut binary_data) {
            Ok(meta) => meta,
            Err(err) => {
                log::debug!("grid found but not decodable: {:?}", err);
                return None;
            }
        };
        let version = meta.version.0 as u32;
        let corners = grid.bounds.map(|p| Point {
            x: p.x as f64,
            y: p.y as f64,
        });
        let data = match String::from_utf8(binary_data.clone()) {
            Ok(text) => text,
            Err(_) => binary_data.iter().map(|&b| char::from(b)).collect(),
        };
        Some(QrCodeResult {
            binary_data,
            data,
            version,
            location: locate(corners, version),
        })
    })
}

/// Corners are top-left, top-right, bottom-right, bottom-left. Pattern
/// centers are projected from module space through the quad they span.
fn locate(corners: [Point; 4], version: u32) -> Location {
    let modules = (17 + 4 * version) as f64;
    let projection = Projection::onto(corners);
    let at = |col: f64, row: f64| projection.apply(col / modules, row / modules);

    Location {
        top_left_corner: corners[0],
        top_right_corner: corners[1],
        bottom_right_corner: corners[2],
        bottom_left_corner: corners[3],
        top_left_finder_pattern: at(3.5, 3.5),
        top_right_finder_pattern: at(modules - 3.5, 3.5),
        bottom_left_finder_pattern: at(3.5, modules - 3.5),
        bottom_right_alignment_pattern: if version >= 2 {
            Some(at(modules - 6.5, modules - 6.5))
        } else {
            None
        },
    }
}

/// Perspective map from the unit square onto a quadrilateral.
struct Projection {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
}

impl Projection {
    fn onto([p0, p1, p2, p3]: [Point; 4]) -> Self {
        let sx = p0.x - p1.x + p2.x - p3.x;
        let sy = p0.y - p1.y + p2.y - p3.y;
        if sx == 0.0 && sy == 0.0 {
            return Projection {
                a11: p1.x - p0.x,
                a12: p1.y - p0.y,
                a13: 0.0,
                a21: p2.x - p1.x,
                a22: p2.y - p1.y,
                a23: 0.0,
                a31: p0.x,
                a32: p0.y,
            };
        }

        let dx1 = p1.x - p2.x;
        let dx2 = p3.x - p2.x;
        let dy1 = p1.y - p2.y;
        let dy2 = p3.y - p2.y;
        let den = dx1 * dy2 - dx2 * dy1;
        let a13 = (sx * dy2 - dx2 * sy) / den;
        let a23 = (dx1 * sy - sx * dy1) / den;
        Projection {
            a11: p1.x - p0.x + a13 * p1.x,
            a12: p1.y - p0.y + a13 * p1.y,
            a13,
            a21: p3.x - p0.x + a23 * p3.x,
            a22: p3.y - p0.y + a23 * p3.y,
            a23,
            a31: p0.x,
            a32: p0.y,
        }
    }

    fn apply(&self, u: f64, v: f64) -> Point {
        let den = self.a13 * u + self.a23 * v + 1.0;
        Point {
            x: (self.a11 * u + self.a21 * v + self.a31) / den,
            y: (self.a12 * u + self.a22 * v + self.a32) / den,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::rasterize;
    use crate::options::Options;
    use crate::renderer::QrCodeStyling;

    fn pixels(data: &str) -> (Vec<u8>, u32, u32) {
        let options = Options {
            margin: Some(40.0),
            ..Options::new(data)
        };
        let qr = QrCodeStyling::new(options.with_defaults()).unwrap();
        let image = rasterize(qr.svg(), 300, 300).unwrap();
        (image.into_raw(), 300, 300)
    }

    fn inverted(mut data: Vec<u8>) -> Vec<u8> {
        for px in data.chunks_exact_mut(4) {
            for channel in &mut px[..3] {
                *channel = 255 - *channel;
            }
        }
        data
    }

    fn with(strategy: InversionAttempts) -> DecodeOptions {
        DecodeOptions {
            inversion_attempts: Some(strategy),
        }
    }

    #[test]
    fn default_strategy_attempts_both() {
        assert_eq!(DecodeOptions::default().inversion_attempts(), InversionAttempts::AttemptBoth);
        assert_eq!(
            DecodeOptions::default().with_defaults().inversion_attempts,
            Some(InversionAttempts::AttemptBoth)
        );
        assert_eq!(
            with(InversionAttempts::DontInvert).with_defaults().inversion_attempts,
            Some(InversionAttempts::DontInvert)
        );
        assert_eq!(InversionAttempts::AttemptBoth.passes(), &[false, true]);
        assert_eq!(with(InversionAttempts::InvertFirst).inversion_attempts().passes(), &[true, false]);
    }

    #[test]
    fn decodes_rendered_code() {
        let (data, width, height) = pixels("hello renderer");
        let result = decode(&data, width, height, &DecodeOptions::default()).unwrap();
        assert_eq!(result.data, "hello renderer");
        assert_eq!(result.binary_data, b"hello renderer".to_vec());
        assert_eq!(result.version, 2);

        let location = result.location;
        assert!(location.top_left_corner.x < location.top_right_corner.x);
        assert!(location.top_left_corner.y < location.bottom_left_corner.y);
        assert!(location.top_left_finder_pattern.x > location.top_left_corner.x);
        assert!(location.bottom_right_alignment_pattern.is_some());
    }

    #[test]
    fn inversion_strategy_is_respected() {
        let (data, width, height) = pixels("inverted");
        let negative = inverted(data.clone());

        assert!(decode(&negative, width, height, &with(InversionAttempts::DontInvert)).is_none());
        assert!(decode(&negative, width, height, &with(InversionAttempts::OnlyInvert)).is_some());
        assert!(decode(&negative, width, height, &with(InversionAttempts::AttemptBoth)).is_some());
        assert!(decode(&negative, width, height, &with(InversionAttempts::InvertFirst)).is_some());
        assert!(decode(&data, width, height, &with(InversionAttempts::OnlyInvert)).is_none());
    }

    #[test]
    fn malformed_input_is_absent() {
        let options = DecodeOptions::default();
        assert!(decode(&[], 0, 0, &options).is_none());
        assert!(decode(&[0; 10], 3, 3, &options).is_none());
        assert!(decode(&[255; 4 * 40 * 40], 40, 40, &options).is_none());
    }

    #[test]
    fn projection_of_axis_aligned_square() {
        let corners = [
            Point { x: 10.0, y: 10.0 },
            Point { x: 220.0, y: 10.0 },
            Point { x: 220.0, y: 220.0 },
            Point { x: 10.0, y: 220.0 },
        ];
        let location = locate(corners, 1);
        let near = |p: Point, x: f64, y: f64| (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9;
        // 21 modules over 210px: finder centers 3.5 modules = 35px in
        assert!(near(location.top_left_finder_pattern, 45.0, 45.0));
        assert!(near(location.top_right_finder_pattern, 185.0, 45.0));
        assert!(near(location.bottom_left_finder_pattern, 45.0, 185.0));
        assert!(location.bottom_right_alignment_pattern.is_none());

        let skewed = [
            Point { x: 0.0, y: 0.0 },
            Point { x: 100.0, y: 10.0 },
            Point { x: 90.0, y: 120.0 },
            Point { x: 5.0, y: 100.0 },
        ];
        let projection = Projection::onto(skewed);
        for (corner, (u, v)) in skewed.iter().zip([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]) {
            assert!(near(projection.apply(u, v), corner.x, corner.y));
        }
    }
}
