//! Render configuration: the caller-facing partial record, the facade
//! defaults it is merged over, and the fully resolved form the renderer draws
//! from.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawType {
    Svg,
    Canvas,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Square,
    Circle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotType {
    Dots,
    Rounded,
    Classy,
    ClassyRounded,
    Square,
    ExtraRounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareType {
    Dot,
    Square,
    ExtraRounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotType {
    Dot,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    Linear,
    Radial,
}

impl Default for GradientType {
    fn default() -> Self {
        GradientType::Linear
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    /// Share of the symbol that may be covered (by a logo) and still decode.
    pub fn recoverable_share(self) -> f64 {
        match self {
            ErrorCorrectionLevel::L => 0.07,
            ErrorCorrectionLevel::M => 0.15,
            ErrorCorrectionLevel::Q => 0.25,
            ErrorCorrectionLevel::H => 0.30,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Numeric,
    Alphanumeric,
    Byte,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Color gradient applied to one visual layer.
///
/// Missing or `null` fields deserialize to the normalized defaults: `linear`,
/// rotation `0` and no color stops. JavaScript serializes `NaN` as `null`, so
/// a `NaN` rotation arrives here as unset too.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub gradient_type: GradientType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rotation: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_stops: Vec<ColorStop>,
}

impl Gradient {
    pub fn from_stops(color_stops: Vec<ColorStop>) -> Self {
        Gradient {
            color_stops,
            ..Default::default()
        }
    }

    /// Normalized copy; a rotation that is not a number counts as unset.
    pub fn normalized(&self) -> Self {
        Gradient {
            gradient_type: self.gradient_type,
            rotation: if self.rotation.is_nan() { 0.0 } else { self.rotation },
            color_stops: self.color_stops.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_number: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_correction_level: Option<ErrorCorrectionLevel>,
}

/// Logo placement options.
///
/// `cross_origin` and `save_as_blob` describe how a browser fetches a remote
/// logo. Logos are always embedded as data URIs here, so both are carried for
/// configuration compatibility only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_background_dots: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_as_blob: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotsOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dot_type: Option<DotType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_size: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornersSquareOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub corner_type: Option<CornerSquareType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornersDotOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub corner_type: Option<CornerDotType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

/// Field-by-field merge of two partial option objects.
fn merge_nested<T>(base: Option<T>, overrides: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (base, overrides) {
        (Some(base), Some(overrides)) => Some(merge(base, overrides)),
        (base, overrides) => overrides.or(base),
    }
}

impl QrOptions {
    fn merge(self, overrides: QrOptions) -> QrOptions {
        QrOptions {
            type_number: overrides.type_number.or(self.type_number),
            mode: overrides.mode.or(self.mode),
            error_correction_level: overrides
                .error_correction_level
                .or(self.error_correction_level),
        }
    }
}

impl ImageOptions {
    fn merge(self, overrides: ImageOptions) -> ImageOptions {
        ImageOptions {
            hide_background_dots: overrides.hide_background_dots.or(self.hide_background_dots),
            image_size: overrides.image_size.or(self.image_size),
            cross_origin: overrides.cross_origin.or(self.cross_origin),
            margin: overrides.margin.or(self.margin),
            save_as_blob: overrides.save_as_blob.or(self.save_as_blob),
        }
    }
}

// A gradient is replaced as a whole: its fields are already normalized, so an
// unset field cannot be told apart from a default one.

impl DotsOptions {
    fn merge(self, overrides: DotsOptions) -> DotsOptions {
        DotsOptions {
            dot_type: overrides.dot_type.or(self.dot_type),
            color: overrides.color.or(self.color),
            gradient: overrides.gradient.or(self.gradient),
            round_size: overrides.round_size.or(self.round_size),
        }
    }
}

impl BackgroundOptions {
    fn merge(self, overrides: BackgroundOptions) -> BackgroundOptions {
        BackgroundOptions {
            round: overrides.round.or(self.round),
            color: overrides.color.or(self.color),
            gradient: overrides.gradient.or(self.gradient),
        }
    }
}

impl CornersSquareOptions {
    fn merge(self, overrides: CornersSquareOptions) -> CornersSquareOptions {
        CornersSquareOptions {
            corner_type: overrides.corner_type.or(self.corner_type),
            color: overrides.color.or(self.color),
            gradient: overrides.gradient.or(self.gradient),
        }
    }
}

impl CornersDotOptions {
    fn merge(self, overrides: CornersDotOptions) -> CornersDotOptions {
        CornersDotOptions {
            corner_type: overrides.corner_type.or(self.corner_type),
            color: overrides.color.or(self.color),
            gradient: overrides.gradient.or(self.gradient),
        }
    }
}

/// Partial render configuration as supplied by a caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub draw_type: Option<DrawType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_options: Option<QrOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_options: Option<ImageOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dots_options: Option<DotsOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corners_square_options: Option<CornersSquareOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corners_dot_options: Option<CornersDotOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_options: Option<BackgroundOptions>,
}

impl Options {
    pub fn new(data: impl Into<String>) -> Self {
        Options {
            data: Some(data.into()),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The configuration every generated code starts from.
    pub fn defaults() -> Self {
        Options {
            width: Some(300),
            height: Some(300),
            draw_type: Some(DrawType::Svg),
            shape: Some(ShapeType::Square),
            dots_options: Some(DotsOptions {
                color: Some("#000000".to_owned()),
                dot_type: Some(DotType::Square),
                round_size: Some(true),
                gradient: None,
            }),
            background_options: Some(BackgroundOptions {
                color: Some("#ffffff".to_owned()),
                ..Default::default()
            }),
            image_options: Some(ImageOptions {
                cross_origin: Some("anonymous".to_owned()),
                margin: Some(20.0),
                save_as_blob: Some(true),
                ..Default::default()
            }),
            corners_square_options: Some(CornersSquareOptions {
                corner_type: Some(CornerSquareType::Square),
                ..Default::default()
            }),
            corners_dot_options: Some(CornersDotOptions {
                corner_type: Some(CornerDotType::Square),
                ..Default::default()
            }),
            qr_options: Some(QrOptions {
                error_correction_level: Some(ErrorCorrectionLevel::Q),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Normalizes every gradient sub-object in place.
    pub fn normalize_gradients(&mut self) {
        fn normalize(gradient: &mut Option<Gradient>) {
            if let Some(g) = gradient.as_mut() {
                *g = g.normalized();
            }
        }

        if let Some(dots) = self.dots_options.as_mut() {
            normalize(&mut dots.gradient);
        }
        if let Some(background) = self.background_options.as_mut() {
            normalize(&mut background.gradient);
        }
        if let Some(corners) = self.corners_square_options.as_mut() {
            normalize(&mut corners.gradient);
        }
        if let Some(corners) = self.corners_dot_options.as_mut() {
            normalize(&mut corners.gradient);
        }
    }

    /// Shallow merge: every top-level field the caller set wins, including
    /// nested objects, which replace the default object as a whole.
    pub fn merge(self, overrides: Options) -> Options {
        Options {
            draw_type: overrides.draw_type.or(self.draw_type),
            shape: overrides.shape.or(self.shape),
            width: overrides.width.or(self.width),
            height: overrides.height.or(self.height),
            margin: overrides.margin.or(self.margin),
            data: overrides.data.or(self.data),
            image: overrides.image.or(self.image),
            qr_options: overrides.qr_options.or(self.qr_options),
            image_options: overrides.image_options.or(self.image_options),
            dots_options: overrides.dots_options.or(self.dots_options),
            corners_square_options: overrides
                .corners_square_options
                .or(self.corners_square_options),
            corners_dot_options: overrides.corners_dot_options.or(self.corners_dot_options),
            background_options: overrides.background_options.or(self.background_options),
        }
    }

    /// Deep merge: nested option objects are merged field by field, so
    /// setting one nested field keeps its siblings.
    pub fn merge_deep(self, overrides: Options) -> Options {
        Options {
            qr_options: merge_nested(self.qr_options, overrides.qr_options, QrOptions::merge),
            image_options: merge_nested(
                self.image_options,
                overrides.image_options,
                ImageOptions::merge,
            ),
            dots_options: merge_nested(self.dots_options, overrides.dots_options, DotsOptions::merge),
            corners_square_options: merge_nested(
                self.corners_square_options,
                overrides.corners_square_options,
                CornersSquareOptions::merge,
            ),
            corners_dot_options: merge_nested(
                self.corners_dot_options,
                overrides.corners_dot_options,
                CornersDotOptions::merge,
            ),
            background_options: merge_nested(
                self.background_options,
                overrides.background_options,
                BackgroundOptions::merge,
            ),
            draw_type: overrides.draw_type.or(self.draw_type),
            shape: overrides.shape.or(self.shape),
            width: overrides.width.or(self.width),
            height: overrides.height.or(self.height),
            margin: overrides.margin.or(self.margin),
            data: overrides.data.or(self.data),
            image: overrides.image.or(self.image),
        }
    }

    /// Caller options laid over [`Options::defaults`], gradients normalized.
    pub fn with_defaults(mut self) -> Options {
        self.normalize_gradients();
        Options::defaults().merge(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedQrOptions {
    pub type_number: u8,
    pub mode: Option<Mode>,
    pub error_correction_level: ErrorCorrectionLevel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedImageOptions {
    pub hide_background_dots: bool,
    pub image_size: f64,
    pub margin: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedDots {
    pub dot_type: DotType,
    pub color: String,
    pub gradient: Option<Gradient>,
    pub round_size: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBackground {
    pub round: f64,
    pub color: String,
    pub gradient: Option<Gradient>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCorner<T> {
    /// `None` draws the corner module by module with the dot drawer.
    pub corner_type: Option<T>,
    pub color: String,
    pub gradient: Option<Gradient>,
}

/// Every option the renderer needs, with its own defaults filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedOptions {
    pub draw_type: DrawType,
    pub shape: ShapeType,
    pub width: u32,
    pub height: u32,
    pub margin: f64,
    pub data: String,
    pub image: Option<String>,
    pub qr: ResolvedQrOptions,
    pub image_options: ResolvedImageOptions,
    pub dots: ResolvedDots,
    pub background: ResolvedBackground,
    pub corners_square: ResolvedCorner<CornerSquareType>,
    pub corners_dot: ResolvedCorner<CornerDotType>,
}

impl ResolvedOptions {
    pub fn resolve(options: &Options) -> Self {
        let qr = options.qr_options.clone().unwrap_or_default();
        let image_options = options.image_options.clone().unwrap_or_default();
        let dots = options.dots_options.clone().unwrap_or_default();
        let background = options.background_options.clone().unwrap_or_default();
        let corners_square = options.corners_square_options.clone().unwrap_or_default();
        let corners_dot = options.corners_dot_options.clone().unwrap_or_default();

        let dots = ResolvedDots {
            dot_type: dots.dot_type.unwrap_or(DotType::Square),
            color: dots.color.unwrap_or_else(|| "#000".to_owned()),
            gradient: dots.gradient.map(|g| g.normalized()),
            round_size: dots.round_size.unwrap_or(true),
        };

        let corner_paint = |color: Option<String>, gradient: Option<Gradient>| match (color, gradient) {
            (None, None) => (dots.color.clone(), dots.gradient.clone()),
            (color, gradient) => (
                color.unwrap_or_else(|| dots.color.clone()),
                gradient.map(|g| g.normalized()),
            ),
        };
        let (square_color, square_gradient) =
            corner_paint(corners_square.color, corners_square.gradient);
        let (dot_color, dot_gradient) = corner_paint(corners_dot.color, corners_dot.gradient);

        ResolvedOptions {
            draw_type: options.draw_type.unwrap_or(DrawType::Canvas),
            shape: options.shape.unwrap_or(ShapeType::Square),
            width: options.width.unwrap_or(300),
            height: options.height.unwrap_or(300),
            margin: options.margin.unwrap_or(0.0),
            data: options.data.clone().unwrap_or_default(),
            image: options.image.clone().filter(|image| !image.is_empty()),
            qr: ResolvedQrOptions {
                type_number: qr.type_number.unwrap_or(0),
                mode: qr.mode,
                error_correction_level: qr.error_correction_level.unwrap_or(ErrorCorrectionLevel::Q),
            },
            image_options: ResolvedImageOptions {
                hide_background_dots: image_options.hide_background_dots.unwrap_or(true),
                image_size: image_options.image_size.unwrap_or(0.4),
                margin: image_options.margin.unwrap_or(0.0),
            },
            background: ResolvedBackground {
                round: background.round.unwrap_or(0.0),
                color: background.color.unwrap_or_else(|| "#fff".to_owned()),
                gradient: background.gradient.map(|g| g.normalized()),
            },
            corners_square: ResolvedCorner {
                corner_type: corners_square.corner_type,
                color: square_color,
                gradient: square_gradient,
            },
            corners_dot: ResolvedCorner {
                corner_type: corners_dot.corner_type,
                color: dot_color,
                gradient: dot_gradient,
            },
            dots,
        }
    }
}
