//! The renderer instance: an encoded symbol drawn as styled SVG.

use std::f64::consts::{PI, SQRT_2};
use std::fmt::Write;

use uuid::Uuid;

use crate::container::{Container, Element};
use crate::error::Result;
use crate::export;
use crate::logo::{calculate_image_size, ImageSize, Logo};
use crate::options::{
    DotType, DrawType, Gradient, GradientType, Options, ResolvedOptions, ShapeType,
};
use crate::qr_generator::{encode_data, Symbol};
use crate::shapes::{self, Neighbors};

/// Side of a finder pattern in modules.
const FINDER: usize = 7;

const SQUARE_MASK: [[bool; 7]; 7] = {
    const X: bool = true;
    const O: bool = false;
    [
        [X, X, X, X, X, X, X],
        [X, O, O, O, O, O, X],
        [X, O, O, O, O, O, X],
        [X, O, O, O, O, O, X],
        [X, O, O, O, O, O, X],
        [X, O, O, O, O, O, X],
        [X, X, X, X, X, X, X],
    ]
};

const DOT_MASK: [[bool; 7]; 7] = {
    const X: bool = true;
    const O: bool = false;
    [
        [O, O, O, O, O, O, O],
        [O, O, O, O, O, O, O],
        [O, O, X, X, X, O, O],
        [O, O, X, X, X, O, O],
        [O, O, X, X, X, O, O],
        [O, O, O, O, O, O, O],
        [O, O, O, O, O, O, O],
    ]
};

/// (column, row, rotation) of the three finder patterns.
const CORNERS: [(f64, f64, f64); 3] = [(0.0, 0.0, 0.0), (1.0, 0.0, PI / 2.0), (0.0, 1.0, -PI / 2.0)];

/// A drawable QR code built from merged options.
///
/// The instance owns its rendered SVG. Containers it is appended to are
/// borrowed only for the duration of the call.
#[derive(Clone, Debug)]
pub struct QrCodeStyling {
    source: Options,
    options: ResolvedOptions,
    symbol: Option<Symbol>,
    logo: Option<Logo>,
    instance_id: Uuid,
    svg: String,
}

impl QrCodeStyling {
    pub fn new(options: Options) -> Result<Self> {
        let mut qr_code = QrCodeStyling {
            options: ResolvedOptions::resolve(&options),
            source: options,
            symbol: None,
            logo: None,
            instance_id: Uuid::new_v4(),
            svg: String::new(),
        };
        qr_code.draw()?;
        Ok(qr_code)
    }

    /// Deep-merges `options` into the current ones and redraws.
    pub fn update(&mut self, mut options: Options) -> Result<()> {
        options.normalize_gradients();
        self.source = self.source.clone().merge_deep(options);
        self.options = ResolvedOptions::resolve(&self.source);
        self.draw()
    }

    /// The options this instance was built from, before renderer defaults.
    pub fn options(&self) -> &Options {
        &self.source
    }

    pub fn resolved_options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// `None` when there was no data to encode.
    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Attaches the drawing to `container`. Nothing is attached while there
    /// is no symbol to show.
    pub fn append(&self, container: &dyn Container) -> Result<()> {
        if self.symbol.is_none() {
            log::debug!("nothing drawn yet, not attaching");
            return Ok(());
        }
        let element = match self.options.draw_type {
            DrawType::Svg => Element::Svg(self.svg.clone()),
            DrawType::Canvas => Element::Canvas(export::rasterize(
                &self.svg,
                self.options.width,
                self.options.height,
            )?),
        };
        container.append(element)
    }

    fn draw(&mut self) -> Result<()> {
        let options = &self.options;
        if options.data.is_empty() {
            log::debug!("no data to encode, skipping draw");
            self.symbol = None;
            self.logo = None;
            self.svg = svg_document(options.width, options.height, "", "");
            return Ok(());
        }

        let symbol = encode_data(&options.data, &options.qr)?;
        let logo = options.image.as_deref().map(Logo::load).transpose()?;
        self.svg = Drawing::new(options, &symbol, logo.as_ref(), self.instance_id).render();
        self.symbol = Some(symbol);
        self.logo = logo;
        Ok(())
    }
}

fn svg_document(width: u32, height: u32, defs: &str, body: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs>{}</defs>{}</svg>"#,
        defs,
        body,
        w = width,
        h = height
    )
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Geometry of one draw pass plus the SVG being accumulated.
struct Drawing<'a> {
    options: &'a ResolvedOptions,
    symbol: &'a Symbol,
    logo: Option<&'a Logo>,
    id: String,
    count: usize,
    dot_size: f64,
    min_size: f64,
    x_beginning: f64,
    y_beginning: f64,
    image_size: ImageSize,
    defs: String,
    body: String,
}

impl<'a> Drawing<'a> {
    fn new(
        options: &'a ResolvedOptions,
        symbol: &'a Symbol,
        logo: Option<&'a Logo>,
        instance_id: Uuid,
    ) -> Self {
        let round = |value: f64| {
            if options.dots.round_size {
                value.floor()
            } else {
                value
            }
        };

        let count = symbol.size();
        let width = options.width as f64;
        let height = options.height as f64;
        let min_size = width.min(height) - 2.0 * options.margin;
        let real_size = match options.shape {
            ShapeType::Circle => min_size / SQRT_2,
            ShapeType::Square => min_size,
        };
        let dot_size = round(real_size / count as f64).max(0.0);

        let image_size = logo
            .map(|logo| {
                let cover = options.image_options.image_size
                    * options.qr.error_correction_level.recoverable_share();
                let max_hidden_dots = (cover * (count * count) as f64).floor();
                calculate_image_size(
                    logo.width as f64,
                    logo.height as f64,
                    max_hidden_dots,
                    count.saturating_sub(14),
                    dot_size,
                )
            })
            .unwrap_or_default();

        Drawing {
            options,
            symbol,
            logo,
            id: instance_id.to_simple().to_string(),
            count,
            dot_size,
            min_size,
            x_beginning: round((width - count as f64 * dot_size) / 2.0),
            y_beginning: round((height - count as f64 * dot_size) / 2.0),
            image_size,
            defs: String::new(),
            body: String::new(),
        }
    }

    fn round(&self, value: f64) -> f64 {
        if self.options.dots.round_size {
            value.floor()
        } else {
            value
        }
    }

    fn render(mut self) -> String {
        self.draw_background();
        self.draw_dots();
        self.draw_corners();
        self.draw_image();
        svg_document(self.options.width, self.options.height, &self.defs, &self.body)
    }

    fn hidden_by_image(&self, row: usize, col: usize) -> bool {
        if self.logo.is_none() || !self.options.image_options.hide_background_dots {
            return false;
        }
        let count = self.count as f64;
        let (row, col) = (row as f64, col as f64);
        let hide_x = self.image_size.hide_x_dots as f64;
        let hide_y = self.image_size.hide_y_dots as f64;
        row >= (count - hide_y) / 2.0
            && row < (count + hide_y) / 2.0
            && col >= (count - hide_x) / 2.0
            && col < (count + hide_x) / 2.0
    }

    fn in_finder(&self, row: usize, col: usize) -> bool {
        let far = self.count.saturating_sub(FINDER);
        (row < FINDER && col < FINDER) || (row < FINDER && col >= far) || (row >= far && col < FINDER)
    }

    fn is_drawable(&self, row: i64, col: i64) -> bool {
        if row < 0 || col < 0 || row >= self.count as i64 || col >= self.count as i64 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        !self.in_finder(row, col) && !self.hidden_by_image(row, col) && self.symbol.is_dark(row, col)
    }

    fn draw_background(&mut self) {
        let options = self.options;
        let background = &options.background;
        let width = options.width as f64;
        let height = options.height as f64;
        let mut clip = None;

        if background.round > 0.0 {
            let size = width.min(height);
            let clip_id = format!("clip-path-background-color-{}", self.id);
            let _ = write!(
                self.defs,
                r#"<clipPath id="{}"><rect x="{}" y="{}" width="{s}" height="{s}" rx="{}"/></clipPath>"#,
                clip_id,
                (width - size) / 2.0,
                (height - size) / 2.0,
                size / 2.0 * background.round,
                s = size
            );
            clip = Some(clip_id);
        }

        let name = format!("background-color-{}", self.id);
        self.paint_rect(
            &name,
            background.gradient.as_ref(),
            &background.color,
            0.0,
            (0.0, 0.0, width, height),
            clip.as_deref(),
        );
    }

    fn draw_dots(&mut self) {
        let dot_type = self.options.dots.dot_type;
        let size = self.dot_size;
        let mut clip = String::new();

        for row in 0..self.count {
            for col in 0..self.count {
                if !self.is_drawable(row as i64, col as i64) {
                    continue;
                }
                let neighbors = Neighbors::from_fn(|dx, dy| self.is_drawable(row as i64 + dy, col as i64 + dx));
                clip.push_str(&shapes::dot(
                    dot_type,
                    self.x_beginning + col as f64 * size,
                    self.y_beginning + row as f64 * size,
                    size,
                    neighbors,
                ));
            }
        }

        if self.options.shape == ShapeType::Circle {
            clip.push_str(&self.circle_filler());
        }

        let clip_id = format!("clip-path-dot-color-{}", self.id);
        let _ = write!(self.defs, r#"<clipPath id="{}">{}</clipPath>"#, clip_id, clip);

        let options = self.options;
        let name = format!("dot-color-{}", self.id);
        self.paint_rect(
            &name,
            options.dots.gradient.as_ref(),
            &options.dots.color,
            0.0,
            (0.0, 0.0, options.width as f64, options.height as f64),
            Some(&clip_id),
        );
    }

    /// Decorative modules between the symbol and the bounding circle, copied
    /// from the symbol's own edges.
    fn circle_filler(&self) -> String {
        let count = self.count as i64;
        let size = self.dot_size;
        if size <= 0.0 {
            return String::new();
        }
        let additional = self.round((self.min_size / size - count as f64) / 2.0).max(0.0) as i64;
        let fake_count = count + 2 * additional;
        let x_fake = self.x_beginning - additional as f64 * size;
        let y_fake = self.y_beginning - additional as f64 * size;
        let center = self.round(fake_count as f64 / 2.0);

        let source = |i: i64| {
            if i - 2 * additional < 0 {
                i
            } else if i >= count {
                i - 2 * additional
            } else {
                i - additional
            }
        };

        let mut fake = vec![false; (fake_count * fake_count) as usize];
        for i in 0..fake_count {
            for j in 0..fake_count {
                let inside_symbol = i >= additional - 1
                    && i <= fake_count - additional
                    && j >= additional - 1
                    && j <= fake_count - additional;
                let (di, dj) = (i as f64 - center, j as f64 - center);
                if inside_symbol || (di * di + dj * dj).sqrt() > center {
                    continue;
                }
                let (row, col) = (source(i), source(j));
                fake[(i * fake_count + j) as usize] =
                    row >= 0 && col >= 0 && self.symbol.is_dark(row as usize, col as usize);
            }
        }

        let is_set = |i: i64, j: i64| {
            i >= 0 && j >= 0 && i < fake_count && j < fake_count && fake[(i * fake_count + j) as usize]
        };

        let mut out = String::new();
        for i in 0..fake_count {
            for j in 0..fake_count {
                if !is_set(i, j) {
                    continue;
                }
                out.push_str(&shapes::dot(
                    self.options.dots.dot_type,
                    x_fake + j as f64 * size,
                    y_fake + i as f64 * size,
                    size,
                    Neighbors::from_fn(|dx, dy| is_set(i + dy, j + dx)),
                ));
            }
        }
        out
    }

    fn draw_corners(&mut self) {
        let size = self.dot_size;
        let span = size * (self.count as f64 - FINDER as f64);
        let square_size = size * FINDER as f64;
        let dot_size = size * 3.0;
        let options = self.options;
        let square = &options.corners_square;
        let dot = &options.corners_dot;
        let dot_type = options.dots.dot_type;

        for &(column, row, rotation) in CORNERS.iter() {
            let x = self.x_beginning + column * span;
            let y = self.y_beginning + row * span;
            let suffix = format!("{}-{}-{}", column, row, self.id);

            let clip = match square.corner_type {
                Some(corner_type) => shapes::corner_square(corner_type, x, y, square_size, rotation),
                None => masked_modules(&SQUARE_MASK, dot_type, x, y, size),
            };
            let clip_id = format!("clip-path-corners-square-color-{}", suffix);
            let _ = write!(self.defs, r#"<clipPath id="{}">{}</clipPath>"#, clip_id, clip);
            self.paint_rect(
                &format!("corners-square-color-{}", suffix),
                square.gradient.as_ref(),
                &square.color,
                rotation,
                (x, y, square_size, square_size),
                Some(&clip_id),
            );

            let clip = match dot.corner_type {
                Some(corner_type) => {
                    shapes::corner_dot(corner_type, x + size * 2.0, y + size * 2.0, dot_size, rotation)
                }
                None => masked_modules(&DOT_MASK, dot_type, x, y, size),
            };
            let clip_id = format!("clip-path-corners-dot-color-{}", suffix);
            let _ = write!(self.defs, r#"<clipPath id="{}">{}</clipPath>"#, clip_id, clip);
            self.paint_rect(
                &format!("corners-dot-color-{}", suffix),
                dot.gradient.as_ref(),
                &dot.color,
                rotation,
                (x + size * 2.0, y + size * 2.0, dot_size, dot_size),
                Some(&clip_id),
            );
        }
    }

    fn draw_image(&mut self) {
        let logo = match self.logo {
            Some(logo) => logo,
            None => return,
        };
        let margin = self.options.image_options.margin;
        let symbol_size = self.count as f64 * self.dot_size;
        let x = self.x_beginning + margin + (symbol_size - self.image_size.width) / 2.0;
        let y = self.y_beginning + margin + (symbol_size - self.image_size.height) / 2.0;
        let width = self.image_size.width - 2.0 * margin;
        let height = self.image_size.height - 2.0 * margin;
        if width <= 0.0 || height <= 0.0 {
            log::debug!("logo margin leaves no room, logo not drawn");
            return;
        }
        let _ = write!(
            self.body,
            r#"<image xlink:href="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
            logo.data_uri, x, y, width, height
        );
    }

    /// A rect over `area` filled with a flat color or a gradient, optionally
    /// clipped.
    fn paint_rect(
        &mut self,
        name: &str,
        gradient: Option<&Gradient>,
        color: &str,
        additional_rotation: f64,
        area: (f64, f64, f64, f64),
        clip: Option<&str>,
    ) {
        let (x, y, width, height) = area;
        let fill = match gradient {
            Some(gradient) => {
                self.defs.push_str(&gradient_element(name, gradient, additional_rotation, area));
                format!("url(#{})", name)
            }
            None => escape_attr(color),
        };
        let clip = clip
            .map(|id| format!(r#" clip-path="url(#{})""#, id))
            .unwrap_or_default();
        let _ = write!(
            self.body,
            r#"<rect x="{}" y="{}" width="{}" height="{}"{} fill="{}"/>"#,
            x, y, width, height, clip, fill
        );
    }
}

fn masked_modules(
    mask: &[[bool; 7]; 7],
    dot_type: DotType,
    x: f64,
    y: f64,
    size: f64,
) -> String {
    let is_set = |i: i64, j: i64| {
        (0..7).contains(&i) && (0..7).contains(&j) && mask[i as usize][j as usize]
    };
    let mut out = String::new();
    for i in 0..7i64 {
        for j in 0..7i64 {
            if !is_set(i, j) {
                continue;
            }
            out.push_str(&shapes::dot(
                dot_type,
                x + j as f64 * size,
                y + i as f64 * size,
                size,
                Neighbors::from_fn(|dx, dy| is_set(i + dy, j + dx)),
            ));
        }
    }
    out
}

fn gradient_element(
    name: &str,
    gradient: &Gradient,
    additional_rotation: f64,
    (x, y, width, height): (f64, f64, f64, f64),
) -> String {
    let mut out = match gradient.gradient_type {
        GradientType::Radial => {
            let cx = x + width / 2.0;
            let cy = y + height / 2.0;
            format!(
                r#"<radialGradient id="{}" gradientUnits="userSpaceOnUse" fx="{cx}" fy="{cy}" cx="{cx}" cy="{cy}" r="{}">"#,
                name,
                width.max(height) / 2.0,
                cx = cx,
                cy = cy
            )
        }
        GradientType::Linear => {
            let (x1, y1, x2, y2) = linear_endpoints(gradient.rotation + additional_rotation, x, y, width, height);
            format!(
                r#"<linearGradient id="{}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}">"#,
                name,
                x1.round(),
                y1.round(),
                x2.round(),
                y2.round()
            )
        }
    };

    for stop in &gradient.color_stops {
        let _ = write!(
            out,
            r#"<stop offset="{}%" stop-color="{}"/>"#,
            100.0 * stop.offset,
            escape_attr(&stop.color)
        );
    }

    out.push_str(match gradient.gradient_type {
        GradientType::Radial => "</radialGradient>",
        GradientType::Linear => "</linearGradient>",
    });
    out
}

/// Start and end of a linear gradient through the center of the area, at
/// `rotation` radians, reaching the area's edges.
fn linear_endpoints(rotation: f64, x: f64, y: f64, width: f64, height: f64) -> (f64, f64, f64, f64) {
    let rotation = rotation % (2.0 * PI);
    let positive = (rotation + 2.0 * PI) % (2.0 * PI);
    let (mut x0, mut y0) = (x + width / 2.0, y + height / 2.0);
    let (mut x1, mut y1) = (x0, y0);

    if (0.0..=0.25 * PI).contains(&positive) || (positive > 1.75 * PI && positive <= 2.0 * PI) {
        x0 -= width / 2.0;
        y0 -= height / 2.0 * rotation.tan();
        x1 += width / 2.0;
        y1 += height / 2.0 * rotation.tan();
    } else if positive > 0.25 * PI && positive <= 0.75 * PI {
        y0 -= height / 2.0;
        x0 -= width / 2.0 / rotation.tan();
        y1 += height / 2.0;
        x1 += width / 2.0 / rotation.tan();
    } else if positive > 0.75 * PI && positive <= 1.25 * PI {
        x0 += width / 2.0;
        y0 += height / 2.0 * rotation.tan();
        x1 -= width / 2.0;
        y1 -= height / 2.0 * rotation.tan();
    } else {
        y0 += height / 2.0;
        x0 += width / 2.0 / rotation.tan();
        y1 -= height / 2.0;
        x1 -= width / 2.0 / rotation.tan();
    }

    (x0, y0, x1, y1)
}
