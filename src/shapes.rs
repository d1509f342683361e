//! SVG figures for single modules and the three corner patterns.
//!
//! Every figure is emitted as one SVG element string positioned in canvas
//! pixels. Rotations are in radians and turn the figure about its center.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::options::{CornerDotType, CornerSquareType, DotType};

struct Figure {
    x: f64,
    y: f64,
    size: f64,
    rotation: f64,
}

impl Figure {
    fn transform(&self) -> String {
        if self.rotation == 0.0 {
            return String::new();
        }
        let degrees = (self.rotation.to_degrees() * 1e6).round() / 1e6;
        let cx = self.x + self.size / 2.0;
        let cy = self.y + self.size / 2.0;
        format!(r#" transform="rotate({},{},{})""#, degrees, cx, cy)
    }

    fn path(&self, d: &str, even_odd: bool) -> String {
        let rule = if even_odd { r#" clip-rule="evenodd""# } else { "" };
        format!(r#"<path{}{} d="{}"/>"#, rule, self.transform(), d)
    }

    fn dot(&self) -> String {
        format!(
            r#"<circle cx="{}" cy="{}" r="{}"{}/>"#,
            self.x + self.size / 2.0,
            self.y + self.size / 2.0,
            self.size / 2.0,
            self.transform()
        )
    }

    fn square(&self) -> String {
        format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}"{}/>"#,
            self.x,
            self.y,
            self.size,
            self.size,
            self.transform()
        )
    }

    // rounded on one side only; the rounded side faces right before rotation
    fn side_rounded(&self) -> String {
        let (x, y, s) = (self.x, self.y, self.size);
        let d = format!(
            "M {} {}v {}h {}a {} {}, 0, 0, 0, 0 {}",
            x,
            y,
            s,
            s / 2.0,
            s / 2.0,
            s / 2.0,
            -s
        );
        self.path(&d, false)
    }

    fn corner_rounded(&self) -> String {
        let (x, y, s) = (self.x, self.y, self.size);
        let d = format!(
            "M {} {}v {}h {}v {}a {} {}, 0, 0, 0, {} {}",
            x,
            y,
            s,
            s,
            -s / 2.0,
            s / 2.0,
            s / 2.0,
            -s / 2.0,
            -s / 2.0
        );
        self.path(&d, false)
    }

    fn corner_extra_rounded(&self) -> String {
        let (x, y, s) = (self.x, self.y, self.size);
        let d = format!("M {} {}v {}h {}a {} {}, 0, 0, 0, {} {}", x, y, s, s, s, s, -s, -s);
        self.path(&d, false)
    }

    fn corners_rounded(&self) -> String {
        let (x, y, s) = (self.x, self.y, self.size);
        let h = s / 2.0;
        let d = format!(
            "M {} {}v {}a {} {}, 0, 0, 0, {} {}h {}v {}a {} {}, 0, 0, 0, {} {}",
            x, y, h, h, h, h, h, h, -h, h, h, -h, -h
        );
        self.path(&d, false)
    }
}

/// Which of the four orthogonal neighbours of a module are dark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Neighbors {
    pub fn from_fn(is_dark: impl Fn(i64, i64) -> bool) -> Self {
        Neighbors {
            left: is_dark(-1, 0),
            right: is_dark(1, 0),
            top: is_dark(0, -1),
            bottom: is_dark(0, 1),
        }
    }

    fn count(&self) -> usize {
        [self.left, self.right, self.top, self.bottom]
            .iter()
            .filter(|dark| **dark)
            .count()
    }
}

/// One data module of side `size` at (`x`, `y`).
pub fn dot(dot_type: DotType, x: f64, y: f64, size: f64, neighbors: Neighbors) -> String {
    let figure = |rotation| Figure {
        x,
        y,
        size,
        rotation,
    };
    let n = neighbors;

    match dot_type {
        DotType::Dots => figure(0.0).dot(),
        DotType::Square => figure(0.0).square(),
        DotType::Rounded | DotType::ExtraRounded => {
            let count = n.count();
            if count == 0 {
                return figure(0.0).dot();
            }
            if count > 2 || (n.left && n.right) || (n.top && n.bottom) {
                return figure(0.0).square();
            }
            if count == 2 {
                let rotation = if n.left && n.top {
                    PI / 2.0
                } else if n.top && n.right {
                    PI
                } else if n.right && n.bottom {
                    -PI / 2.0
                } else {
                    0.0
                };
                return if dot_type == DotType::Rounded {
                    figure(rotation).corner_rounded()
                } else {
                    figure(rotation).corner_extra_rounded()
                };
            }
            let rotation = if n.top {
                PI / 2.0
            } else if n.right {
                PI
            } else if n.bottom {
                -PI / 2.0
            } else {
                0.0
            };
            figure(rotation).side_rounded()
        }
        DotType::Classy | DotType::ClassyRounded => {
            let rounded = |rotation| {
                if dot_type == DotType::Classy {
                    figure(rotation).corner_rounded()
                } else {
                    figure(rotation).corner_extra_rounded()
                }
            };
            if n.count() == 0 {
                figure(PI / 2.0).corners_rounded()
            } else if !n.left && !n.top {
                rounded(-PI / 2.0)
            } else if !n.right && !n.bottom {
                rounded(PI / 2.0)
            } else {
                figure(0.0).square()
            }
        }
    }
}

/// The 7x7 outer ring of a finder pattern; `size` is seven module widths.
pub fn corner_square(corner_type: CornerSquareType, x: f64, y: f64, size: f64, rotation: f64) -> String {
    let figure = Figure {
        x,
        y,
        size,
        rotation,
    };
    let dot_size = size / 7.0;
    let mut d = String::new();

    match corner_type {
        CornerSquareType::Dot => {
            let cx = x + size / 2.0;
            let cy = y + size / 2.0;
            let r = size / 2.0;
            let inner = r - dot_size;
            let _ = write!(
                d,
                "M {} {}a {} {} 0 1 0 0.1 0zM {} {}a {} {} 0 1 1 -0.1 0Z",
                cx,
                cy - r,
                r,
                r,
                cx,
                cy - r + dot_size,
                inner,
                inner
            );
        }
        CornerSquareType::Square => {
            let _ = write!(
                d,
                "M {} {}v {}h {}v {}zM {} {}h {}v {}h {}z",
                x,
                y,
                size,
                size,
                -size,
                x + dot_size,
                y + dot_size,
                size - 2.0 * dot_size,
                size - 2.0 * dot_size,
                -size + 2.0 * dot_size
            );
        }
        CornerSquareType::ExtraRounded => {
            let outer = 2.5 * dot_size;
            let inner = 1.5 * dot_size;
            let side = 2.0 * dot_size;
            let _ = write!(
                d,
                "M {} {}v {}a {o} {o}, 0, 0, 0, {o} {o}h {}a {o} {o}, 0, 0, 0, {o} {}v {}a {o} {o}, 0, 0, 0, {} {}h {}a {o} {o}, 0, 0, 0, {} {o}",
                x,
                y + outer,
                side,
                side,
                -outer,
                -side,
                -outer,
                -outer,
                -side,
                -outer,
                o = outer
            );
            let _ = write!(
                d,
                "M {} {}h {}a {i} {i}, 0, 0, 1, {i} {i}v {}a {i} {i}, 0, 0, 1, {} {i}h {}a {i} {i}, 0, 0, 1, {} {}v {}a {i} {i}, 0, 0, 1, {i} {}",
                x + outer,
                y + dot_size,
                side,
                side,
                -inner,
                -side,
                -inner,
                -inner,
                -side,
                -inner,
                i = inner
            );
        }
    }

    figure.path(&d, true)
}

/// The 3x3 center of a finder pattern; `size` is three module widths.
pub fn corner_dot(corner_type: CornerDotType, x: f64, y: f64, size: f64, rotation: f64) -> String {
    let figure = Figure {
        x,
        y,
        size,
        rotation,
    };
    match corner_type {
        CornerDotType::Dot => figure.dot(),
        CornerDotType::Square => figure.square(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated() -> Neighbors {
        Neighbors::default()
    }

    #[test]
    fn square_and_dots_ignore_neighbors() {
        let all = Neighbors {
            left: true,
            right: true,
            top: true,
            bottom: true,
        };
        assert_eq!(
            dot(DotType::Square, 10.0, 20.0, 5.0, all),
            r#"<rect x="10" y="20" width="5" height="5"/>"#
        );
        assert_eq!(
            dot(DotType::Dots, 10.0, 20.0, 4.0, isolated()),
            r#"<circle cx="12" cy="22" r="2"/>"#
        );
    }

    #[test]
    fn rounded_isolated_module_is_a_dot() {
        assert!(dot(DotType::Rounded, 0.0, 0.0, 4.0, isolated()).starts_with("<circle"));
        assert!(dot(DotType::ExtraRounded, 0.0, 0.0, 4.0, isolated()).starts_with("<circle"));
    }

    #[test]
    fn rounded_straight_run_is_a_square() {
        let row = Neighbors {
            left: true,
            right: true,
            ..Default::default()
        };
        assert!(dot(DotType::Rounded, 0.0, 0.0, 4.0, row).starts_with("<rect"));
    }

    #[test]
    fn rounded_end_of_run_turns_toward_neighbor() {
        let only_top = Neighbors {
            top: true,
            ..Default::default()
        };
        let svg = dot(DotType::Rounded, 0.0, 0.0, 4.0, only_top);
        assert!(svg.starts_with("<path"));
        assert!(svg.contains(r#"transform="rotate(90,2,2)""#), "{}", svg);

        let only_left = Neighbors {
            left: true,
            ..Default::default()
        };
        let svg = dot(DotType::Rounded, 0.0, 0.0, 4.0, only_left);
        assert!(!svg.contains("transform"), "{}", svg);
    }

    #[test]
    fn classy_rounds_exposed_corners() {
        let svg = dot(DotType::Classy, 0.0, 0.0, 4.0, isolated());
        assert!(svg.contains("rotate(90,"), "{}", svg);

        let inner = Neighbors {
            left: true,
            top: true,
            ..Default::default()
        };
        assert!(dot(DotType::Classy, 0.0, 0.0, 4.0, inner).starts_with("<path"));

        let surrounded = Neighbors {
            left: true,
            right: true,
            top: true,
            bottom: true,
        };
        assert!(dot(DotType::ClassyRounded, 0.0, 0.0, 4.0, surrounded).starts_with("<rect"));
    }

    #[test]
    fn corner_square_is_an_even_odd_ring() {
        for corner_type in [
            CornerSquareType::Dot,
            CornerSquareType::Square,
            CornerSquareType::ExtraRounded,
        ] {
            let svg = corner_square(corner_type, 0.0, 0.0, 70.0, 0.0);
            assert!(svg.contains(r#"clip-rule="evenodd""#), "{}", svg);
            assert_eq!(svg.matches('M').count(), 2, "{}", svg);
        }
        assert!(corner_square(CornerSquareType::Square, 0.0, 0.0, 70.0, PI / 2.0)
            .contains("rotate(90,35,35)"));
    }

    #[test]
    fn corner_dot_shapes() {
        assert!(corner_dot(CornerDotType::Dot, 20.0, 20.0, 30.0, 0.0).starts_with("<circle"));
        assert_eq!(
            corner_dot(CornerDotType::Square, 20.0, 20.0, 30.0, 0.0),
            r#"<rect x="20" y="20" width="30" height="30"/>"#
        );
    }
}
