//! Vector drawings and their bounding boxes.
//!
//! A [`Drawing`] is one painted path from the page content stream: the
//! commands that built it plus the paint attributes in force when it was
//! filled and/or stroked. Fill and stroke are independent booleans and the
//! fill rule is an explicit enum, so a "fill then stroke" path is simply
//! `has_fill && has_stroke`.

use crate::color::Rgb;
use crate::geometry::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// One path construction command, in page space (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bézier from the current point through two control points.
    CurveTo { c1: Point, c2: Point, end: Point },
    /// Axis-aligned rectangle subpath.
    Rect(BoundingBox),
    /// Rectangle subpath under a rotating or skewing transform.
    Quad(Quad),
    Close,
}

/// Four corners of a transformed rectangle.
///
/// Corner names follow the untransformed rectangle: `ul`/`ur` are the top
/// edge, `ll`/`lr` the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub ul: Point,
    pub ur: Point,
    pub ll: Point,
    pub lr: Point,
}

impl Quad {
    pub fn corners(&self) -> [Point; 4] {
        [self.ul, self.ur, self.ll, self.lr]
    }

    /// Polygon outline: clockwise on screen, starting at the lower-right
    /// corner.
    pub fn outline(&self) -> [Point; 4] {
        [self.lr, self.ll, self.ul, self.ur]
    }
}

/// Rule deciding which regions of a self-intersecting path are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// A painted vector path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub commands: Vec<PathCommand>,
    pub has_fill: bool,
    pub has_stroke: bool,
    pub fill_rule: FillRule,
    /// `None` means "never set"; painted as opaque black.
    pub fill_color: Option<Rgb>,
    pub stroke_color: Option<Rgb>,
    /// Stroke width in page points; `None` paints at 1 pt.
    pub stroke_width: Option<f64>,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
}

impl Default for Drawing {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            has_fill: false,
            has_stroke: false,
            fill_rule: FillRule::NonZero,
            fill_color: None,
            stroke_color: None,
            stroke_width: None,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

impl Drawing {
    pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

    pub fn bbox(&self) -> BoundingBox {
        bbox_of_commands(&self.commands)
    }

    pub fn fill_color_or_default(&self) -> Rgb {
        self.fill_color.unwrap_or(Rgb::BLACK)
    }

    pub fn stroke_color_or_default(&self) -> Rgb {
        self.stroke_color.unwrap_or(Rgb::BLACK)
    }

    pub fn stroke_width_or_default(&self) -> f64 {
        self.stroke_width.unwrap_or(Self::DEFAULT_STROKE_WIDTH)
    }
}

/// Bounding box of a command list.
///
/// Move/line points, rectangle corners, quad corners and the three trailing
/// points of curves (both controls and the end) are covered; `Close` adds
/// nothing. The implicit start of a curve is not added on its own: it is
/// only covered when an earlier command put it there. A list without points
/// yields [`BoundingBox::FALLBACK`].
pub fn bbox_of_commands(commands: &[PathCommand]) -> BoundingBox {
    let points = commands.iter().flat_map(|cmd| -> Vec<Point> {
        match *cmd {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => vec![p],
            PathCommand::CurveTo { c1, c2, end } => vec![c1, c2, end],
            PathCommand::Rect(r) => r.corners().to_vec(),
            PathCommand::Quad(q) => q.corners().to_vec(),
            PathCommand::Close => Vec::new(),
        }
    });

    BoundingBox::from_points(points).unwrap_or(BoundingBox::FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn lines_and_moves() {
        let cmds = [
            PathCommand::MoveTo(p(5.0, 7.0)),
            PathCommand::LineTo(p(50.0, 2.0)),
            PathCommand::LineTo(p(20.0, 30.0)),
            PathCommand::Close,
        ];
        assert_eq!(
            bbox_of_commands(&cmds),
            BoundingBox::new(5.0, 2.0, 50.0, 30.0)
        );
    }

    #[test]
    fn rect_and_quad_corners() {
        let rect = PathCommand::Rect(BoundingBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(
            bbox_of_commands(&[rect]),
            BoundingBox::new(0.0, 0.0, 100.0, 50.0)
        );

        let quad = PathCommand::Quad(Quad {
            ul: p(10.0, 0.0),
            ur: p(20.0, 10.0),
            ll: p(0.0, 10.0),
            lr: p(10.0, 20.0),
        });
        assert_eq!(
            bbox_of_commands(&[quad]),
            BoundingBox::new(0.0, 0.0, 20.0, 20.0)
        );
    }

    #[test]
    fn empty_and_close_only_fall_back() {
        assert_eq!(
            bbox_of_commands(&[]),
            BoundingBox::FALLBACK
        );
        assert_eq!(
            bbox_of_commands(&[PathCommand::Close]),
            BoundingBox::FALLBACK
        );
        let fb = BoundingBox::FALLBACK;
        assert_eq!((fb.width(), fb.height()), (10.0, 10.0));
    }

    // Regression guard: a curve contributes only its two control points and
    // its end point. When nothing before it placed the start point, a curve
    // bowing out near that start is clipped by the box.
    #[test]
    fn curve_bbox_uses_trailing_points_only() {
        let opening_curve = [PathCommand::CurveTo {
            c1: p(30.0, 30.0),
            c2: p(40.0, 40.0),
            end: p(50.0, 50.0),
        }];
        assert_eq!(
            bbox_of_commands(&opening_curve),
            BoundingBox::new(30.0, 30.0, 50.0, 50.0)
        );

        // With an explicit move the start is covered by the move itself.
        let moved = [
            PathCommand::MoveTo(p(0.0, 60.0)),
            PathCommand::CurveTo {
                c1: p(30.0, 30.0),
                c2: p(40.0, 40.0),
                end: p(50.0, 50.0),
            },
        ];
        assert_eq!(bbox_of_commands(&moved), BoundingBox::new(0.0, 30.0, 50.0, 60.0));
    }

    #[test]
    fn quad_outline_starts_bottom_right() {
        let q = Quad {
            ul: p(0.0, 0.0),
            ur: p(10.0, 0.0),
            ll: p(0.0, 10.0),
            lr: p(10.0, 10.0),
        };
        assert_eq!(q.outline()[0], p(10.0, 10.0));
        assert_eq!(q.outline()[1], p(0.0, 10.0));
    }

    #[test]
    fn paint_defaults() {
        let d = Drawing::default();
        assert_eq!(d.fill_color_or_default(), Rgb::BLACK);
        assert_eq!(d.stroke_color_or_default(), Rgb::BLACK);
        assert_eq!(d.stroke_width_or_default(), 1.0);
    }
}
