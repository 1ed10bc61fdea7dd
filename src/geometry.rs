//! Geometry primitives shared by the content interpreter, the clusterer and
//! the rasterizer.
//!
//! All coordinates handled outside [`crate::pipeline::content`] are page
//! points with a **top-left** origin: x grows to the right, y grows
//! downward. The interpreter flips PDF user space into this frame once, so
//! bounding boxes, cluster surfaces and rendered PNGs share one orientation.

use serde::{Deserialize, Serialize};

/// A point in page space (points, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned bounding box in page points.
///
/// `min_x <= max_x` and `min_y <= max_y` always hold; [`BoundingBox::new`]
/// reorders swapped corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Extent used for drawings with no computable points.
    pub const FALLBACK_EXTENT: f64 = 10.0;

    /// The box a degenerate drawing collapses to: origin-anchored, 10×10.
    pub const FALLBACK: BoundingBox = BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: Self::FALLBACK_EXTENT,
        max_y: Self::FALLBACK_EXTENT,
    };

    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    ///
    /// Non-finite coordinates are ignored.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut bbox: Option<BoundingBox> = None;
        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                continue;
            }
            bbox = Some(match bbox {
                None => BoundingBox {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            });
        }
        bbox
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Grow the box outward by `margin` on all four sides.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// `true` when the two boxes share a region of positive area.
    ///
    /// Boxes that only touch along an edge do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// A PDF affine transform `[a b c d e f]` in row-vector convention:
/// `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Apply `self` first, then `next`.
    ///
    /// The PDF `cm` operator replaces the CTM with `m.then(&ctm)`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// `true` when the transform maps axis-aligned rectangles onto
    /// axis-aligned rectangles (no rotation other than multiples of 90°,
    /// no skew).
    pub fn is_axis_aligned(&self) -> bool {
        const EPS: f64 = 1e-9;
        (self.b.abs() < EPS && self.c.abs() < EPS) || (self.a.abs() < EPS && self.d.abs() < EPS)
    }

    /// Mean linear scale of the transform, used to map line widths.
    pub fn scale_factor(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
