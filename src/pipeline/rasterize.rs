//! Cluster rasterization: paints a cluster's drawings onto a white RGB
//! surface sized to the cluster's bounding box.
//!
//! The surface is `ceil(width) × ceil(height)` pixels (one pixel per point,
//! never smaller than [`MIN_SURFACE_PX`] on either side) with the box's
//! top-left corner at pixel (0, 0). Drawings paint in emission order, fill
//! first and then stroke.
//!
//! Coverage is computed with a scanline filler: four sub-scanlines per pixel
//! row, with exact horizontal span coverage on each. Strokes are turned into
//! polygons (one quad per segment plus an octagonal join at each vertex) and
//! filled with the nonzero rule, so overlapping pieces of one stroke never
//! double-blend. Everything is plain `f64` arithmetic in a fixed order, so
//! the same cluster always yields the same pixels.

use crate::color::Rgb;
use crate::error::ExtractError;
use crate::geometry::{BoundingBox, Point};
use crate::pipeline::cluster::Cluster;
use crate::pipeline::drawing::{Drawing, FillRule, PathCommand};
use image::RgbImage;
use tracing::{debug, warn};

/// Smallest surface side, in pixels.
pub const MIN_SURFACE_PX: u32 = 10;

/// Largest surface side, in pixels. Boxes beyond this are clipped.
pub const MAX_SURFACE_PX: u32 = 16_384;

const SUBSAMPLES: usize = 4;

/// Flattening tolerance: one segment per this many points of control
/// polygon length.
const CURVE_STEP: f64 = 1.5;
const MAX_CURVE_SEGMENTS: usize = 512;

/// Width painted for a zero-width (hairline) stroke.
const HAIRLINE_WIDTH: f64 = 1.0;

/// A rasterized cluster.
#[derive(Debug, Clone)]
pub struct RasterizedCluster {
    pub pixels: RgbImage,
    pub width: u32,
    pub height: u32,
}

impl RasterizedCluster {
    pub fn to_png(&self) -> Result<Vec<u8>, ExtractError> {
        crate::pipeline::encode::png_bytes(&self.pixels)
    }
}

/// Surface dimensions for a box: `ceil` of each side, floored at
/// [`MIN_SURFACE_PX`].
pub fn surface_size(bbox: &BoundingBox) -> (u32, u32) {
    let side = |v: f64| -> u32 {
        let px = if v.is_finite() { v.ceil() } else { 0.0 };
        (px.min(MAX_SURFACE_PX as f64) as u32).max(MIN_SURFACE_PX)
    };
    (side(bbox.width()), side(bbox.height()))
}

/// Rasterize the members of `cluster`, taken from the page's `drawings`.
pub fn rasterize_cluster(cluster: &Cluster, drawings: &[Drawing]) -> RasterizedCluster {
    let members: Vec<&Drawing> = cluster.drawings(drawings).collect();
    rasterize_drawings(&members)
}

/// Rasterize drawings onto a surface covering their combined box.
pub fn rasterize_drawings(drawings: &[&Drawing]) -> RasterizedCluster {
    let bbox = drawings
        .iter()
        .map(|d| d.bbox())
        .reduce(|a, b| a.union(&b))
        .unwrap_or(BoundingBox::FALLBACK);

    let (width, height) = surface_size(&bbox);
    if bbox.width() > MAX_SURFACE_PX as f64 || bbox.height() > MAX_SURFACE_PX as f64 {
        warn!(
            "Cluster box {:.0}×{:.0}pt exceeds {}px, clipping",
            bbox.width(),
            bbox.height(),
            MAX_SURFACE_PX
        );
    }

    let mut canvas = Canvas::new(width, height);
    let origin = bbox.top_left();

    for drawing in drawings {
        let subpaths = flatten(&drawing.commands, origin);
        if subpaths.is_empty() {
            continue;
        }
        if drawing.has_fill {
            let edges = fill_edges(&subpaths);
            let coverage = canvas.coverage(&edges, drawing.fill_rule);
            canvas.composite(
                &coverage,
                drawing.fill_color_or_default(),
                drawing.fill_opacity,
            );
        }
        if drawing.has_stroke {
            let half = stroke_half_width(drawing.stroke_width_or_default());
            let edges = stroke_edges(&subpaths, half);
            let coverage = canvas.coverage(&edges, FillRule::NonZero);
            canvas.composite(
                &coverage,
                drawing.stroke_color_or_default(),
                drawing.stroke_opacity,
            );
        }
    }

    debug!(
        "Rasterized {} drawings onto {}×{} surface",
        drawings.len(),
        width,
        height
    );

    RasterizedCluster {
        pixels: canvas.pixels,
        width,
        height,
    }
}

// ── Path flattening ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Subpath {
    points: Vec<Point>,
    closed: bool,
}

impl Subpath {
    fn starting_at(p: Point) -> Self {
        Self {
            points: vec![p],
            closed: false,
        }
    }

    fn closed(points: Vec<Point>) -> Self {
        Self {
            points,
            closed: true,
        }
    }
}

/// Flatten commands into polylines relative to `origin`.
///
/// Single-point subpaths are dropped.
fn flatten(commands: &[PathCommand], origin: Point) -> Vec<Subpath> {
    let local = |p: Point| Point::new(p.x - origin.x, p.y - origin.y);
    let mut done: Vec<Subpath> = Vec::new();
    let mut current: Option<Subpath> = None;

    fn finish(sub: Option<Subpath>, done: &mut Vec<Subpath>) {
        if let Some(sub) = sub {
            if sub.points.len() > 1 {
                done.push(sub);
            }
        }
    }

    for cmd in commands {
        match *cmd {
            PathCommand::MoveTo(p) => {
                finish(current.take(), &mut done);
                current = Some(Subpath::starting_at(local(p)));
            }
            PathCommand::LineTo(p) => match current.as_mut() {
                Some(sub) => sub.points.push(local(p)),
                None => current = Some(Subpath::starting_at(local(p))),
            },
            PathCommand::CurveTo { c1, c2, end } => {
                let (c1, c2, end) = (local(c1), local(c2), local(end));
                let sub = current.get_or_insert_with(|| Subpath::starting_at(c1));
                let start = sub.points.last().copied().unwrap_or(c1);
                flatten_cubic(start, c1, c2, end, &mut sub.points);
            }
            PathCommand::Rect(r) => {
                finish(current.take(), &mut done);
                let corners = r.corners().map(local);
                done.push(Subpath::closed(corners.to_vec()));
                current = Some(Subpath::starting_at(corners[0]));
            }
            PathCommand::Quad(q) => {
                finish(current.take(), &mut done);
                let outline = q.outline().map(local);
                done.push(Subpath::closed(outline.to_vec()));
                current = Some(Subpath::starting_at(outline[0]));
            }
            PathCommand::Close => {
                if let Some(mut sub) = current.take() {
                    let first = sub.points[0];
                    sub.closed = true;
                    finish(Some(sub), &mut done);
                    current = Some(Subpath::starting_at(first));
                }
            }
        }
    }
    finish(current.take(), &mut done);
    done
}

fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point, out: &mut Vec<Point>) {
    let length = p0.distance(&p1) + p1.distance(&p2) + p2.distance(&p3);
    let segments = ((length / CURVE_STEP).ceil() as usize).clamp(1, MAX_CURVE_SEGMENTS);
    for i in 1..=segments {
        let t = i as f64 / segments as f64;
        let mt = 1.0 - t;
        let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
        out.push(Point::new(
            a * p0.x + b * p1.x + c * p2.x + d * p3.x,
            a * p0.y + b * p1.y + c * p2.y + d * p3.y,
        ));
    }
}

// ── Edge lists ───────────────────────────────────────────────────────────

/// A non-horizontal polygon edge with its winding direction.
#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    /// +1 when the edge runs downward, −1 upward.
    winding: i32,
}

impl Edge {
    fn new(a: Point, b: Point) -> Option<Self> {
        if a.y == b.y || !a.y.is_finite() || !b.y.is_finite() {
            return None;
        }
        let (top, bottom, winding) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
        Some(Self {
            x0: top.x,
            y0: top.y,
            x1: bottom.x,
            y1: bottom.y,
            winding,
        })
    }

    fn x_at(&self, y: f64) -> f64 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

fn push_polygon(points: &[Point], edges: &mut Vec<Edge>) {
    if points.len() < 2 {
        return;
    }
    for i in 0..points.len() {
        let next = points[(i + 1) % points.len()];
        if let Some(e) = Edge::new(points[i], next) {
            edges.push(e);
        }
    }
}

/// Fill treats every subpath as closed.
fn fill_edges(subpaths: &[Subpath]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for sub in subpaths {
        push_polygon(&sub.points, &mut edges);
    }
    edges
}

fn signed_area(poly: &[Point]) -> f64 {
    let mut sum = 0.0;
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[(i + 1) % poly.len()]);
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Push a polygon with positive orientation so all stroke pieces share one
/// winding sign.
fn push_oriented(mut poly: Vec<Point>, edges: &mut Vec<Edge>) {
    if signed_area(&poly) < 0.0 {
        poly.reverse();
    }
    push_polygon(&poly, edges);
}

/// Half of the painted stroke width. Fractional widths are kept and show up
/// as partial coverage; only a zero or invalid width becomes a hairline.
fn stroke_half_width(width: f64) -> f64 {
    if width.is_finite() && width > 0.0 {
        width / 2.0
    } else {
        HAIRLINE_WIDTH / 2.0
    }
}

/// Outline of a stroke with half-width `half`: butt ends, octagonal joins.
fn stroke_edges(subpaths: &[Subpath], half: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    for sub in subpaths {
        let pts = &sub.points;
        let seg_count = if sub.closed { pts.len() } else { pts.len() - 1 };

        for i in 0..seg_count {
            let (a, b) = (pts[i], pts[(i + 1) % pts.len()]);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 || !len.is_finite() {
                continue;
            }
            let (nx, ny) = (-dy / len * half, dx / len * half);
            push_oriented(
                vec![
                    Point::new(a.x + nx, a.y + ny),
                    Point::new(b.x + nx, b.y + ny),
                    Point::new(b.x - nx, b.y - ny),
                    Point::new(a.x - nx, a.y - ny),
                ],
                &mut edges,
            );
        }

        // joins: interior vertices, plus every vertex of a closed subpath
        if half >= 0.75 {
            let joins: Box<dyn Iterator<Item = &Point>> = if sub.closed {
                Box::new(pts.iter())
            } else {
                Box::new(pts.iter().skip(1).take(pts.len().saturating_sub(2)))
            };
            for p in joins {
                push_oriented(octagon(*p, half), &mut edges);
            }
        }
    }
    edges
}

fn octagon(center: Point, radius: f64) -> Vec<Point> {
    (0..8)
        .map(|k| {
            let angle = std::f64::consts::FRAC_PI_4 * (k as f64 + 0.5);
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

// ── Canvas ───────────────────────────────────────────────────────────────

struct Canvas {
    pixels: RgbImage,
    width: usize,
    height: usize,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbImage::from_pixel(width, height, image::Rgb(Rgb::WHITE.to_array())),
            width: width as usize,
            height: height as usize,
        }
    }

    /// Per-pixel coverage in `[0, 1]`, row-major.
    fn coverage(&self, edges: &[Edge], rule: FillRule) -> Vec<f32> {
        let mut cov = vec![0.0f32; self.width * self.height];
        if edges.is_empty() {
            return cov;
        }

        let weight = 1.0 / SUBSAMPLES as f32;
        let mut crossings: Vec<(f64, i32)> = Vec::new();

        for row in 0..self.height {
            let line = &mut cov[row * self.width..(row + 1) * self.width];
            for s in 0..SUBSAMPLES {
                let y = row as f64 + (s as f64 + 0.5) / SUBSAMPLES as f64;
                crossings.clear();
                crossings.extend(
                    edges
                        .iter()
                        .filter(|e| e.y0 <= y && y < e.y1)
                        .map(|e| (e.x_at(y), e.winding)),
                );
                if crossings.is_empty() {
                    continue;
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                for pair in crossings.windows(2) {
                    winding += pair[0].1;
                    let inside = match rule {
                        FillRule::NonZero => winding != 0,
                        FillRule::EvenOdd => winding % 2 != 0,
                    };
                    if inside {
                        add_span(line, pair[0].0, pair[1].0, weight);
                    }
                }
            }
        }

        for c in &mut cov {
            *c = c.min(1.0);
        }
        cov
    }

    fn composite(&mut self, coverage: &[f32], color: Rgb, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0) as f32;
        if opacity == 0.0 {
            return;
        }
        let src = color.to_array();
        for (i, &c) in coverage.iter().enumerate() {
            if c <= 0.0 {
                continue;
            }
            let alpha = c * opacity;
            let (x, y) = ((i % self.width) as u32, (i / self.width) as u32);
            let px = self.pixels.get_pixel_mut(x, y);
            for ch in 0..3 {
                let blended = px.0[ch] as f32 * (1.0 - alpha) + src[ch] as f32 * alpha;
                px.0[ch] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Add `weight × overlap` to each pixel of `line` covered by `[xa, xb)`.
fn add_span(line: &mut [f32], xa: f64, xb: f64, weight: f32) {
    let w = line.len() as f64;
    let (xa, xb) = (xa.clamp(0.0, w), xb.clamp(0.0, w));
    if xb <= xa {
        return;
    }
    let first = xa.floor() as usize;
    let last = (xb.ceil() as usize).min(line.len());
    for (i, px) in line.iter_mut().enumerate().take(last).skip(first) {
        let lo = xa.max(i as f64);
        let hi = xb.min(i as f64 + 1.0);
        if hi > lo {
            *px += (hi - lo) as f32 * weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::drawing::Quad;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn filled_rect(x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb) -> Drawing {
        Drawing {
            commands: vec![PathCommand::Rect(BoundingBox::new(x0, y0, x1, y1))],
            has_fill: true,
            fill_color: Some(color),
            ..Drawing::default()
        }
    }

    fn px(r: &RasterizedCluster, x: u32, y: u32) -> [u8; 3] {
        r.pixels.get_pixel(x, y).0
    }

    #[test]
    fn surface_size_is_ceiled_and_floored() {
        assert_eq!(surface_size(&BoundingBox::new(0.0, 0.0, 100.2, 49.0)), (101, 49));
        assert_eq!(surface_size(&BoundingBox::new(5.0, 5.0, 8.0, 6.0)), (10, 10));
        assert_eq!(surface_size(&BoundingBox::new(0.0, 0.0, 1e9, 20.0)).0, MAX_SURFACE_PX);
    }

    #[test]
    fn filled_rect_covers_exact_pixels() {
        let red = Rgb::new(255, 0, 0);
        let d = filled_rect(100.0, 200.0, 120.0, 230.0, red);
        let r = rasterize_drawings(&[&d]);
        assert_eq!((r.width, r.height), (20, 30));
        assert_eq!(px(&r, 0, 0), [255, 0, 0]);
        assert_eq!(px(&r, 19, 29), [255, 0, 0]);
        assert_eq!(r.pixels.dimensions(), (20, 30));
    }

    #[test]
    fn tiny_box_gets_min_surface_with_white_margin() {
        let d = filled_rect(0.0, 0.0, 2.0, 2.0, Rgb::BLACK);
        let r = rasterize_drawings(&[&d]);
        assert_eq!((r.width, r.height), (10, 10));
        assert_eq!(px(&r, 0, 0), [0, 0, 0]);
        assert_eq!(px(&r, 5, 5), [255, 255, 255]);
    }

    #[test]
    fn half_pixel_edge_is_antialiased() {
        let d = filled_rect(0.0, 0.0, 10.5, 10.0, Rgb::BLACK);
        let r = rasterize_drawings(&[&d]);
        assert_eq!(r.width, 11);
        let edge = px(&r, 10, 5)[0];
        assert!((120..=135).contains(&edge), "got {edge}");
    }

    #[test]
    fn even_odd_leaves_hole_nonzero_does_not() {
        // outer and inner squares wound the same way
        let commands = vec![
            PathCommand::Rect(BoundingBox::new(0.0, 0.0, 30.0, 30.0)),
            PathCommand::Rect(BoundingBox::new(10.0, 10.0, 20.0, 20.0)),
        ];
        let mut d = Drawing {
            commands,
            has_fill: true,
            fill_rule: FillRule::EvenOdd,
            ..Drawing::default()
        };
        let r = rasterize_drawings(&[&d]);
        assert_eq!(px(&r, 15, 15), [255, 255, 255]);
        assert_eq!(px(&r, 5, 5), [0, 0, 0]);

        d.fill_rule = FillRule::NonZero;
        let r = rasterize_drawings(&[&d]);
        assert_eq!(px(&r, 15, 15), [0, 0, 0]);
    }

    #[test]
    fn stroke_paints_outline_only() {
        let d = Drawing {
            commands: vec![PathCommand::Rect(BoundingBox::new(0.0, 0.0, 40.0, 40.0))],
            has_stroke: true,
            stroke_color: Some(Rgb::new(0, 0, 255)),
            stroke_width: Some(2.0),
            ..Drawing::default()
        };
        let r = rasterize_drawings(&[&d]);
        assert_eq!(px(&r, 20, 20), [255, 255, 255]);
        assert_eq!(px(&r, 20, 0), [0, 0, 255]);
        assert_eq!(px(&r, 0, 20), [0, 0, 255]);
    }

    fn thin_line(y: f64, width: f64) -> [Drawing; 2] {
        // white backdrop pins the surface origin at (0, 0)
        let backdrop = filled_rect(0.0, 0.0, 20.0, 10.0, Rgb::WHITE);
        let line = Drawing {
            commands: vec![
                PathCommand::MoveTo(p(0.0, y)),
                PathCommand::LineTo(p(20.0, y)),
            ],
            has_stroke: true,
            stroke_width: Some(width),
            ..Drawing::default()
        };
        [backdrop, line]
    }

    #[test]
    fn fractional_stroke_width_gives_partial_coverage() {
        let [backdrop, line] = thin_line(5.5, 0.5);
        let r = rasterize_drawings(&[&backdrop, &line]);
        let v = px(&r, 10, 5)[0];
        assert!((90..=170).contains(&v), "got {v}");
        assert_eq!(px(&r, 10, 4), [255, 255, 255]);
        assert_eq!(px(&r, 10, 6), [255, 255, 255]);

        let [backdrop, line] = thin_line(5.5, 0.25);
        let thinner = rasterize_drawings(&[&backdrop, &line]);
        assert!(px(&thinner, 10, 5)[0] > v);
    }

    #[test]
    fn zero_width_stroke_is_a_hairline() {
        let [backdrop, line] = thin_line(5.5, 0.0);
        let r = rasterize_drawings(&[&backdrop, &line]);
        assert_eq!(px(&r, 10, 5), [0, 0, 0]);
        assert_eq!(stroke_half_width(f64::NAN), HAIRLINE_WIDTH / 2.0);
        assert_eq!(stroke_half_width(0.3), 0.15);
    }

    #[test]
    fn fill_then_stroke_order() {
        let d = Drawing {
            commands: vec![PathCommand::Rect(BoundingBox::new(0.0, 0.0, 20.0, 20.0))],
            has_fill: true,
            has_stroke: true,
            fill_color: Some(Rgb::new(0, 255, 0)),
            stroke_color: Some(Rgb::new(255, 0, 0)),
            stroke_width: Some(4.0),
            ..Drawing::default()
        };
        let r = rasterize_drawings(&[&d]);
        assert_eq!(px(&r, 10, 10), [0, 255, 0]);
        assert_eq!(px(&r, 10, 0), [255, 0, 0]);
    }

    #[test]
    fn later_drawings_paint_over_earlier_ones() {
        let a = filled_rect(0.0, 0.0, 20.0, 20.0, Rgb::new(255, 0, 0));
        let b = filled_rect(10.0, 0.0, 30.0, 20.0, Rgb::new(0, 0, 255));
        let r = rasterize_drawings(&[&a, &b]);
        assert_eq!(r.width, 30);
        assert_eq!(px(&r, 5, 5), [255, 0, 0]);
        assert_eq!(px(&r, 15, 5), [0, 0, 255]);
    }

    #[test]
    fn half_opacity_blends_with_white() {
        let mut d = filled_rect(0.0, 0.0, 10.0, 10.0, Rgb::BLACK);
        d.fill_opacity = 0.5;
        let r = rasterize_drawings(&[&d]);
        let v = px(&r, 5, 5)[0];
        assert!((127..=128).contains(&v), "got {v}");
    }

    #[test]
    fn quad_fills_diamond() {
        let d = Drawing {
            commands: vec![PathCommand::Quad(Quad {
                ul: p(20.0, 0.0),
                ur: p(40.0, 20.0),
                ll: p(0.0, 20.0),
                lr: p(20.0, 40.0),
            })],
            has_fill: true,
            ..Drawing::default()
        };
        let r = rasterize_drawings(&[&d]);
        assert_eq!((r.width, r.height), (40, 40));
        assert_eq!(px(&r, 20, 20), [0, 0, 0]);
        assert_eq!(px(&r, 1, 1), [255, 255, 255]);
        assert_eq!(px(&r, 38, 38), [255, 255, 255]);
    }

    #[test]
    fn curve_is_flattened_through_its_midpoint() {
        // semicircle-ish arch from (0,40) to (40,40) peaking near y=10
        let d = Drawing {
            commands: vec![
                PathCommand::MoveTo(p(0.0, 40.0)),
                PathCommand::CurveTo {
                    c1: p(0.0, 0.0),
                    c2: p(40.0, 0.0),
                    end: p(40.0, 40.0),
                },
                PathCommand::Close,
            ],
            has_fill: true,
            ..Drawing::default()
        };
        let r = rasterize_drawings(&[&d]);
        // B(0.5).y = 40 × 0.25 = 10
        assert_eq!(px(&r, 20, 12), [0, 0, 0]);
        assert_eq!(px(&r, 20, 8), [255, 255, 255]);
        assert_eq!(px(&r, 1, 2), [255, 255, 255]);
    }

    #[test]
    fn degraded_drawing_paints_nothing() {
        let d = Drawing {
            has_fill: true,
            has_stroke: true,
            ..Drawing::default()
        };
        let r = rasterize_drawings(&[&d]);
        assert_eq!((r.width, r.height), (10, 10));
        assert!(r.pixels.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn output_is_deterministic() {
        let d = Drawing {
            commands: vec![
                PathCommand::MoveTo(p(3.3, 7.1)),
                PathCommand::CurveTo {
                    c1: p(50.0, -20.0),
                    c2: p(80.0, 90.0),
                    end: p(120.7, 33.3),
                },
                PathCommand::LineTo(p(10.0, 60.0)),
            ],
            has_stroke: true,
            stroke_width: Some(2.5),
            ..Drawing::default()
        };
        let a = rasterize_drawings(&[&d]).to_png().unwrap();
        let b = rasterize_drawings(&[&d]).to_png().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cluster_entry_uses_members_only() {
        use crate::pipeline::cluster::{cluster_drawings, ClusterParams};
        let drawings = vec![
            filled_rect(0.0, 0.0, 20.0, 20.0, Rgb::BLACK),
            filled_rect(500.0, 0.0, 530.0, 40.0, Rgb::BLACK),
        ];
        let params = ClusterParams {
            overlap_threshold: 400.0,
            margin_allowance: 10.0,
        };
        let clusters = cluster_drawings(&drawings, &params);
        assert_eq!(clusters.len(), 2);
        let r = rasterize_cluster(&clusters[1], &drawings);
        assert_eq!((r.width, r.height), (30, 40));
    }
}
