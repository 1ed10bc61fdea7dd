//! Content-stream interpretation: page operators → [`Drawing`]s and image
//! placements.
//!
//! The page's content streams are unfiltered through
//! [`crate::pipeline::filters`], split by [`crate::pipeline::lexer`] and
//! walked operator by operator while tracking the parts of the graphics
//! state that affect how a path looks: the CTM, line width, fill/stroke
//! colour (through the current colour space) and ExtGState opacities. Every
//! painting operator (`S`, `f`, `B`, …) emits one drawing. Form XObjects are
//! entered recursively; image XObjects and inline images are recorded with
//! their on-page box for [`crate::pipeline::images`].
//!
//! Coordinates leave this module in top-left page space: the base transform
//! flips PDF user space using the page's visible box (CropBox, else
//! MediaBox), so y grows downward with the origin at its top-left corner.
//!
//! Text, shadings and clipping paths are not interpreted.

use crate::color::Rgb;
use crate::error::PageError;
use crate::geometry::{BoundingBox, Matrix, Point};
use crate::pipeline::drawing::{Drawing, FillRule, PathCommand, Quad};
use crate::pipeline::filters::{decode_stream, MAX_DECODED_LEN};
use crate::pipeline::images::ColorSpace;
use crate::pipeline::lexer::{parse_content, ContentItem};
use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

/// Nesting limit for form XObjects (guards against reference cycles).
const MAX_FORM_DEPTH: usize = 16;

/// US Letter, used when a page carries no usable MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Where an image's samples live.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    XObject(ObjectId),
    /// An inline image, its dictionary keys already expanded.
    Inline(Box<Stream>),
}

/// An image painted on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Resource name the image was painted under (e.g. `Im0`), or
    /// `inline-N` for inline images.
    pub name: String,
    pub source: ImageSource,
    /// The image's unit square mapped through the CTM, in page space.
    pub bbox: BoundingBox,
    /// Paint order among all images on the page, form contents included.
    pub ordinal: usize,
}

/// Everything the interpreter found on one page.
#[derive(Debug, Default)]
pub struct PageContent {
    /// Page width and height in points (from the MediaBox).
    pub width: f64,
    pub height: f64,
    /// Drawings in emission order.
    pub drawings: Vec<Drawing>,
    /// Image placements in emission order.
    pub images: Vec<ImagePlacement>,
    /// Non-fatal problems met while interpreting.
    pub errors: Vec<PageError>,
}

/// Object ids of every page, in document order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Interpret one page's content stream.
pub fn interpret_page(doc: &Document, page_index: usize, page_id: ObjectId) -> PageContent {
    let mut out = PageContent::default();

    let page = match doc.get_dictionary(page_id) {
        Ok(dict) => dict,
        Err(e) => {
            out.errors.push(PageError::DrawingDecode {
                page: page_index,
                detail: format!("page dictionary unavailable: {e}"),
            });
            let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
            out.width = x1 - x0;
            out.height = y1 - y0;
            return out;
        }
    };

    let [llx, lly, urx, ury] = page_box(doc, page);
    out.width = urx - llx;
    out.height = ury - lly;

    let resources = inherited(doc, page, b"Resources").and_then(|o| o.as_dict().ok());
    let base = GraphicsState {
        ctm: Matrix::new(1.0, 0.0, 0.0, -1.0, -llx, ury),
        ..GraphicsState::default()
    };

    let mut interpreter = Interpreter {
        doc,
        page_index,
        out,
        next_image: 0,
    };

    let bytes = interpreter.page_content(page_id);
    interpreter.run(&bytes, resources, base, 0);

    let out = interpreter.out;
    debug!(
        "Page {}: {} drawings, {} image placements, {} issues",
        page_index,
        out.drawings.len(),
        out.images.len(),
        out.errors.len()
    );
    out
}

// ── Graphics state ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f64,
    fill_color: Option<Rgb>,
    stroke_color: Option<Rgb>,
    fill_space: Paint,
    stroke_space: Paint,
    fill_opacity: f64,
    stroke_opacity: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            line_width: 1.0,
            fill_color: None,
            stroke_color: None,
            fill_space: Paint::Space(ColorSpace::Gray),
            stroke_space: Paint::Space(ColorSpace::Gray),
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

/// Current colour space as far as `sc`/`scn` are concerned.
#[derive(Debug, Clone, PartialEq)]
enum Paint {
    Space(ColorSpace),
    /// Pattern fills keep the last solid colour.
    Pattern,
    /// Unsupported family (Lab, unresolvable names): operands are read by
    /// their count.
    Unknown,
}

impl Paint {
    fn initial_color(&self) -> Option<Rgb> {
        match self {
            Paint::Space(space) => Some(space.initial_color()),
            Paint::Pattern => None,
            Paint::Unknown => Some(Rgb::BLACK),
        }
    }

    fn color(&self, operands: &[Object]) -> Option<Rgb> {
        let comps: Vec<f64> = operands.iter().map_while(number).collect();
        match self {
            Paint::Space(space) if !comps.is_empty() => Some(space.to_rgb(&comps)),
            Paint::Space(_) | Paint::Pattern => None,
            Paint::Unknown => Rgb::from_components(&comps),
        }
    }
}

/// The path under construction, already in page space.
#[derive(Debug, Default)]
struct PathBuilder {
    commands: Vec<PathCommand>,
    current: Option<Point>,
    subpath_start: Option<Point>,
    /// First problem met while building; the painted drawing degrades.
    malformed: Option<String>,
}

impl PathBuilder {
    fn mark_malformed(&mut self, detail: String) {
        if self.malformed.is_none() {
            self.malformed = Some(detail);
        }
    }

    fn move_to(&mut self, p: Point) {
        self.commands.push(PathCommand::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        self.commands.push(PathCommand::LineTo(p));
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.commands.push(PathCommand::CurveTo { c1, c2, end });
        self.current = Some(end);
    }

    fn close(&mut self) {
        if self.current.is_some() && self.commands.last() != Some(&PathCommand::Close) {
            self.commands.push(PathCommand::Close);
            self.current = self.subpath_start;
        }
    }

    fn rect(&mut self, ctm: &Matrix, x: f64, y: f64, w: f64, h: f64) {
        let ll = ctm.apply(x, y);
        let lr = ctm.apply(x + w, y);
        let ur = ctm.apply(x + w, y + h);
        let ul = ctm.apply(x, y + h);
        let cmd = if ctm.is_axis_aligned() {
            // ll and ur stay opposite corners under any axis-aligned map
            PathCommand::Rect(BoundingBox::new(ll.x, ll.y, ur.x, ur.y))
        } else {
            PathCommand::Quad(Quad { ul, ur, ll, lr })
        };
        self.commands.push(cmd);
        self.current = Some(ll);
        self.subpath_start = Some(ll);
    }
}

// ── Interpreter ──────────────────────────────────────────────────────────

struct Interpreter<'a> {
    doc: &'a Document,
    page_index: usize,
    out: PageContent,
    /// Ordinal handed to the next image placement.
    next_image: usize,
}

impl<'a> Interpreter<'a> {
    fn problem(&mut self, detail: String) {
        warn!("Page {}: {}", self.page_index, detail);
        self.out.errors.push(PageError::DrawingDecode {
            page: self.page_index,
            detail,
        });
    }

    /// All of the page's content streams, unfiltered and joined.
    fn page_content(&mut self, page_id: ObjectId) -> Vec<u8> {
        let mut bytes = Vec::new();
        for id in self.doc.get_page_contents(page_id) {
            let stream = match self.doc.get_object(id).and_then(Object::as_stream) {
                Ok(stream) => stream,
                Err(e) => {
                    self.problem(format!("content stream {:?} unavailable: {e}", id));
                    continue;
                }
            };
            if let Some(data) = self.unfilter(stream) {
                bytes.extend_from_slice(&data);
                bytes.push(b'\n');
            }
        }
        bytes
    }

    fn unfilter(&mut self, stream: &Stream) -> Option<Vec<u8>> {
        match decode_stream(self.doc, stream, MAX_DECODED_LEN) {
            Ok(decoded) if decoded.codec.is_none() => Some(decoded.data),
            Ok(decoded) => {
                let codec = decoded.codec.map_or("", |c| c.as_str());
                self.problem(format!("content stream uses image filter {codec}"));
                None
            }
            Err(e) => {
                self.problem(format!("content stream could not be decoded: {e}"));
                None
            }
        }
    }

    fn run(
        &mut self,
        bytes: &[u8],
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) {
        let parsed = parse_content(bytes);
        for detail in parsed.problems {
            self.problem(format!("content stream: {detail}"));
        }

        let mut gs = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut path = PathBuilder::default();

        for item in &parsed.items {
            let op = match item {
                ContentItem::Op(op) => op,
                ContentItem::InlineImage { entries, data } => {
                    self.place_inline_image(&gs, resources, entries, data);
                    continue;
                }
            };
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                // ── state ──
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => match numbers::<6>(operands) {
                    Some([a, b, c, d, e, f]) => gs.ctm = Matrix::new(a, b, c, d, e, f).then(&gs.ctm),
                    None => debug!("Ignoring malformed cm {:?}", operands),
                },
                "w" => {
                    if let Some([w]) = numbers::<1>(operands) {
                        gs.line_width = w;
                    }
                }
                "gs" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.apply_ext_gstate(&mut gs, resources, name);
                    }
                }

                // ── colour ──
                "g" | "rg" | "k" => {
                    gs.fill_space = device_space(op);
                    if let Some(c) = gs.fill_space.color(operands) {
                        gs.fill_color = Some(c);
                    }
                }
                "G" | "RG" | "K" => {
                    gs.stroke_space = device_space(op);
                    if let Some(c) = gs.stroke_space.color(operands) {
                        gs.stroke_color = Some(c);
                    }
                }
                "sc" | "scn" => {
                    if let Some(c) = gs.fill_space.color(operands) {
                        gs.fill_color = Some(c);
                    }
                }
                "SC" | "SCN" => {
                    if let Some(c) = gs.stroke_space.color(operands) {
                        gs.stroke_color = Some(c);
                    }
                }
                "cs" | "CS" => {
                    let Some(name) = operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    let paint = self.color_space(resources, name);
                    let initial = paint.initial_color();
                    if op.operator == "cs" {
                        gs.fill_space = paint;
                        gs.fill_color = initial.or(gs.fill_color);
                    } else {
                        gs.stroke_space = paint;
                        gs.stroke_color = initial.or(gs.stroke_color);
                    }
                }

                // ── path construction ──
                "m" => match numbers::<2>(operands) {
                    Some([x, y]) => path.move_to(gs.ctm.apply(x, y)),
                    None => path.mark_malformed(malformed("m", 2, operands)),
                },
                "l" => match (numbers::<2>(operands), path.current) {
                    (Some([x, y]), Some(_)) => path.line_to(gs.ctm.apply(x, y)),
                    (Some(_), None) => path.mark_malformed("'l' without a current point".into()),
                    (None, _) => path.mark_malformed(malformed("l", 2, operands)),
                },
                "c" => match (numbers::<6>(operands), path.current) {
                    (Some([x1, y1, x2, y2, x3, y3]), Some(_)) => path.curve_to(
                        gs.ctm.apply(x1, y1),
                        gs.ctm.apply(x2, y2),
                        gs.ctm.apply(x3, y3),
                    ),
                    (Some(_), None) => path.mark_malformed("'c' without a current point".into()),
                    (None, _) => path.mark_malformed(malformed("c", 6, operands)),
                },
                "v" => match (numbers::<4>(operands), path.current) {
                    (Some([x2, y2, x3, y3]), Some(start)) => {
                        path.curve_to(start, gs.ctm.apply(x2, y2), gs.ctm.apply(x3, y3))
                    }
                    (Some(_), None) => path.mark_malformed("'v' without a current point".into()),
                    (None, _) => path.mark_malformed(malformed("v", 4, operands)),
                },
                "y" => match (numbers::<4>(operands), path.current) {
                    (Some([x1, y1, x3, y3]), Some(_)) => {
                        let end = gs.ctm.apply(x3, y3);
                        path.curve_to(gs.ctm.apply(x1, y1), end, end)
                    }
                    (Some(_), None) => path.mark_malformed("'y' without a current point".into()),
                    (None, _) => path.mark_malformed(malformed("y", 4, operands)),
                },
                "h" => path.close(),
                "re" => match numbers::<4>(operands) {
                    Some([x, y, w, h]) => path.rect(&gs.ctm, x, y, w, h),
                    None => path.mark_malformed(malformed("re", 4, operands)),
                },

                // ── painting ──
                "S" => self.paint(&gs, &mut path, None, true, false),
                "s" => self.paint(&gs, &mut path, None, true, true),
                "f" | "F" => self.paint(&gs, &mut path, Some(FillRule::NonZero), false, false),
                "f*" => self.paint(&gs, &mut path, Some(FillRule::EvenOdd), false, false),
                "B" => self.paint(&gs, &mut path, Some(FillRule::NonZero), true, false),
                "B*" => self.paint(&gs, &mut path, Some(FillRule::EvenOdd), true, false),
                "b" => self.paint(&gs, &mut path, Some(FillRule::NonZero), true, true),
                "b*" => self.paint(&gs, &mut path, Some(FillRule::EvenOdd), true, true),
                "n" => path = PathBuilder::default(),

                // ── external objects ──
                "Do" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.paint_xobject(&gs, resources, name, depth);
                    }
                }

                _ => {}
            }
        }
    }

    fn paint(
        &mut self,
        gs: &GraphicsState,
        path: &mut PathBuilder,
        fill: Option<FillRule>,
        stroke: bool,
        close: bool,
    ) {
        if close {
            path.close();
        }
        let built = std::mem::take(path);

        let mut drawing = Drawing {
            commands: Vec::new(),
            has_fill: fill.is_some(),
            has_stroke: stroke,
            fill_rule: fill.unwrap_or_default(),
            fill_color: gs.fill_color,
            stroke_color: gs.stroke_color,
            stroke_width: stroke.then(|| gs.line_width * gs.ctm.scale_factor()),
            fill_opacity: gs.fill_opacity,
            stroke_opacity: gs.stroke_opacity,
        };

        if let Some(detail) = built.malformed {
            warn!(
                "Page {}: drawing #{} degraded: {}",
                self.page_index,
                self.out.drawings.len(),
                detail
            );
            self.out.errors.push(PageError::DrawingDecode {
                page: self.page_index,
                detail,
            });
            self.out.drawings.push(drawing);
            return;
        }

        if built.commands.is_empty() {
            return;
        }
        drawing.commands = built.commands;
        self.out.drawings.push(drawing);
    }

    fn apply_ext_gstate(
        &self,
        gs: &mut GraphicsState,
        resources: Option<&'a Dictionary>,
        name: &[u8],
    ) {
        let Some(state) = resources
            .and_then(|r| dict_get(self.doc, r, b"ExtGState"))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| dict_get(self.doc, d, name))
            .and_then(|o| o.as_dict().ok())
        else {
            debug!("ExtGState /{} not found", String::from_utf8_lossy(name));
            return;
        };

        if let Some(v) = dict_get(self.doc, state, b"ca").and_then(number) {
            gs.fill_opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = dict_get(self.doc, state, b"CA").and_then(number) {
            gs.stroke_opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = dict_get(self.doc, state, b"LW").and_then(number) {
            gs.line_width = v;
        }
    }

    fn paint_xobject(
        &mut self,
        gs: &GraphicsState,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        depth: usize,
    ) {
        let doc = self.doc;
        let display_name = String::from_utf8_lossy(name).into_owned();

        let Some(Object::Reference(id)) = resources
            .and_then(|r| dict_get(doc, r, b"XObject"))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(name).ok())
        else {
            debug!("XObject /{} not found in resources", display_name);
            return;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            debug!("XObject /{} is not a stream", display_name);
            return;
        };

        match stream.dict.get(b"Subtype").and_then(|o| o.as_name()) {
            Ok(b"Image") => self.place_image(gs, display_name, ImageSource::XObject(*id)),
            Ok(b"Form") => {
                if depth >= MAX_FORM_DEPTH {
                    warn!("Form XObject /{} nested too deeply, skipped", display_name);
                    return;
                }
                let matrix = dict_get(doc, &stream.dict, b"Matrix")
                    .and_then(|o| o.as_array().ok())
                    .and_then(|a| {
                        let resolved: Vec<Object> = a
                            .iter()
                            .filter_map(|o| resolve(doc, o).cloned())
                            .collect();
                        numbers::<6>(&resolved)
                    })
                    .map(|[a, b, c, d, e, f]| Matrix::new(a, b, c, d, e, f))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = dict_get(doc, &stream.dict, b"Resources")
                    .and_then(|o| o.as_dict().ok())
                    .or(resources);
                let Some(bytes) = self.unfilter(stream) else {
                    return;
                };

                let mut inner = gs.clone();
                inner.ctm = matrix.then(&gs.ctm);
                self.run(&bytes, form_resources, inner, depth + 1);
            }
            _ => debug!("XObject /{} has an unsupported subtype", display_name),
        }
    }

    fn place_image(&mut self, gs: &GraphicsState, name: String, source: ImageSource) {
        let corners = [
            gs.ctm.apply(0.0, 0.0),
            gs.ctm.apply(1.0, 0.0),
            gs.ctm.apply(1.0, 1.0),
            gs.ctm.apply(0.0, 1.0),
        ];
        let bbox = BoundingBox::from_points(corners).unwrap_or(BoundingBox::FALLBACK);
        self.out.images.push(ImagePlacement {
            name,
            source,
            bbox,
            ordinal: self.next_image,
        });
        self.next_image += 1;
    }

    /// Record an inline image, expanding its abbreviated keys and resolving
    /// a named colour space against `resources`.
    fn place_inline_image(
        &mut self,
        gs: &GraphicsState,
        resources: Option<&'a Dictionary>,
        entries: &[Object],
        data: &[u8],
    ) {
        let mut dict = Dictionary::new();
        for pair in entries.chunks_exact(2) {
            let Ok(key) = pair[0].as_name() else {
                continue;
            };
            let key: &[u8] = match key {
                b"W" => b"Width",
                b"H" => b"Height",
                b"BPC" => b"BitsPerComponent",
                b"CS" => b"ColorSpace",
                b"F" => b"Filter",
                b"DP" => b"DecodeParms",
                b"IM" => b"ImageMask",
                b"D" => b"Decode",
                b"I" => b"Interpolate",
                other => other,
            };
            let value = match (key, &pair[1]) {
                (b"ColorSpace", Object::Name(name)) if ColorSpace::from_family(name).is_err() => {
                    self.named_color_space(resources, name).cloned().unwrap_or_else(|| pair[1].clone())
                }
                (_, value) => value.clone(),
            };
            dict.set(key.to_vec(), value);
        }
        let name = format!("inline-{}", self.next_image);
        let stream = Stream::new(dict, data.to_vec());
        self.place_image(gs, name, ImageSource::Inline(Box::new(stream)));
    }

    fn named_color_space(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<&'a Object> {
        resources
            .and_then(|r| dict_get(self.doc, r, b"ColorSpace"))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| dict_get(self.doc, d, name))
    }

    /// Resolve the operand of `cs`/`CS`.
    fn color_space(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> Paint {
        if name == b"Pattern" {
            return Paint::Pattern;
        }
        if let Ok(space) = ColorSpace::from_family(name) {
            return Paint::Space(space);
        }
        let Some(obj) = self.named_color_space(resources, name) else {
            debug!("Colour space /{} not found", String::from_utf8_lossy(name));
            return Paint::Unknown;
        };
        let family = match obj {
            Object::Array(items) => items.first().and_then(|o| resolve(self.doc, o)),
            other => Some(other),
        };
        if family.and_then(|o| o.as_name().ok()) == Some(b"Pattern".as_slice()) {
            return Paint::Pattern;
        }
        match ColorSpace::parse(self.doc, obj, 0) {
            Ok(space) => Paint::Space(space),
            Err(e) => {
                debug!("Colour space /{}: {}", String::from_utf8_lossy(name), e);
                Paint::Unknown
            }
        }
    }
}

/// Colour space implied by `g`/`rg`/`k` and their stroking forms.
fn device_space(op: &Operation) -> Paint {
    match op.operator.as_str() {
        "g" | "G" => Paint::Space(ColorSpace::Gray),
        "rg" | "RG" => Paint::Space(ColorSpace::Rgb),
        _ => Paint::Space(ColorSpace::Cmyk),
    }
}

// ── Object helpers ───────────────────────────────────────────────────────

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Dictionary lookup with indirection resolved.
pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|o| resolve(doc, o))
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some((*r).into()),
        _ => None,
    }
}

/// Exactly `N` numeric operands.
fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = number(obj)?;
    }
    Some(out)
}

fn malformed(op: &str, expected: usize, operands: &[Object]) -> String {
    format!(
        "'{}' expects {} numeric operands, got {:?}",
        op, expected, operands
    )
}

/// Page attribute lookup honouring inheritance through `/Parent`.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..64 {
        if let Some(v) = dict_get(doc, node, key) {
            return Some(v);
        }
        node = dict_get(doc, node, b"Parent")?.as_dict().ok()?;
    }
    None
}

/// A page rectangle (`MediaBox`, `CropBox`) normalised to `[llx, lly, urx, ury]`.
fn page_rect(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<[f64; 4]> {
    let values: Vec<f64> = inherited(doc, page, key)?
        .as_array()
        .ok()?
        .iter()
        .filter_map(|o| resolve(doc, o).and_then(number))
        .collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => {
            let b = [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)];
            (b[2] > b[0] && b[3] > b[1]).then_some(b)
        }
        _ => None,
    }
}

/// The visible page area: the CropBox clipped to the MediaBox.
fn page_box(doc: &Document, page: &Dictionary) -> [f64; 4] {
    let media = page_rect(doc, page, b"MediaBox").unwrap_or(DEFAULT_MEDIA_BOX);
    let Some(crop) = page_rect(doc, page, b"CropBox") else {
        return media;
    };
    let clipped = [
        crop[0].max(media[0]),
        crop[1].max(media[1]),
        crop[2].min(media[2]),
        crop[3].min(media[3]),
    ];
    if clipped[2] > clipped[0] && clipped[3] > clipped[1] {
        clipped
    } else {
        media
    }
}
