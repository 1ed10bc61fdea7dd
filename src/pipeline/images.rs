//! Embedded raster image extraction.
//!
//! Decodes the images the content interpreter found painted on a page
//! (image XObjects and inline images) and normalises every one of them to
//! 8-bit RGB, whatever colour model the PDF stored it in. A failure on one
//! image is reported as [`PageError::ImageDecode`] and the image is skipped;
//! the rest of the page is unaffected.
//!
//! Supported:
//!
//! | Aspect | Values |
//! |--------|--------|
//! | Filters | none, `FlateDecode`, `LZWDecode`, `ASCII85Decode`, `ASCIIHexDecode`, `RunLengthDecode` (with predictors, via [`crate::pipeline::filters`]), `DCTDecode` (via `image`) |
//! | Renderer codecs | `JPXDecode`, `JBIG2Decode`, `CCITTFaxDecode`, decoded by the page renderer through [`EmbeddedImages`] |
//! | Colour spaces | `DeviceGray`/`CalGray`, `DeviceRGB`/`CalRGB`, `DeviceCMYK`, `ICCBased` (by `/N`), `Indexed`, `Separation`, `DeviceN` |
//! | Bits per component | 1, 2, 4, 8, 16 |
//! | Other | `/ImageMask` stencils, `/Decode` arrays |
//!
//! Soft masks (`/SMask`) are ignored: the extracted image is opaque.

use crate::color::{cmyk8_to_rgb, Rgb};
use crate::error::PageError;
use crate::pipeline::content::{dict_get, number, resolve, ImagePlacement, ImageSource};
use crate::pipeline::filters::{decode_stream, Codec, FilterError, MAX_DECODED_LEN};
use crate::pipeline::render::EmbeddedImages;
use image::{GenericImageView, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::{debug, warn};

/// Images with more pixels than this are refused.
const MAX_PIXELS: u64 = 1 << 28;

/// Nesting limit when resolving colour space arrays.
const MAX_COLORSPACE_DEPTH: usize = 4;

/// Why one image could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("object is not an image stream")]
    NotAnImage,

    #[error("missing or invalid /{0}")]
    MissingKey(&'static str),

    #[error("image dimensions {width}×{height} are invalid")]
    Dimensions { width: i64, height: i64 },

    #[error("unsupported colour space {0}")]
    UnsupportedColorSpace(String),

    #[error("unsupported bits per component {0}")]
    UnsupportedBits(i64),

    #[error("stream could not be decoded: {0}")]
    Filter(#[from] FilterError),

    #[error("sample data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("JPEG decode failed: {0}")]
    Jpeg(String),

    /// The samples use a codec only the page renderer can decode.
    #[error("{} image needs the page renderer", .codec.as_str())]
    RendererCodec { codec: Codec, width: u32, height: u32 },

    #[error("renderer decoded {got:?} pixels for a {width}×{height} image")]
    RendererMismatch { width: u32, height: u32, got: (u32, u32) },
}

/// A decoded image together with where it was painted.
#[derive(Debug, Clone)]
pub struct ExtractedRaster {
    pub placement: ImagePlacement,
    pub pixels: RgbImage,
}

/// Decode every placement in order. Failures become [`PageError`]s.
///
/// Images whose codec this module cannot decode are requested from
/// `embedded` by paint order; its result is used only when its dimensions
/// match the image's `/Width` and `/Height`.
pub fn extract_page_images(
    doc: &Document,
    page_index: usize,
    placements: &[ImagePlacement],
    embedded: &mut dyn EmbeddedImages,
) -> (Vec<ExtractedRaster>, Vec<PageError>) {
    let mut rasters = Vec::with_capacity(placements.len());
    let mut errors = Vec::new();

    for placement in placements {
        let decoded = match decode_placement(doc, placement) {
            Err(DecodeError::RendererCodec { codec, width, height }) => {
                from_renderer(embedded, placement.ordinal, codec, width, height)
            }
            other => other,
        };
        match decoded {
            Ok(pixels) => {
                debug!(
                    "Page {}: image /{} decoded ({}×{})",
                    page_index,
                    placement.name,
                    pixels.width(),
                    pixels.height()
                );
                rasters.push(ExtractedRaster {
                    placement: placement.clone(),
                    pixels,
                });
            }
            Err(e) => {
                warn!("Page {}: image /{} skipped: {}", page_index, placement.name, e);
                errors.push(PageError::ImageDecode {
                    page: page_index,
                    image: placement.name.clone(),
                    detail: e.to_string(),
                });
            }
        }
    }

    (rasters, errors)
}

fn decode_placement(doc: &Document, placement: &ImagePlacement) -> Result<RgbImage, DecodeError> {
    match &placement.source {
        ImageSource::XObject(id) => decode_image(doc, *id),
        ImageSource::Inline(stream) => decode_image_stream(doc, stream),
    }
}

fn from_renderer(
    embedded: &mut dyn EmbeddedImages,
    ordinal: usize,
    codec: Codec,
    width: u32,
    height: u32,
) -> Result<RgbImage, DecodeError> {
    match embedded.decode(ordinal) {
        Some(image) if image.dimensions() == (width, height) => Ok(image.to_rgb8()),
        Some(image) => Err(DecodeError::RendererMismatch {
            width,
            height,
            got: image.dimensions(),
        }),
        None => Err(DecodeError::RendererCodec { codec, width, height }),
    }
}

/// Decode one image XObject to RGB.
pub fn decode_image(doc: &Document, id: ObjectId) -> Result<RgbImage, DecodeError> {
    let stream = doc
        .get_object(id)
        .and_then(Object::as_stream)
        .map_err(|_| DecodeError::NotAnImage)?;
    decode_image_stream(doc, stream)
}

/// Decode an image stream, XObject or inline, to RGB.
pub fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<RgbImage, DecodeError> {
    let dict = &stream.dict;

    let width = integer(doc, dict, b"Width").ok_or(DecodeError::MissingKey("Width"))?;
    let height = integer(doc, dict, b"Height").ok_or(DecodeError::MissingKey("Height"))?;
    if width <= 0 || height <= 0 || (width as u64) * (height as u64) > MAX_PIXELS {
        return Err(DecodeError::Dimensions { width, height });
    }
    let (width, height) = (width as u32, height as u32);

    // 16-bit CMYK is the widest layout
    let limit = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(8)
        .saturating_add(height as usize)
        .clamp(1 << 16, MAX_DECODED_LEN);
    let decoded = decode_stream(doc, stream, limit)?;
    match decoded.codec {
        Some(Codec::Dct) => return decode_jpeg(&decoded.data),
        Some(codec) => return Err(DecodeError::RendererCodec { codec, width, height }),
        None => {}
    }
    let data = decoded.data;

    let is_mask = matches!(dict_get(doc, dict, b"ImageMask"), Some(Object::Boolean(true)));
    let (space, bpc) = if is_mask {
        (ColorSpace::Stencil, 1)
    } else {
        let space = dict_get(doc, dict, b"ColorSpace")
            .ok_or(DecodeError::MissingKey("ColorSpace"))
            .and_then(|o| ColorSpace::parse(doc, o, 0))?;
        let bpc = integer(doc, dict, b"BitsPerComponent").unwrap_or(8);
        (space, bpc)
    };
    let bpc = match bpc {
        1 | 2 | 4 | 8 | 16 => bpc as u32,
        other => return Err(DecodeError::UnsupportedBits(other)),
    };

    let decode = decode_ranges(doc, dict, &space, bpc);
    let layout = SampleLayout {
        width,
        height,
        components: space.components(),
        bpc,
    };
    layout.check(&data)?;

    Ok(layout.to_rgb(&data, &space, &decode))
}

fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    // The decoder converts CMYK/YCCK JPEGs to RGB itself.
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map(|img| img.to_rgb8())
        .map_err(|e| DecodeError::Jpeg(e.to_string()))
}

// ── Colour spaces ────────────────────────────────────────────────────────

/// A colour space reduced to what RGB conversion needs. Shared with the
/// content interpreter for `cs`/`sc` colours.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorSpace>,
        hival: u32,
        lookup: Vec<u8>,
    },
    /// Single-tint ink; painted as gray where full tint is black.
    Separation,
    /// Several inks; the heaviest tint decides the gray level.
    DeviceN(usize),
    /// `/ImageMask`: 0 paints black, 1 leaves white.
    Stencil,
}

impl ColorSpace {
    pub(crate) fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } | ColorSpace::Separation | ColorSpace::Stencil => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::DeviceN(n) => *n,
        }
    }

    /// Colour selected by `cs`/`CS` before any `sc`.
    pub(crate) fn initial_color(&self) -> Rgb {
        match self {
            ColorSpace::Gray | ColorSpace::Rgb | ColorSpace::Stencil => Rgb::BLACK,
            ColorSpace::Cmyk => self.to_rgb(&[0.0, 0.0, 0.0, 1.0]),
            ColorSpace::Indexed { .. } => self.to_rgb(&[0.0]),
            ColorSpace::Separation | ColorSpace::DeviceN(_) => self.to_rgb(&vec![1.0; self.components()]),
        }
    }

    pub(crate) fn parse(doc: &Document, obj: &Object, depth: usize) -> Result<Self, DecodeError> {
        if depth > MAX_COLORSPACE_DEPTH {
            return Err(DecodeError::UnsupportedColorSpace("nested too deeply".into()));
        }
        match obj {
            Object::Name(name) => Self::from_family(name),
            Object::Reference(_) => match resolve(doc, obj) {
                Some(inner) => Self::parse(doc, inner, depth + 1),
                None => Err(DecodeError::UnsupportedColorSpace("dangling reference".into())),
            },
            Object::Array(items) => {
                let family = items
                    .first()
                    .and_then(|o| resolve(doc, o))
                    .and_then(|o| o.as_name().ok())
                    .ok_or_else(|| DecodeError::UnsupportedColorSpace("empty array".into()))?;
                let arg = |i: usize| items.get(i).and_then(|o| resolve(doc, o));

                match family {
                    b"ICCBased" => {
                        let profile = arg(1)
                            .and_then(|o| o.as_stream().ok())
                            .ok_or_else(|| DecodeError::UnsupportedColorSpace("ICCBased without profile".into()))?;
                        match integer(doc, &profile.dict, b"N") {
                            Some(1) => Ok(ColorSpace::Gray),
                            Some(3) => Ok(ColorSpace::Rgb),
                            Some(4) => Ok(ColorSpace::Cmyk),
                            _ => match dict_get(doc, &profile.dict, b"Alternate") {
                                Some(alt) => Self::parse(doc, alt, depth + 1),
                                None => Err(DecodeError::UnsupportedColorSpace("ICCBased with unknown /N".into())),
                            },
                        }
                    }
                    b"Indexed" | b"I" => {
                        let base = arg(1)
                            .ok_or(DecodeError::MissingKey("ColorSpace"))
                            .and_then(|o| Self::parse(doc, o, depth + 1))?;
                        if matches!(base, ColorSpace::Indexed { .. } | ColorSpace::Stencil) {
                            return Err(DecodeError::UnsupportedColorSpace("Indexed over Indexed".into()));
                        }
                        let hival = arg(2)
                            .and_then(number)
                            .filter(|v| (0.0..=255.0).contains(v))
                            .ok_or_else(|| DecodeError::UnsupportedColorSpace("Indexed hival".into()))?
                            as u32;
                        let lookup = match arg(3) {
                            Some(Object::String(bytes, _)) => bytes.clone(),
                            Some(Object::Stream(s)) => decode_stream(doc, s, 256 * 32)?.data,
                            _ => return Err(DecodeError::UnsupportedColorSpace("Indexed lookup".into())),
                        };
                        Ok(ColorSpace::Indexed {
                            base: Box::new(base),
                            hival,
                            lookup,
                        })
                    }
                    b"Separation" => Ok(ColorSpace::Separation),
                    b"DeviceN" => {
                        let inks = arg(1)
                            .and_then(|o| o.as_array().ok())
                            .map(|a| a.len())
                            .filter(|&n| (1..=32).contains(&n))
                            .ok_or_else(|| DecodeError::UnsupportedColorSpace("DeviceN without inks".into()))?;
                        Ok(ColorSpace::DeviceN(inks))
                    }
                    b"CalGray" => Ok(ColorSpace::Gray),
                    b"CalRGB" => Ok(ColorSpace::Rgb),
                    other => Self::from_family(other),
                }
            }
            other => Err(DecodeError::UnsupportedColorSpace(format!("{other:?}"))),
        }
    }

    pub(crate) fn from_family(name: &[u8]) -> Result<Self, DecodeError> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(DecodeError::UnsupportedColorSpace(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    /// Colour from components mapped into `[0, 1]` (or a raw index for
    /// `Indexed`). Missing components read as 0.
    pub(crate) fn to_rgb(&self, c: &[f64]) -> Rgb {
        let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
        match self {
            ColorSpace::Gray => Rgb::from_gray(at(0)),
            ColorSpace::Rgb => Rgb::from_rgb(at(0), at(1), at(2)),
            ColorSpace::Cmyk => Rgb::from_cmyk(at(0), at(1), at(2), at(3)),
            ColorSpace::Separation => Rgb::from_gray(1.0 - at(0)),
            ColorSpace::DeviceN(_) => Rgb::from_gray(1.0 - c.iter().copied().fold(0.0, f64::max)),
            ColorSpace::Stencil => {
                if at(0) < 0.5 {
                    Rgb::BLACK
                } else {
                    Rgb::WHITE
                }
            }
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = (at(0).round().max(0.0) as u32).min(*hival) as usize;
                let n = base.components();
                let entry = lookup.get(index * n..index * n + n).unwrap_or(&[]);
                if entry.len() != n {
                    // short lookup table
                    return Rgb::BLACK;
                }
                let scaled: Vec<f64> = entry.iter().map(|&v| v as f64 / 255.0).collect();
                match base.as_ref() {
                    ColorSpace::Cmyk => {
                        let [r, g, b] = cmyk8_to_rgb(entry[0], entry[1], entry[2], entry[3]);
                        Rgb::new(r, g, b)
                    }
                    other => other.to_rgb(&scaled),
                }
            }
        }
    }
}

// ── Samples ──────────────────────────────────────────────────────────────

struct SampleLayout {
    width: u32,
    height: u32,
    components: usize,
    bpc: u32,
}

impl SampleLayout {
    /// Bytes per row; rows start on byte boundaries.
    fn stride(&self) -> usize {
        (self.width as usize * self.components * self.bpc as usize).div_ceil(8)
    }

    fn check(&self, data: &[u8]) -> Result<(), DecodeError> {
        let expected = self.stride() * self.height as usize;
        if data.len() < expected {
            return Err(DecodeError::Truncated {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }

    fn sample(&self, row: &[u8], index: usize) -> u32 {
        match self.bpc {
            8 => row[index] as u32,
            16 => u16::from_be_bytes([row[2 * index], row[2 * index + 1]]) as u32,
            bpc => {
                let bit = index * bpc as usize;
                let shift = 8 - bpc as usize - (bit % 8);
                ((row[bit / 8] >> shift) as u32) & ((1 << bpc) - 1)
            }
        }
    }

    fn to_rgb(&self, data: &[u8], space: &ColorSpace, decode: &[(f64, f64)]) -> RgbImage {
        let max = ((1u32 << self.bpc) - 1) as f64;
        let stride = self.stride();
        let mut comps = vec![0.0f64; self.components];
        let mut out = RgbImage::new(self.width, self.height);

        for y in 0..self.height {
            let row = &data[y as usize * stride..(y as usize + 1) * stride];
            for x in 0..self.width {
                for (c, slot) in comps.iter_mut().enumerate() {
                    let raw = self.sample(row, x as usize * self.components + c) as f64;
                    let (dmin, dmax) = decode[c];
                    *slot = dmin + raw * (dmax - dmin) / max;
                }
                out.put_pixel(x, y, image::Rgb(space.to_rgb(&comps).to_array()));
            }
        }
        out
    }
}

/// `/Decode` ranges per component, or the colour space default.
fn decode_ranges(doc: &Document, dict: &Dictionary, space: &ColorSpace, bpc: u32) -> Vec<(f64, f64)> {
    let default = match space {
        ColorSpace::Indexed { .. } => (0.0, ((1u32 << bpc) - 1) as f64),
        _ => (0.0, 1.0),
    };
    let n = space.components();

    let explicit: Option<Vec<f64>> = dict_get(doc, dict, b"Decode")
        .and_then(|o| o.as_array().ok())
        .map(|a| a.iter().filter_map(|o| resolve(doc, o).and_then(number)).collect());

    match explicit {
        Some(v) if v.len() >= 2 * n => v.chunks(2).take(n).map(|p| (p[0], p[1])).collect(),
        _ => vec![default; n],
    }
}

fn integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict_get(doc, dict, key).and_then(number).map(|v| v as i64)
}
