//! Crop a previously extracted image to a pixel rectangle.
//!
//! Downstream steps use this to cut a figure out of a full-page raster or to
//! tighten a vector cluster after a reader has picked out the interesting
//! region on the chart variant, whose grid labels are in the same pixel
//! coordinates as the primary PNG.

use crate::cache::{read_file, FileContentCache};
use crate::error::ExtractError;
use crate::output::Image;
use crate::pipeline::encode::{png_bytes, write_png};
use image::imageops;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A rectangle in pixel coordinates, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Intersect with a `w × h` image. `None` when nothing remains.
    pub fn clamp_to(&self, w: u32, h: u32) -> Option<PixelRect> {
        let x = self.x.min(w);
        let y = self.y.min(h);
        let width = self.width.min(w - x);
        let height = self.height.min(h - y);
        (width > 0 && height > 0).then_some(PixelRect { x, y, width, height })
    }
}

/// Crop `image` to `rect` and write the result to `dest`.
///
/// Returns the `(width, height)` actually written.
pub fn recrop(
    cache: Option<&FileContentCache>,
    image: &Image,
    rect: PixelRect,
    dest: &Path,
) -> Result<(u32, u32), ExtractError> {
    recrop_file(cache, &image.path, rect, dest)
}

/// [`recrop`] for any PNG or JPEG on disk.
pub fn recrop_file(
    cache: Option<&FileContentCache>,
    source: &Path,
    rect: PixelRect,
    dest: &Path,
) -> Result<(u32, u32), ExtractError> {
    let bytes = read_file(cache, source).map_err(|e| ExtractError::ReadFailed {
        path: source.to_path_buf(),
        source: e,
    })?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| ExtractError::InvalidImage {
            path: source.to_path_buf(),
            detail: e.to_string(),
        })?
        .to_rgb8();

    let (w, h) = img.dimensions();
    let clamped = rect.clamp_to(w, h).ok_or_else(|| ExtractError::InvalidImage {
        path: source.to_path_buf(),
        detail: format!("crop {rect:?} lies outside the {w}x{h} image"),
    })?;

    let cropped = imageops::crop_imm(&img, clamped.x, clamped.y, clamped.width, clamped.height)
        .to_image();
    write_png(dest, &png_bytes(&cropped)?, cache)?;

    debug!(
        "Recropped {} → {} ({}x{})",
        source.display(),
        dest.display(),
        clamped.width,
        clamped.height
    );
    Ok((clamped.width, clamped.height))
}
