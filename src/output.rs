//! Result types returned by an extraction run.
//!
//! Everything here is plain data and serialises to JSON (the CLI's `--json`
//! mode prints [`ExtractionOutput`] as-is). Paths point at files that exist
//! on disk by the time the value is returned.

use crate::cache::{read_file, FileContentCache};
use crate::error::{ExtractError, PageError};
use crate::geometry::BoundingBox;
use crate::pipeline::encode::{encode_png_base64, EncodedImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where an [`Image`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// An image XObject embedded in the page.
    Raster,
    /// A cluster of vector drawings rendered to a bitmap.
    Vector,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Raster => "raster",
            ImageKind::Vector => "vector",
        }
    }
}

/// One extracted image and its chart variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// `"{page}/{kind}/{sequence}"`, unique within the document.
    pub image_id: String,
    pub page_index: usize,
    /// Position in the page-scoped counter shared by raster and vector images.
    pub sequence: usize,
    pub kind: ImageKind,
    pub path: PathBuf,
    /// `None` when chart variants are disabled.
    pub chart_path: Option<PathBuf>,
    /// Pixel dimensions of the primary PNG.
    pub width: u32,
    pub height: u32,
    /// Placement on the page in points (top-left origin).
    pub bbox: Option<BoundingBox>,
}

impl Image {
    /// Base64 payload of the primary PNG, read through `cache` when given.
    pub fn encode(&self, cache: Option<&FileContentCache>) -> Result<EncodedImage, ExtractError> {
        let bytes = read_file(cache, &self.path).map_err(|source| ExtractError::ReadFailed {
            path: self.path.clone(),
            source,
        })?;
        Ok(encode_png_base64(&bytes))
    }
}

/// Everything produced for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based index in the document.
    pub page_index: usize,
    pub full_page_path: PathBuf,
    /// MediaBox size in points.
    pub width_pt: f64,
    pub height_pt: f64,
    /// Raster images first, then vector images, each in extraction order.
    pub images: Vec<Image>,
    /// Drawings that degraded and images that were skipped.
    pub errors: Vec<PageError>,
}

impl Page {
    pub fn raster_images(&self) -> impl Iterator<Item = &Image> {
        self.images.iter().filter(|i| i.kind == ImageKind::Raster)
    }

    pub fn vector_images(&self) -> impl Iterator<Item = &Image> {
        self.images.iter().filter(|i| i.kind == ImageKind::Vector)
    }
}

/// Document-level facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_name: String,
    pub page_count: usize,
    /// Header version, e.g. `"1.7"`.
    pub pdf_version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
}

/// Counters and timings for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub pages_processed: usize,
    pub raster_images: usize,
    pub vector_images: usize,
    /// Drawings seen across all processed pages.
    pub drawings: usize,
    /// Non-fatal page errors.
    pub page_errors: usize,
    pub render_time_ms: u64,
    pub total_time_ms: u64,
}

/// The complete result of [`crate::extract::extract`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub pages: Vec<Page>,
    pub metadata: DocumentMetadata,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.pages.iter().flat_map(|p| p.images.iter())
    }
}
