//! # edgequake-pdfextract
//!
//! Extract full-page rasters, embedded raster images and vector
//! illustrations from PDF pages.
//!
//! ## Why this crate?
//!
//! A figure in a PDF is often not an image at all: charts, diagrams and
//! plots are drawn as hundreds of independent path fragments interleaved
//! with page rules, table borders and background panels. This crate reads
//! those fragments out of the content stream, drops the page-scale noise,
//! groups the fragments that overlap into one illustration, and renders each
//! group to its own PNG next to the page's embedded images.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Render    full page via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Content   content stream → drawings + image placements (lopdf)
//!  ├─ 4. Images    decode image XObjects, normalise to RGB
//!  ├─ 5. Cluster   size filter + margin overlap → union-find groups
//!  ├─ 6. Raster    scanline-rasterise each group
//!  └─ 7. Assemble  PNG + chart variant per image, per-page records
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfextract::{extract, ExtractionConfig, PageRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract("paper.pdf", &PageRange::new(0, 3), "out", &config).await?;
//!     for image in output.images() {
//!         println!("{} → {}", image.image_id, image.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfextract` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfextract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod recrop;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::FileContentCache;
pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageRange};
pub use error::{ExtractError, PageError};
pub use extract::{extract, extract_blocking, extract_bytes, inspect, inspect_bytes};
pub use geometry::BoundingBox;
pub use output::{DocumentMetadata, ExtractionOutput, ExtractionStats, Image, ImageKind, Page};
pub use pipeline::encode::EncodedImage;
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use recrop::{recrop, PixelRect};
