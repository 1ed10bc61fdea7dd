//! Configuration types for page and graphic extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The page range is not part of the
//! config: it is passed per call as a [`PageRange`].

use crate::cache::FileContentCache;
use crate::error::ExtractError;
use crate::pipeline::cluster::ClusterParams;
use crate::pipeline::render::PageRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfextract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .zoom(3.0)
///     .overlap_threshold(500.0)
///     .write_charts(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Full-page render scale relative to 72 DPI. Range: 0.25–8. Default: 2.0.
    pub zoom: f32,

    /// Drawings wider or taller than this (points) are background-scale and
    /// never cluster. Default: 400.
    pub overlap_threshold: f64,

    /// Padding (points) added around each drawing box before the overlap
    /// test. Default: 10.
    pub margin_allowance: f64,

    /// Write the gridded "chart" variant next to every image. Default: true.
    pub write_charts: bool,

    /// Gridline density multiplier for chart variants. Default: 2.0.
    pub chart_density: f64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Full-page renderer. `None` uses [`crate::pipeline::render::PdfiumRenderer`].
    pub renderer: Option<Arc<dyn PageRenderer>>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// File content cache primed with every written PNG.
    pub cache: Option<Arc<FileContentCache>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            zoom: 2.0,
            overlap_threshold: 400.0,
            margin_allowance: 10.0,
            write_charts: true,
            chart_density: 2.0,
            download_timeout_secs: 120,
            renderer: None,
            progress_callback: None,
            cache: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("zoom", &self.zoom)
            .field("overlap_threshold", &self.overlap_threshold)
            .field("margin_allowance", &self.margin_allowance)
            .field("write_charts", &self.write_charts)
            .field("chart_density", &self.chart_density)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("renderer", &self.renderer.as_ref().map(|r| r.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .field("cache", &self.cache)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            overlap_threshold: self.overlap_threshold,
            margin_allowance: self.margin_allowance,
        }
    }

    pub(crate) fn cache_ref(&self) -> Option<&FileContentCache> {
        self.cache.as_deref()
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom;
        self
    }

    pub fn overlap_threshold(mut self, points: f64) -> Self {
        self.config.overlap_threshold = points;
        self
    }

    pub fn margin_allowance(mut self, points: f64) -> Self {
        self.config.margin_allowance = points;
        self
    }

    pub fn write_charts(mut self, v: bool) -> Self {
        self.config.write_charts = v;
        self
    }

    pub fn chart_density(mut self, density: f64) -> Self {
        self.config.chart_density = density;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cache(mut self, cache: Arc<FileContentCache>) -> Self {
        self.config.cache = Some(cache);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !(0.25..=8.0).contains(&c.zoom) {
            return Err(ExtractError::InvalidConfig(format!(
                "zoom must be 0.25–8, got {}",
                c.zoom
            )));
        }
        if !c.overlap_threshold.is_finite() || c.overlap_threshold <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "overlap threshold must be a positive number of points, got {}",
                c.overlap_threshold
            )));
        }
        if !c.margin_allowance.is_finite() || c.margin_allowance < 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "margin allowance must be ≥ 0, got {}",
                c.margin_allowance
            )));
        }
        if !c.chart_density.is_finite() || c.chart_density <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "chart density must be > 0, got {}",
                c.chart_density
            )));
        }
        if c.download_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "download timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Page range ───────────────────────────────────────────────────────────

/// 0-based, half-open page range: `start` inclusive, `end` exclusive.
///
/// `end: None` runs to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Every page of the document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn starting_at(start: usize) -> Self {
        Self { start, end: None }
    }

    /// Page indices for a document of `total` pages.
    ///
    /// `start == end` selects nothing; `start` past the last page, `end`
    /// beyond `total`, or `end < start` are errors. An open range over an
    /// empty document selects nothing.
    pub fn resolve(&self, total: usize) -> Result<Vec<usize>, ExtractError> {
        let end = self.end.unwrap_or(total);
        let invalid = end < self.start || end > total || (self.start >= total && end != self.start);
        if invalid {
            return Err(ExtractError::PageRange {
                start: self.start,
                end,
                total,
            });
        }
        Ok((self.start..end).collect())
    }
}
