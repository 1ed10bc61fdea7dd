//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the extractor finishes each page. The CLI uses it to drive its
//! progress bar; a service could forward events to a channel instead.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfextract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ImageCounter {
//!     images: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for ImageCounter {
//!     fn on_page_complete(&self, page_index: usize, total_pages: usize, image_count: usize) {
//!         self.images.fetch_add(image_count, Ordering::SeqCst);
//!         eprintln!("page {} of {} done", page_index + 1, total_pages);
//!     }
//! }
//!
//! let counter = Arc::new(ImageCounter { images: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extractor as it processes each page.
///
/// Pages are processed one at a time on the extraction thread, but the
/// callback is shared through an `Arc` and may outlive the call, hence
/// `Send + Sync`. Every method has a no-op default.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first page.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is processed.
    ///
    /// `page_index` is the 0-based document page; `total_pages` is the number
    /// of pages in the requested range.
    fn on_page_start(&self, page_index: usize, total_pages: usize) {
        let _ = (page_index, total_pages);
    }

    /// Called when a page has been written.
    ///
    /// * `image_count` — raster plus vector images produced for the page
    fn on_page_complete(&self, page_index: usize, total_pages: usize, image_count: usize) {
        let _ = (page_index, total_pages, image_count);
    }

    /// Called for each non-fatal problem on a page (a degraded drawing or a
    /// skipped image).
    fn on_page_warning(&self, page_index: usize, message: &str) {
        let _ = (page_index, message);
    }

    /// Called once after the last page.
    fn on_extraction_complete(&self, total_pages: usize, image_count: usize) {
        let _ = (total_pages, image_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
