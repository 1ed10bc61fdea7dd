//! Error types for the edgequake-pdfextract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction cannot proceed (bad input,
//!   unreadable document, invalid page range, output directory not writable).
//!   Returned as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: one drawing or one embedded image could
//!   not be decoded. The drawing degrades to its fallback box or the image is
//!   skipped, and the page still completes. Stored inside
//!   [`crate::output::Page`] so callers can see what was lost.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfextract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be parsed.
    #[error("PDF '{source_name}' could not be opened: {detail}")]
    DocumentOpen { source_name: String, detail: String },

    /// The requested page range does not fit the document.
    #[error("Invalid page range {start}..{end} (document has {total} pages)")]
    PageRange {
        start: usize,
        end: usize,
        total: usize,
    },

    /// The page renderer failed on a specific page.
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write output file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a previously extracted file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A previously extracted file is not a decodable image.
    #[error("'{path}' is not a valid image: {detail}")]
    InvalidImage { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal problem on a single page.
///
/// Stored in [`crate::output::Page::errors`]. The page completes regardless.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// A drawing (or the whole content stream) could not be decoded; the
    /// drawing contributes the fallback box and paints nothing.
    #[error("Page {page}: drawing could not be decoded: {detail}")]
    DrawingDecode { page: usize, detail: String },

    /// An embedded image could not be decoded and was skipped.
    #[error("Page {page}: image '{image}' skipped: {detail}")]
    ImageDecode {
        page: usize,
        image: String,
        detail: String,
    },
}

impl PageError {
    pub fn page(&self) -> usize {
        match self {
            PageError::DrawingDecode { page, .. } | PageError::ImageDecode { page, .. } => *page,
        }
    }
}
