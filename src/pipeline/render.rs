//! Full-page rasterisation behind the [`PageRenderer`] trait.
//!
//! The default implementation, [`PdfiumRenderer`], drives the pdfium C++
//! library through `pdfium-render`. pdfium uses thread-local state and is not
//! safe to call from async contexts, so callers run it inside
//! `spawn_blocking` (see [`crate::extract::extract`]).
//!
//! The trait exists so that the rest of the pipeline (which only needs "an
//! image of page N at this zoom") can be exercised with another backend, for
//! example in tests on machines without the pdfium shared library.
//!
//! Alongside each bitmap a renderer hands over an [`EmbeddedImages`] view of
//! the same page. pdfium decodes JPEG 2000, JBIG2 and CCITT fax images that
//! [`crate::pipeline::images`] cannot, so those are fetched from it.

use crate::error::ExtractError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Nesting limit when walking form objects for images.
const MAX_FORM_DEPTH: usize = 16;

/// Callback receiving each rendered page as `(page_index, image, embedded)`.
pub type PageSink<'a> =
    dyn FnMut(usize, DynamicImage, &mut dyn EmbeddedImages) -> Result<(), ExtractError> + 'a;

/// Images on the page being delivered, decoded by the renderer.
///
/// `ordinal` counts images in paint order: image XObjects and inline images
/// as the content stream draws them, with form XObject contents in place.
pub trait EmbeddedImages {
    /// Native-resolution pixels of the `ordinal`-th image, if available.
    fn decode(&mut self, ordinal: usize) -> Option<DynamicImage>;
}

/// A renderer that decodes no images of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEmbeddedImages;

impl EmbeddedImages for NoEmbeddedImages {
    fn decode(&mut self, _ordinal: usize) -> Option<DynamicImage> {
        None
    }
}

/// Renders whole pages of a PDF to bitmaps.
pub trait PageRenderer: Send + Sync {
    /// Render `pages` (0-based, in the given order) of the document in `pdf`
    /// at `zoom` × 72 DPI, handing each image to `on_page` as soon as it is
    /// ready, together with the page's [`EmbeddedImages`]. The document is
    /// opened once per call.
    fn render_pages(
        &self,
        pdf: &[u8],
        pages: &[usize],
        zoom: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<(), ExtractError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// [`PageRenderer`] backed by pdfium.
///
/// Binds to `library_path` when set, otherwise to the library located (and
/// downloaded on first use) by `pdfium-auto`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    pub library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let bound = match &self.library_path {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path),
            None => pdfium_auto::bind_pdfium_silent(),
        };
        bound.map_err(|e| ExtractError::PdfiumBindingFailed(e.to_string()))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_pages(
        &self,
        pdf: &[u8],
        pages: &[usize],
        zoom: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<(), ExtractError> {
        if pages.is_empty() {
            return Ok(());
        }
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ExtractError::RenderFailed {
                page: pages[0],
                detail: format!("pdfium could not open the document: {:?}", e),
            })?;

        let doc_pages = document.pages();
        let total = doc_pages.len() as usize;
        info!("pdfium loaded document: {} pages", total);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);

        for &idx in pages {
            if idx >= total {
                return Err(ExtractError::RenderFailed {
                    page: idx,
                    detail: format!("page out of range (total={})", total),
                });
            }

            let page = doc_pages
                .get(idx as u16)
                .map_err(|e| ExtractError::RenderFailed {
                    page: idx,
                    detail: format!("{:?}", e),
                })?;

            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| ExtractError::RenderFailed {
                    page: idx,
                    detail: format!("{:?}", e),
                })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx,
                image.width(),
                image.height()
            );

            let mut embedded = PdfiumPageImages { page: &page };
            on_page(idx, image, &mut embedded)?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "pdfium"
    }
}

/// Image objects of one pdfium page, looked up on demand.
struct PdfiumPageImages<'p> {
    page: &'p PdfPage<'p>,
}

impl EmbeddedImages for PdfiumPageImages<'_> {
    fn decode(&mut self, ordinal: usize) -> Option<DynamicImage> {
        let mut seen = 0;
        nth_raw_image(self.page.objects().iter(), ordinal, &mut seen, 0)
    }
}

fn nth_raw_image<'a>(
    objects: impl Iterator<Item = PdfPageObject<'a>>,
    ordinal: usize,
    seen: &mut usize,
    depth: usize,
) -> Option<DynamicImage> {
    for object in objects {
        if let Some(image) = object.as_image_object() {
            if *seen == ordinal {
                return match image.get_raw_image() {
                    Ok(pixels) => Some(pixels),
                    Err(e) => {
                        debug!("pdfium could not decode image #{}: {:?}", ordinal, e);
                        None
                    }
                };
            }
            *seen += 1;
        } else if let Some(form) = object.as_x_object_form_object() {
            if depth < MAX_FORM_DEPTH {
                if let Some(found) = nth_raw_image(form.iter(), ordinal, seen, depth + 1) {
                    return Some(found);
                }
            }
        }
    }
    None
}
