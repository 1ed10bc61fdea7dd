//! Extraction entry points.
//!
//! The work itself is synchronous: [`extract_blocking`] opens the document
//! once, drives the page renderer, and assembles each page as its bitmap
//! arrives. The async functions resolve the input (local file or URL) and
//! then run that core on the blocking pool, since the pdfium document
//! handle must stay on one thread.

use crate::config::{ExtractionConfig, PageRange};
use crate::error::ExtractError;
use crate::output::{DocumentMetadata, ExtractionOutput, ExtractionStats, Page};
use crate::pipeline::assemble::assemble_page;
use crate::pipeline::content::{dict_get, page_ids};
use crate::pipeline::input::{self, check_magic};
use crate::pipeline::render::{EmbeddedImages, PageRenderer, PdfiumRenderer};
use image::DynamicImage;
use lopdf::{Document, Object};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Extract pages `range` of a PDF file or URL into `out_dir`.
///
/// # Arguments
/// * `input` — Local file path or HTTP/HTTPS URL to a PDF
/// * `range` — 0-based, half-open page range
/// * `out_dir` — Root directory; one `page-NNNN/` subdirectory per page
///
/// # Errors
/// Returns `Err(ExtractError)` for fatal errors only: unreadable input,
/// a document that cannot be opened, an invalid range, a renderer failure
/// or an output write failure. Undecodable drawings and images are
/// reported on the affected [`Page`] instead.
pub async fn extract(
    input: impl AsRef<str>,
    range: &PageRange,
    out_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input = input.as_ref();
    info!("Starting extraction: {}", input);
    let resolved = input::resolve_input(input, config.download_timeout_secs).await?;
    extract_bytes(resolved.bytes, resolved.source_name, range, out_dir, config).await
}

/// Like [`extract`], for a PDF already in memory.
pub async fn extract_bytes(
    bytes: Vec<u8>,
    source_name: impl Into<String>,
    range: &PageRange,
    out_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let source_name = source_name.into();
    let range = *range;
    let out_dir: PathBuf = out_dir.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        extract_blocking(&bytes, &source_name, &range, &out_dir, &config)
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("extraction task failed: {e}")))?
}

/// Synchronous core shared by every entry point.
pub fn extract_blocking(
    pdf: &[u8],
    source_name: &str,
    range: &PageRange,
    out_dir: &Path,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();

    let doc = open_document(pdf, source_name)?;
    let metadata = read_metadata(&doc, source_name);
    let ids = page_ids(&doc);
    let indices = range.resolve(ids.len())?;
    info!(
        "{}: {} pages, extracting {} ({:?})",
        source_name,
        ids.len(),
        indices.len(),
        range
    );

    std::fs::create_dir_all(out_dir).map_err(|source| ExtractError::WriteFailed {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let total = indices.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total);
    }

    let renderer: Arc<dyn PageRenderer> = match config.renderer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(PdfiumRenderer::new()),
    };
    debug!("Rendering with '{}' at zoom {}", renderer.name(), config.zoom);

    let mut pages: Vec<Page> = Vec::with_capacity(total);
    let mut stats = ExtractionStats::default();
    let mut assembly_time = Duration::ZERO;
    let mut expected = indices.iter().copied();

    let render_start = Instant::now();
    let mut on_page = |page_index: usize,
                       bitmap: DynamicImage,
                       embedded: &mut dyn EmbeddedImages|
     -> Result<(), ExtractError> {
        if expected.next() != Some(page_index) {
            return Err(ExtractError::Internal(format!(
                "renderer '{}' delivered page {} out of order",
                renderer.name(),
                page_index
            )));
        }
        let started = Instant::now();
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_index, total);
        }

        let assembled = assemble_page(
            &doc,
            page_index,
            ids[page_index],
            bitmap,
            embedded,
            out_dir,
            config,
        )?;
        let page = assembled.page;

        for error in &page.errors {
            warn!("{}", error);
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_warning(page_index, &error.to_string());
            }
        }

        stats.drawings += assembled.drawing_count;
        stats.raster_images += page.raster_images().count();
        stats.vector_images += page.vector_images().count();
        stats.page_errors += page.errors.len();

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_index, total, page.images.len());
        }
        pages.push(page);
        assembly_time += started.elapsed();
        Ok(())
    };
    renderer.render_pages(pdf, &indices, config.zoom, &mut on_page)?;

    if pages.len() != total {
        return Err(ExtractError::Internal(format!(
            "renderer '{}' delivered {} of {} pages",
            renderer.name(),
            pages.len(),
            total
        )));
    }

    stats.pages_processed = pages.len();
    stats.render_time_ms = render_start
        .elapsed()
        .saturating_sub(assembly_time)
        .as_millis() as u64;
    stats.total_time_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Extraction complete: {} pages, {} raster + {} vector images, {}ms",
        stats.pages_processed, stats.raster_images, stats.vector_images, stats.total_time_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(total, stats.raster_images + stats.vector_images);
    }

    Ok(ExtractionOutput {
        pages,
        metadata,
        stats,
    })
}

/// Document metadata without extracting anything.
///
/// Does not need the pdfium library.
pub async fn inspect(
    input: impl AsRef<str>,
    download_timeout_secs: u64,
) -> Result<DocumentMetadata, ExtractError> {
    let resolved = input::resolve_input(input.as_ref(), download_timeout_secs).await?;
    inspect_bytes(&resolved.bytes, &resolved.source_name)
}

/// Synchronous [`inspect`] for a PDF in memory.
pub fn inspect_bytes(pdf: &[u8], source_name: &str) -> Result<DocumentMetadata, ExtractError> {
    let doc = open_document(pdf, source_name)?;
    Ok(read_metadata(&doc, source_name))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn open_document(pdf: &[u8], source_name: &str) -> Result<Document, ExtractError> {
    check_magic(source_name, pdf)?;
    let mut doc = Document::load_mem(pdf).map_err(|e| ExtractError::DocumentOpen {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    })?;
    // Owner-password-only files open with the empty user password.
    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| ExtractError::DocumentOpen {
            source_name: source_name.to_string(),
            detail: format!("encrypted document could not be opened with an empty password: {e}"),
        })?;
        info!("Decrypted {} with the empty user password", source_name);
    }
    Ok(doc)
}

fn read_metadata(doc: &Document, source_name: &str) -> DocumentMetadata {
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| match obj {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        });
    let field = |key: &[u8]| -> Option<String> {
        match dict_get(doc, info?, key)? {
            Object::String(bytes, _) => Some(text_string(bytes)).filter(|s| !s.is_empty()),
            _ => None,
        }
    };

    DocumentMetadata {
        source_name: source_name.to_string(),
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        title: field(b"Title"),
        author: field(b"Author"),
        producer: field(b"Producer"),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise byte-per-char.
fn text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::encryption::{decrypt_object, get_encryption_key};
    use lopdf::{dictionary, StringFormat};

    const FILE_ID: &[u8] = b"0123456789abcdef";

    /// One-page document encrypted with RC4 (revision 2) and an empty user
    /// password. `user_check` is stored as `/U` when given.
    fn encrypted_pdf(title: &str, user_check: Option<Vec<u8>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(lopdf::Stream::new(
            dictionary! {},
            b"10 10 50 50 re f".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
        });
        let mut encrypt = dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "O" => Object::String(vec![0x5A; 32], StringFormat::Hexadecimal),
            "P" => -4,
        };
        if let Some(check) = user_check {
            encrypt.set("U", Object::String(check, StringFormat::Hexadecimal));
        }
        let encrypt_id = doc.add_object(encrypt);
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.trailer.set("Encrypt", encrypt_id);
        let file_id = Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal);
        doc.trailer.set("ID", vec![file_id.clone(), file_id]);

        // RC4 is symmetric: decrypting plaintext encrypts it
        let key = get_encryption_key(&doc, "", false).unwrap();
        let sealed = decrypt_object(&key, content_id, doc.get_object(content_id).unwrap()).unwrap();
        if let Ok(Object::Stream(stream)) = doc.get_object_mut(content_id) {
            stream.set_content(sealed);
        }
        let title_obj = Object::String(title.as_bytes().to_vec(), StringFormat::Literal);
        let sealed_title = decrypt_object(&key, info_id, &title_obj).unwrap();
        if let Ok(Object::Dictionary(info)) = doc.get_object_mut(info_id) {
            info.set("Title", Object::String(sealed_title, StringFormat::Hexadecimal));
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn empty_user_password_documents_are_decrypted() {
        let pdf = encrypted_pdf("Quarterly Figures", None);
        let meta = inspect_bytes(&pdf, "locked.pdf").unwrap();
        assert_eq!(meta.page_count, 1);
        assert_eq!(meta.title.as_deref(), Some("Quarterly Figures"));

        let doc = open_document(&pdf, "locked.pdf").unwrap();
        assert!(!doc.is_encrypted());
        let page_id = doc.page_iter().next().unwrap();
        assert_eq!(doc.get_page_content(page_id).unwrap(), b"10 10 50 50 re f");
    }

    #[test]
    fn wrong_user_password_check_fails_to_open() {
        let pdf = encrypted_pdf("Quarterly Figures", Some(vec![0u8; 32]));
        match inspect_bytes(&pdf, "locked.pdf").unwrap_err() {
            ExtractError::DocumentOpen { source_name, detail } => {
                assert_eq!(source_name, "locked.pdf");
                assert!(detail.contains("empty password"), "{detail}");
            }
            other => panic!("expected DocumentOpen, got {other:?}"),
        }
    }

    #[test]
    fn text_strings_decode() {
        assert_eq!(text_string(b"Annual Report"), "Annual Report");
        assert_eq!(
            text_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9]),
            "Hé"
        );
    }

    #[test]
    fn garbage_is_not_a_pdf() {
        let err = inspect_bytes(b"hello world", "x.bin").unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }

    #[test]
    fn truncated_pdf_fails_to_open() {
        let err = inspect_bytes(b"%PDF-1.7\n1 0 obj\n<<", "broken.pdf").unwrap_err();
        match err {
            ExtractError::DocumentOpen { source_name, .. } => assert_eq!(source_name, "broken.pdf"),
            other => panic!("expected DocumentOpen, got {other:?}"),
        }
    }
}
