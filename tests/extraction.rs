//! End-to-end extraction tests.
//!
//! Documents are built in memory with lopdf and full pages are "rendered"
//! by a stub [`PageRenderer`], so these run anywhere. The one test that
//! needs the real pdfium library skips itself unless the library is already
//! cached locally.
//!
//! Run with:
//!   cargo test --test extraction -- --nocapture

use edgequake_pdfextract::{
    extract, extract_blocking, extract_bytes, inspect_bytes, recrop, ExtractError,
    ExtractionConfig, ExtractionOutput, ExtractionProgressCallback, FileContentCache, ImageKind,
    PageRange, PageRenderer, PdfiumRenderer, PixelRect,
};
use edgequake_pdfextract::pipeline::render::{EmbeddedImages, NoEmbeddedImages, PageSink};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless pdfium has already been downloaded.
macro_rules! skip_unless_pdfium {
    () => {{
        match pdfium_auto::cached_pdfium_path() {
            Some(p) => p,
            None => {
                println!("SKIP — pdfium not cached; run the CLI once to download it");
                return;
            }
        }
    }};
}

/// Paints a flat grey page at `zoom` × 72 DPI without looking at the PDF.
struct StubRenderer {
    page_size: (f32, f32),
}

impl Default for StubRenderer {
    fn default() -> Self {
        Self {
            page_size: (612.0, 792.0),
        }
    }
}

impl PageRenderer for StubRenderer {
    fn render_pages(
        &self,
        _pdf: &[u8],
        pages: &[usize],
        zoom: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<(), ExtractError> {
        let w = (self.page_size.0 * zoom).round() as u32;
        let h = (self.page_size.1 * zoom).round() as u32;
        for &page in pages {
            let bitmap = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 200, 200])));
            on_page(page, bitmap, &mut NoEmbeddedImages)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Drops every page after the first.
struct ForgetfulRenderer;

impl PageRenderer for ForgetfulRenderer {
    fn render_pages(
        &self,
        _pdf: &[u8],
        pages: &[usize],
        _zoom: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<(), ExtractError> {
        if let Some(&first) = pages.first() {
            on_page(first, DynamicImage::ImageRgb8(RgbImage::new(10, 10)), &mut NoEmbeddedImages)?;
        }
        Ok(())
    }
}

/// Like [`StubRenderer`], but also hands out pre-decoded embedded images
/// by paint order, the way pdfium does for codecs lopdf cannot read.
struct EmbeddingRenderer {
    images: Vec<DynamicImage>,
}

struct ByOrdinal<'a>(&'a [DynamicImage]);

impl EmbeddedImages for ByOrdinal<'_> {
    fn decode(&mut self, ordinal: usize) -> Option<DynamicImage> {
        self.0.get(ordinal).cloned()
    }
}

impl PageRenderer for EmbeddingRenderer {
    fn render_pages(
        &self,
        _pdf: &[u8],
        pages: &[usize],
        zoom: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<(), ExtractError> {
        let (w, h) = ((612.0 * zoom).round() as u32, (792.0 * zoom).round() as u32);
        for &page in pages {
            let bitmap = DynamicImage::ImageRgb8(RgbImage::new(w, h));
            on_page(page, bitmap, &mut ByOrdinal(&self.images))?;
        }
        Ok(())
    }
}

fn stub_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .zoom(1.0)
        .renderer(Arc::new(StubRenderer::default()))
        .build()
        .unwrap()
}

struct TestPage {
    ops: Vec<Operation>,
    resources: Dictionary,
    media_box: [i64; 4],
}

impl TestPage {
    fn new(ops: Vec<Operation>) -> Self {
        Self {
            ops,
            resources: dictionary! {},
            media_box: [0, 0, 612, 792],
        }
    }
}

/// Serialise a document with one page per entry.
fn build_pdf(pages: Vec<TestPage>, extra: impl FnOnce(&mut Document) -> Vec<(Vec<u8>, Object)>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    // objects the caller wants referenced from every page's resources
    let shared = extra(&mut doc);

    let mut kids = Vec::new();
    for page in pages {
        let content = Content {
            operations: page.ops,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let mut resources = page.resources;
        for (key, value) in &shared {
            resources.set(key.clone(), value.clone());
        }
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => page.media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Extraction fixture"),
    });
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn no_extra(_: &mut Document) -> Vec<(Vec<u8>, Object)> {
    Vec::new()
}

fn op(name: &str, operands: &[f64]) -> Operation {
    Operation::new(name, operands.iter().map(|&v| Object::Real(v as f32)).collect())
}

fn filled_rect(x: f64, y: f64, w: f64, h: f64) -> Vec<Operation> {
    vec![op("re", &[x, y, w, h]), op("f", &[])]
}

fn stroked_line(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Operation> {
    vec![op("m", &[x0, y0]), op("l", &[x1, y1]), op("S", &[])]
}

/// 4×3 CMYK samples: white, cyan, black repeating.
fn cmyk_samples() -> Vec<u8> {
    let mut samples = Vec::new();
    for i in 0..12u8 {
        let cmyk: [u8; 4] = match i % 3 {
            0 => [0, 0, 0, 0],   // white
            1 => [255, 0, 0, 0], // cyan
            _ => [0, 0, 0, 255], // black
        };
        samples.extend_from_slice(&cmyk);
    }
    samples
}

/// Register `dict` + `data` as image XObject /Im0 for every page.
fn image_xobject(doc: &mut Document, mut dict: Dictionary, data: Vec<u8>) -> Vec<(Vec<u8>, Object)> {
    dict.set("Type", "XObject");
    dict.set("Subtype", "Image");
    dict.set("Width", 4);
    dict.set("Height", 3);
    let image_id = doc.add_object(Stream::new(dict, data));
    vec![(
        b"XObject".to_vec(),
        Object::Dictionary(dictionary! { "Im0" => image_id }),
    )]
}

/// A 4×3 unfiltered DeviceCMYK image named /Im0, shared by every page.
fn cmyk_image(doc: &mut Document) -> Vec<(Vec<u8>, Object)> {
    let dict = dictionary! {
        "ColorSpace" => "DeviceCMYK",
        "BitsPerComponent" => 8,
    };
    image_xobject(doc, dict, cmyk_samples())
}

/// The same image, zlib-compressed with a PNG Up predictor on every row.
fn flate_cmyk_image(doc: &mut Document) -> Vec<(Vec<u8>, Object)> {
    let samples = cmyk_samples();
    let mut filtered = Vec::new();
    let mut previous = vec![0u8; 16];
    for row in samples.chunks(16) {
        filtered.push(2);
        filtered.extend(row.iter().zip(&previous).map(|(&b, &up)| b.wrapping_sub(up)));
        previous = row.to_vec();
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&filtered).unwrap();
    let dict = dictionary! {
        "ColorSpace" => "DeviceCMYK",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
        "DecodeParms" => dictionary! {
            "Predictor" => 12,
            "Colors" => 4,
            "Columns" => 4,
        },
    };
    image_xobject(doc, dict, encoder.finish().unwrap())
}

/// A 4×3 JPEG 2000 image; the payload is opaque to lopdf.
fn jpx_image(doc: &mut Document) -> Vec<(Vec<u8>, Object)> {
    let dict = dictionary! { "Filter" => "JPXDecode" };
    image_xobject(doc, dict, vec![0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
}

fn place_image(x: f64, y: f64, w: f64, h: f64) -> Vec<Operation> {
    vec![
        op("q", &[]),
        op("cm", &[w, 0.0, 0.0, h, x, y]),
        Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
        op("Q", &[]),
    ]
}

/// Every file under `dir`, keyed by relative path.
fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(rel, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

fn run(pdf: &[u8], range: PageRange, out: &Path, config: &ExtractionConfig) -> ExtractionOutput {
    extract_blocking(pdf, "fixture.pdf", &range, out, config).expect("extraction should succeed")
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn two_separate_rectangles_yield_two_vector_images() {
    let mut ops = filled_rect(72.0, 600.0, 100.0, 80.0);
    ops.extend(filled_rect(350.0, 200.0, 60.0, 60.0));
    let pdf = build_pdf(vec![TestPage::new(ops)], no_extra);
    let dir = tempfile::tempdir().unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());

    assert_eq!(output.pages.len(), 1);
    let page = &output.pages[0];
    let vectors: Vec<_> = page.vector_images().collect();
    assert_eq!(vectors.len(), 2);
    assert_eq!((vectors[0].width, vectors[0].height), (100, 80));
    assert_eq!((vectors[1].width, vectors[1].height), (60, 60));
    assert_ne!(vectors[0].path, vectors[1].path);

    // solid black fill fills the whole surface
    let img = image::open(&vectors[0].path).unwrap().to_rgb8();
    assert_eq!(img.get_pixel(50, 40).0, [0, 0, 0]);

    // top-left page space: y = 792 - 680
    let bbox = vectors[0].bbox.unwrap();
    assert_eq!((bbox.min_x, bbox.min_y), (72.0, 112.0));

    assert_eq!(output.stats.vector_images, 2);
    assert_eq!(output.stats.drawings, 2);
    assert_eq!(output.metadata.title.as_deref(), Some("Extraction fixture"));
}

#[test]
fn background_scale_drawing_never_absorbs_small_strokes() {
    let mut ops = vec![op("rg", &[0.9, 0.9, 1.0])];
    ops.extend(filled_rect(0.0, 0.0, 900.0, 900.0));
    ops.extend(stroked_line(100.0, 100.0, 150.0, 100.0));
    ops.extend(stroked_line(500.0, 500.0, 550.0, 500.0));
    ops.extend(stroked_line(100.0, 800.0, 150.0, 800.0));
    let mut page = TestPage::new(ops);
    page.media_box = [0, 0, 1000, 1000];
    let pdf = build_pdf(vec![page], no_extra);
    let dir = tempfile::tempdir().unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());

    let sizes: Vec<(u32, u32)> = output.pages[0]
        .vector_images()
        .map(|i| (i.width, i.height))
        .collect();
    // background first, then each stroke alone, floored to 10 px tall
    assert_eq!(sizes, vec![(900, 900), (50, 10), (50, 10), (50, 10)]);
}

#[test]
fn cmyk_image_is_written_as_rgb_with_native_dimensions() {
    let pdf = build_pdf(
        vec![TestPage::new(place_image(100.0, 500.0, 40.0, 30.0))],
        cmyk_image,
    );
    let dir = tempfile::tempdir().unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());

    let page = &output.pages[0];
    assert_eq!(page.images.len(), 1);
    let raster = &page.images[0];
    assert_eq!(raster.kind, ImageKind::Raster);
    assert_eq!(raster.image_id, "0/raster/0");
    assert_eq!((raster.width, raster.height), (4, 3));

    let decoded = image::open(&raster.path).unwrap();
    assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    let rgb = decoded.to_rgb8();
    assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    assert_eq!(rgb.get_pixel(1, 0).0, [0, 255, 255]);
    assert_eq!(rgb.get_pixel(2, 0).0, [0, 0, 0]);

    let bbox = raster.bbox.unwrap();
    assert_eq!((bbox.width(), bbox.height()), (40.0, 30.0));
    assert!(raster.chart_path.as_ref().is_some_and(|p| p.exists()));
}

#[test]
fn flate_compressed_cmyk_image_is_decoded() {
    let pdf = build_pdf(
        vec![TestPage::new(place_image(100.0, 500.0, 40.0, 30.0))],
        flate_cmyk_image,
    );
    let dir = tempfile::tempdir().unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());

    let page = &output.pages[0];
    assert!(page.errors.is_empty(), "{:?}", page.errors);
    assert_eq!(page.images.len(), 1);
    let raster = &page.images[0];
    assert_eq!(raster.kind, ImageKind::Raster);
    assert_eq!((raster.width, raster.height), (4, 3));

    let rgb = image::open(&raster.path).unwrap().to_rgb8();
    assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    assert_eq!(rgb.get_pixel(1, 0).0, [0, 255, 255]);
    assert_eq!(rgb.get_pixel(2, 0).0, [0, 0, 0]);
    assert_eq!(rgb.get_pixel(3, 2).0, [0, 0, 0]);
}

#[test]
fn renderer_decodes_images_lopdf_cannot() {
    let pdf = build_pdf(
        vec![TestPage::new(place_image(100.0, 500.0, 40.0, 30.0))],
        jpx_image,
    );
    let dir = tempfile::tempdir().unwrap();

    // without renderer support the image is reported, not dropped silently
    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());
    assert!(output.pages[0].images.is_empty());
    assert_eq!(output.pages[0].errors.len(), 1);
    assert!(output.pages[0].errors[0].to_string().contains("JPX"));

    let decoded = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([10, 200, 30])));
    let config = ExtractionConfig::builder()
        .zoom(1.0)
        .renderer(Arc::new(EmbeddingRenderer { images: vec![decoded] }))
        .build()
        .unwrap();
    let output = run(&pdf, PageRange::all(), dir.path(), &config);

    let page = &output.pages[0];
    assert!(page.errors.is_empty(), "{:?}", page.errors);
    assert_eq!(page.images.len(), 1);
    assert_eq!((page.images[0].width, page.images[0].height), (4, 3));
    let rgb = image::open(&page.images[0].path).unwrap().to_rgb8();
    assert_eq!(rgb.get_pixel(2, 1).0, [10, 200, 30]);
}

#[test]
fn image_ids_are_unique_and_rasters_come_first() {
    // the drawing is emitted before the image but is listed after it
    let mut ops = filled_rect(300.0, 300.0, 50.0, 50.0);
    ops.extend(place_image(100.0, 500.0, 40.0, 30.0));
    ops.extend(place_image(100.0, 100.0, 40.0, 30.0));
    let pdf = build_pdf(vec![TestPage::new(ops)], cmyk_image);
    let dir = tempfile::tempdir().unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());

    let ids: Vec<&str> = output.pages[0].images.iter().map(|i| i.image_id.as_str()).collect();
    assert_eq!(ids, vec!["0/raster/0", "0/raster/1", "0/vector/2"]);
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(dir.path().join("page-0000/vector-002.png").exists());
    assert!(dir.path().join("page-0000/vector-002-chart.png").exists());
}

#[test]
fn page_without_drawings_has_no_vector_images() {
    let pdf = build_pdf(vec![TestPage::new(vec![])], no_extra);
    let dir = tempfile::tempdir().unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &stub_config());

    assert!(output.pages[0].images.is_empty());
    assert!(output.pages[0].full_page_path.exists());
    let full = image::open(&output.pages[0].full_page_path).unwrap();
    assert_eq!((full.width(), full.height()), (612, 792));
}

#[test]
fn reruns_write_identical_bytes() {
    let mut ops = filled_rect(72.0, 600.0, 100.0, 80.0);
    ops.extend(vec![op("RG", &[1.0, 0.0, 0.0]), op("w", &[3.0])]);
    ops.extend(vec![
        op("m", &[200.0, 200.0]),
        op("c", &[250.0, 300.0, 300.0, 100.0, 350.0, 200.0]),
        op("S", &[]),
    ]);
    ops.extend(place_image(400.0, 400.0, 40.0, 30.0));
    let pdf = build_pdf(vec![TestPage::new(ops.clone()), TestPage::new(ops)], cmyk_image);
    let config = stub_config();

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let a = run(&pdf, PageRange::all(), first.path(), &config);
    let b = run(&pdf, PageRange::all(), second.path(), &config);

    assert_eq!(snapshot(first.path()), snapshot(second.path()));
    assert_eq!(a.pages.len(), b.pages.len());

    // overwrite in place
    run(&pdf, PageRange::all(), first.path(), &config);
    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

#[test]
fn page_range_is_half_open_and_validated() {
    let pages = (0..3).map(|_| TestPage::new(filled_rect(10.0, 10.0, 20.0, 20.0))).collect();
    let pdf = build_pdf(pages, no_extra);
    let dir = tempfile::tempdir().unwrap();
    let config = stub_config();

    let output = run(&pdf, PageRange::new(1, 3), dir.path(), &config);
    let indices: Vec<usize> = output.pages.iter().map(|p| p.page_index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert!(dir.path().join("page-0001/full.png").exists());
    assert!(!dir.path().join("page-0000").exists());

    let empty = run(&pdf, PageRange::new(2, 2), dir.path(), &config);
    assert!(empty.pages.is_empty());

    let err = extract_blocking(&pdf, "fixture.pdf", &PageRange::new(1, 5), dir.path(), &config)
        .unwrap_err();
    assert!(matches!(err, ExtractError::PageRange { start: 1, end: 5, total: 3 }));

    let err = extract_blocking(&pdf, "fixture.pdf", &PageRange::new(2, 1), dir.path(), &config)
        .unwrap_err();
    assert!(matches!(err, ExtractError::PageRange { .. }));
}

#[test]
fn corrupt_documents_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = stub_config();

    let err = extract_blocking(b"%PDF-1.4\nnot really", "bad.pdf", &PageRange::all(), dir.path(), &config)
        .unwrap_err();
    assert!(matches!(err, ExtractError::DocumentOpen { .. }), "got {err:?}");

    let err = extract_blocking(b"<html>", "page.html", &PageRange::all(), dir.path(), &config)
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotAPdf { .. }), "got {err:?}");
}

#[test]
fn output_dir_that_is_a_file_fails_before_any_page() {
    let pdf = build_pdf(vec![TestPage::new(filled_rect(10.0, 10.0, 20.0, 20.0))], no_extra);
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("out");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = extract_blocking(&pdf, "fixture.pdf", &PageRange::all(), &blocker, &stub_config())
        .unwrap_err();

    match err {
        ExtractError::WriteFailed { path, .. } => assert_eq!(path, blocker),
        other => panic!("expected WriteFailed, got {other:?}"),
    }
    assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
    assert_eq!(snapshot(dir.path()).len(), 1);
}

#[test]
fn renderer_that_drops_pages_is_an_error() {
    let pages = (0..2).map(|_| TestPage::new(vec![])).collect();
    let pdf = build_pdf(pages, no_extra);
    let dir = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::builder()
        .renderer(Arc::new(ForgetfulRenderer))
        .build()
        .unwrap();

    let err = extract_blocking(&pdf, "fixture.pdf", &PageRange::all(), dir.path(), &config)
        .unwrap_err();
    assert!(matches!(err, ExtractError::Internal(_)), "got {err:?}");
}

#[test]
fn progress_callback_sees_every_page() {
    #[derive(Default)]
    struct Recorder {
        started: AtomicUsize,
        completed: Mutex<Vec<(usize, usize)>>,
        finished: AtomicUsize,
    }

    impl ExtractionProgressCallback for Recorder {
        fn on_extraction_start(&self, total_pages: usize) {
            self.started.store(total_pages, Ordering::SeqCst);
        }
        fn on_page_complete(&self, page_index: usize, _total: usize, image_count: usize) {
            self.completed.lock().unwrap().push((page_index, image_count));
        }
        fn on_extraction_complete(&self, _total_pages: usize, image_count: usize) {
            self.finished.store(image_count, Ordering::SeqCst);
        }
    }

    let pages = vec![
        TestPage::new(filled_rect(10.0, 10.0, 20.0, 20.0)),
        TestPage::new(vec![]),
    ];
    let pdf = build_pdf(pages, no_extra);
    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = ExtractionConfig::builder()
        .renderer(Arc::new(StubRenderer::default()))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    run(&pdf, PageRange::all(), dir.path(), &config);

    assert_eq!(recorder.started.load(Ordering::SeqCst), 2);
    assert_eq!(*recorder.completed.lock().unwrap(), vec![(0, 1), (1, 0)]);
    assert_eq!(recorder.finished.load(Ordering::SeqCst), 1);
}

#[test]
fn cache_is_primed_and_feeds_downstream_helpers() {
    let pdf = build_pdf(
        vec![TestPage::new(filled_rect(100.0, 100.0, 80.0, 40.0))],
        no_extra,
    );
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(FileContentCache::default());
    let config = ExtractionConfig::builder()
        .zoom(1.0)
        .renderer(Arc::new(StubRenderer::default()))
        .cache(cache.clone())
        .build()
        .unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &config);

    // full.png + vector PNG + chart
    assert_eq!(cache.len(), 3);
    let vector = &output.pages[0].images[0];
    let encoded = vector.encode(Some(&*cache)).unwrap();
    assert_eq!(encoded.mime_type, "image/png");
    assert!(!encoded.data.is_empty());

    let dest = dir.path().join("crop.png");
    let dims = recrop(Some(&*cache), vector, PixelRect::new(10, 10, 30, 20), &dest).unwrap();
    assert_eq!(dims, (30, 20));
    assert!(cache.get(&dest).is_some());
}

#[test]
fn inspect_reads_metadata_only() {
    let pdf = build_pdf((0..4).map(|_| TestPage::new(vec![])).collect(), no_extra);
    let meta = inspect_bytes(&pdf, "fixture.pdf").unwrap();
    assert_eq!(meta.page_count, 4);
    assert_eq!(meta.pdf_version, "1.7");
    assert_eq!(meta.source_name, "fixture.pdf");
}

#[tokio::test]
async fn async_entry_points_match_blocking_core() {
    let pdf = build_pdf(
        vec![TestPage::new(filled_rect(100.0, 100.0, 80.0, 40.0))],
        no_extra,
    );
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.pdf");
    std::fs::write(&input, &pdf).unwrap();
    let config = stub_config();

    let from_path = extract(input.to_str().unwrap(), &PageRange::all(), dir.path().join("a"), &config)
        .await
        .unwrap();
    let from_bytes = extract_bytes(pdf, "doc.pdf", &PageRange::all(), dir.path().join("b"), &config)
        .await
        .unwrap();

    assert_eq!(from_path.metadata.source_name, "doc.pdf");
    assert_eq!(from_path.stats.vector_images, 1);
    assert_eq!(from_bytes.stats.vector_images, 1);
    assert_eq!(
        snapshot(&dir.path().join("a")),
        snapshot(&dir.path().join("b"))
    );

    let missing = extract("/no/such/file.pdf", &PageRange::all(), dir.path(), &config)
        .await
        .unwrap_err();
    assert!(matches!(missing, ExtractError::FileNotFound { .. }));
}

// ── pdfium-backed (skips without a cached library) ───────────────────────────

#[test]
fn pdfium_renders_full_pages_at_zoom() {
    let lib = skip_unless_pdfium!();
    let pdf = build_pdf(
        vec![TestPage::new(filled_rect(72.0, 600.0, 100.0, 80.0))],
        no_extra,
    );
    let dir = tempfile::tempdir().unwrap();
    let config = ExtractionConfig::builder()
        .zoom(2.0)
        .renderer(Arc::new(PdfiumRenderer::with_library(lib)))
        .build()
        .unwrap();

    let output = run(&pdf, PageRange::all(), dir.path(), &config);

    let full = image::open(&output.pages[0].full_page_path).unwrap();
    assert!((1222..=1226).contains(&full.width()), "width {}", full.width());
    assert!((1582..=1586).contains(&full.height()), "height {}", full.height());
    assert_eq!(output.pages[0].vector_images().count(), 1);
}
