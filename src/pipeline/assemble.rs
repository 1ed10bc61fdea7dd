//! Per-page assembly: full raster, embedded images, vector clusters.
//!
//! ```text
//! page-0003/
//!   full.png
//!   raster-000.png   raster-000-chart.png
//!   vector-001.png   vector-001-chart.png
//! ```
//!
//! Raster and vector images share one sequence counter per page, raster
//! images first, so file names and IDs never collide and the ordering of
//! [`Page::images`] can be read straight off the sequence numbers.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::geometry::BoundingBox;
use crate::output::{Image, ImageKind, Page};
use crate::pipeline::chart::chart_variant;
use crate::pipeline::cluster::cluster_drawings;
use crate::pipeline::content::interpret_page;
use crate::pipeline::encode::{png_bytes, write_png};
use crate::pipeline::images::extract_page_images;
use crate::pipeline::rasterize::rasterize_cluster;
use crate::pipeline::render::EmbeddedImages;
use image::{DynamicImage, RgbImage};
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output directory for one page.
pub fn page_dir(out_dir: &Path, page_index: usize) -> PathBuf {
    out_dir.join(format!("page-{:04}", page_index))
}

/// A finished page plus counters that do not belong on [`Page`].
#[derive(Debug)]
pub struct AssembledPage {
    pub page: Page,
    pub drawing_count: usize,
}

/// Produce every artefact for one page and return its [`Page`].
///
/// `full_page` is the renderer's bitmap of the whole page and `embedded`
/// decodes images whose codec only the renderer handles. Any write failure
/// aborts the page; decode problems are recorded on the page instead.
pub fn assemble_page(
    doc: &Document,
    page_index: usize,
    page_id: ObjectId,
    full_page: DynamicImage,
    embedded: &mut dyn EmbeddedImages,
    out_dir: &Path,
    config: &ExtractionConfig,
) -> Result<AssembledPage, ExtractError> {
    let dir = page_dir(out_dir, page_index);
    let cache = config.cache_ref();

    let full_page_path = dir.join("full.png");
    write_png(&full_page_path, &png_bytes(&full_page.to_rgb8())?, cache)?;

    let content = interpret_page(doc, page_index, page_id);
    let mut errors = content.errors.clone();

    let (rasters, image_errors) = extract_page_images(doc, page_index, &content.images, embedded);
    errors.extend(image_errors);

    let mut writer = ImageWriter {
        dir: &dir,
        page_index,
        next_sequence: 0,
        config,
    };
    let mut images = Vec::with_capacity(rasters.len());

    for raster in &rasters {
        images.push(writer.write(ImageKind::Raster, &raster.pixels, raster.placement.bbox)?);
    }

    let clusters = cluster_drawings(&content.drawings, &config.cluster_params());
    debug!(
        "Page {}: {} drawings → {} clusters",
        page_index,
        content.drawings.len(),
        clusters.len()
    );
    for cluster in &clusters {
        let raster = rasterize_cluster(cluster, &content.drawings);
        images.push(writer.write(ImageKind::Vector, &raster.pixels, cluster.bbox)?);
    }

    info!(
        "Page {}: {} raster + {} vector images, {} warnings",
        page_index,
        rasters.len(),
        clusters.len(),
        errors.len()
    );

    Ok(AssembledPage {
        page: Page {
            page_index,
            full_page_path,
            width_pt: content.width,
            height_pt: content.height,
            images,
            errors,
        },
        drawing_count: content.drawings.len(),
    })
}

/// Writes images for one page and hands out sequence numbers.
struct ImageWriter<'a> {
    dir: &'a Path,
    page_index: usize,
    next_sequence: usize,
    config: &'a ExtractionConfig,
}

impl ImageWriter<'_> {
    fn write(
        &mut self,
        kind: ImageKind,
        pixels: &RgbImage,
        bbox: BoundingBox,
    ) -> Result<Image, ExtractError> {
        let sequence = self.next_sequence;
        let stem = format!("{}-{:03}", kind.as_str(), sequence);
        let cache = self.config.cache_ref();

        let path = self.dir.join(format!("{stem}.png"));
        write_png(&path, &png_bytes(pixels)?, cache)?;

        let chart_path = if self.config.write_charts {
            let chart = chart_variant(pixels, self.config.chart_density);
            let chart_path = self.dir.join(format!("{stem}-chart.png"));
            write_png(&chart_path, &png_bytes(&chart)?, cache)?;
            Some(chart_path)
        } else {
            None
        };

        // only a fully written image consumes a sequence number
        self.next_sequence += 1;

        Ok(Image {
            image_id: format!("{}/{}/{}", self.page_index, kind.as_str(), sequence),
            page_index: self.page_index,
            sequence,
            kind,
            path,
            chart_path,
            width: pixels.width(),
            height: pixels.height(),
            bbox: Some(bbox),
        })
    }
}
