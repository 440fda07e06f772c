//! Whole-document image scanning and batch extraction.

use rayon::{ThreadPool, ThreadPoolBuilder};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::ExtractOptions;
use crate::document::catalog::ObjectCatalog;
use crate::document::page::{images_on_page, list_pages};
use crate::error::Result;
use crate::image::external::{CommandCodec, JpegCodec};
use crate::image::extract::ImageExtractor;
use crate::image::writer::ImageWriter;

/// An image painted on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedImage {
    /// XObject resource name, without `/`.
    pub name: String,
    pub objid: u32,
}

/// The images one page paints, in content-stream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageImages {
    /// 1-based position in [`list_pages`] order.
    pub page: usize,
    pub page_objid: u32,
    pub images: Vec<LocatedImage>,
}

/// One PNG written by [`extract_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedImage {
    pub page: usize,
    /// 1-based position among the page's images.
    pub index: usize,
    pub name: String,
    pub objid: u32,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub components: u32,
    pub filter: String,
    pub masked: bool,
}

/// Locate every image on every page.
///
/// Pages that paint no images are left out.
pub fn scan_images(catalog: &ObjectCatalog, options: &ExtractOptions) -> Result<Vec<PageImages>> {
    let mut pages = Vec::new();
    for (idx, page_objid) in list_pages(catalog).into_iter().enumerate() {
        let images = images_on_page(catalog, page_objid, options.max_decoded_bytes)?;
        if images.is_empty() {
            continue;
        }
        pages.push(PageImages {
            page: idx + 1,
            page_objid,
            images: images
                .into_iter()
                .map(|(name, objid)| LocatedImage { name, objid })
                .collect(),
        });
    }
    tracing::debug!(pages = pages.len(), "image scan complete");
    Ok(pages)
}

/// Extract every located image into `outdir` as `p{page}_{n}.png`.
///
/// Stops at the first failing image; files already written stay on disk.
/// Images that turn out to be unextractable (no geometry) are skipped and
/// do not appear in the result.
pub fn extract_all(
    catalog: &ObjectCatalog,
    outdir: &Path,
    options: &ExtractOptions,
    codec: &dyn JpegCodec,
) -> Result<Vec<ExtractedImage>> {
    let writer = ImageWriter::new(outdir)?;
    let jobs: Vec<(usize, usize, LocatedImage)> = scan_images(catalog, options)?
        .into_iter()
        .flat_map(|page| {
            let page_no = page.page;
            page.images
                .into_iter()
                .enumerate()
                .map(move |(i, image)| (page_no, i + 1, image))
        })
        .collect();

    let extractor = ImageExtractor::new(catalog, options, codec);
    let run = |(page, index, image): &(usize, usize, LocatedImage)| -> Result<Option<ExtractedImage>> {
        let path = writer.path_for(*page, *index);
        let Some(desc) = extractor.extract(image.objid, &path)? else {
            return Ok(None);
        };
        Ok(Some(ExtractedImage {
            page: *page,
            index: *index,
            name: image.name.clone(),
            objid: image.objid,
            path,
            width: desc.width,
            height: desc.height,
            components: desc.components,
            filter: desc.filters.names.join(" "),
            masked: desc.mask.is_some(),
        }))
    };

    let results: Vec<Option<ExtractedImage>> = match worker_pool(options, jobs.len()) {
        Some(pool) => pool.install(|| jobs.par_iter().map(run).collect::<Result<Vec<_>>>())?,
        None => jobs.iter().map(run).collect::<Result<Vec<_>>>()?,
    };

    let extracted: Vec<ExtractedImage> = results.into_iter().flatten().collect();
    tracing::info!(
        images = extracted.len(),
        dir = %outdir.display(),
        "extraction complete"
    );
    Ok(extracted)
}

/// Pool for a parallel run, or `None` to extract on the calling thread.
///
/// A pool that cannot be built degrades to sequential extraction.
fn worker_pool(options: &ExtractOptions, jobs: usize) -> Option<ThreadPool> {
    if !options.is_parallel() || jobs < 2 {
        return None;
    }
    ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(1))
        .build()
        .inspect_err(|e| tracing::warn!(error = %e, "thread pool unavailable, extracting sequentially"))
        .ok()
}

/// Read a PDF from disk and extract its images into `outdir` with the
/// command-line codec configured in `options`.
pub fn extract_file(
    pdf: &Path,
    outdir: &Path,
    options: &ExtractOptions,
) -> Result<Vec<ExtractedImage>> {
    let data = std::fs::read(pdf)?;
    let catalog = ObjectCatalog::build(data);
    let codec = CommandCodec::new(options.codec.clone(), options.codec_timeout);
    extract_all(&catalog, outdir, options, &codec)
}
