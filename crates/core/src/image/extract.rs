//! Image reconstruction: one image object in, one PNG file out.
//!
//! The base stream must be exactly `[FlateDecode]` or exactly
//! `[DCTDecode]`. Flate images are decoded here and serialized with
//! [`write_png`]; DCT images go to a [`JpegCodec`] together with the
//! decoded mask, if any. Masks are decoded one level deep only: the mask
//! path has no mask of its own.

use super::descriptor::ImageDescriptor;
use super::external::JpegCodec;
use super::png::write_png;
use crate::codec::filters::{DecodedStream, Filter, FilterChain, RowLayout, decode};
use crate::config::ExtractOptions;
use crate::document::catalog::ObjectCatalog;
use crate::error::{PdfError, Result};
use std::fs;
use std::path::Path;

/// Decoded single-channel mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Extracts images from one catalog. Holds only shared references, so one
/// extractor can serve many threads.
pub struct ImageExtractor<'a> {
    catalog: &'a ObjectCatalog,
    options: &'a ExtractOptions,
    codec: &'a dyn JpegCodec,
}

impl<'a> ImageExtractor<'a> {
    pub fn new(
        catalog: &'a ObjectCatalog,
        options: &'a ExtractOptions,
        codec: &'a dyn JpegCodec,
    ) -> Self {
        Self {
            catalog,
            options,
            codec,
        }
    }

    /// Extract image `objid` to `output`.
    ///
    /// Returns the descriptor of the written image, or `None` when the
    /// object is not an extractable image (see [`ImageDescriptor::read`]).
    /// On error nothing is written at `output`.
    pub fn extract(&self, objid: u32, output: &Path) -> Result<Option<ImageDescriptor>> {
        let Some(desc) = ImageDescriptor::read(self.catalog, objid)? else {
            tracing::warn!(objid, "not an extractable image, skipped");
            return Ok(None);
        };
        let filter = single_filter(&desc.filters)?;
        let mask = match desc.mask {
            Some(mask_id) => self.decode_mask(mask_id)?,
            None => None,
        };
        if let Some(mask) = &mask
            && (mask.width, mask.height) != desc.dimensions()
        {
            return Err(PdfError::dimensions(desc.dimensions(), (mask.width, mask.height)));
        }

        let raw = self.stream(objid)?;
        match filter {
            Filter::FlateDecode => {
                let pixels = self.decode_raw(raw, &desc.filters, desc.layout())?;
                write_png(
                    output,
                    desc.width,
                    desc.height,
                    &pixels,
                    desc.components,
                    mask.as_ref().map(|m| m.data.as_slice()),
                )?;
            }
            Filter::DCTDecode => self.compose_jpeg(&desc, raw, mask.as_ref(), output)?,
        }
        tracing::debug!(
            objid,
            width = desc.width,
            height = desc.height,
            filter = ?filter,
            masked = mask.is_some(),
            "image extracted"
        );
        Ok(Some(desc))
    }

    /// Decode a mask image to one byte per pixel.
    ///
    /// A mask object that is missing or lacks geometry yields `None`, and
    /// the base image is written without alpha.
    pub fn decode_mask(&self, objid: u32) -> Result<Option<MaskRaster>> {
        let Some(desc) = ImageDescriptor::read(self.catalog, objid)? else {
            tracing::warn!(mask = objid, "mask object unusable, ignoring");
            return Ok(None);
        };
        match single_filter(&desc.filters)? {
            Filter::FlateDecode => {
                let layout = RowLayout {
                    colors: 1,
                    ..desc.layout()
                };
                let data = self.decode_raw(self.stream(objid)?, &desc.filters, layout)?;
                Ok(Some(MaskRaster {
                    width: desc.width,
                    height: desc.height,
                    data,
                }))
            }
            // the codec's PNG output is not decodable in-process
            Filter::DCTDecode => Err(PdfError::UnsupportedFilter(desc.filters.names)),
        }
    }

    fn stream(&self, objid: u32) -> Result<&'a [u8]> {
        self.catalog
            .get(objid)
            .and_then(|obj| obj.stream())
            .ok_or(PdfError::ObjectNotFound(objid))
    }

    fn decode_raw(&self, raw: &[u8], chain: &FilterChain, layout: RowLayout) -> Result<Vec<u8>> {
        match decode(raw, chain, layout, self.options.max_decoded_bytes)? {
            DecodedStream::Raw(data) => Ok(data),
            DecodedStream::Dct(_) => Err(PdfError::UnsupportedFilter(chain.names.clone())),
        }
    }

    fn compose_jpeg(
        &self,
        desc: &ImageDescriptor,
        jpeg: &[u8],
        mask: Option<&MaskRaster>,
        output: &Path,
    ) -> Result<()> {
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let scratch = tempfile::TempDir::new_in(parent)?;

        let jpeg_path = scratch.path().join("base.jpg");
        fs::write(&jpeg_path, jpeg)?;
        let mask_path = match mask {
            Some(mask) => {
                let path = scratch.path().join("mask.png");
                write_png(&path, mask.width, mask.height, &mask.data, 1, None)?;
                Some(path)
            }
            None => None,
        };

        tracing::debug!(objid = desc.objid, masked = mask_path.is_some(), "handing JPEG to codec");
        self.codec.compose(&jpeg_path, mask_path.as_deref(), output)
    }
}

/// The base filter chain must be a single supported filter.
fn single_filter(chain: &FilterChain) -> Result<Filter> {
    match chain.names.as_slice() {
        [name] => Filter::from_name(name).ok_or_else(|| PdfError::UnsupportedFilter(chain.names.clone())),
        _ => Err(PdfError::UnsupportedFilter(chain.names.clone())),
    }
}
