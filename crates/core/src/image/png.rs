//! Minimal PNG serializer.
//!
//! Output is always 8 bits per channel with one `IHDR`, one `IDAT` and one
//! `IEND` chunk. Every scanline uses row filter 0; no ancillary chunks are
//! written.

use crate::codec::flate::flate_encode;
use crate::error::{PdfError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::fs;
use std::path::Path;

pub const PNG_SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

/// PNG colour types this serializer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
    Gray = 0,
    Rgb = 2,
    GrayAlpha = 4,
    Rgba = 6,
}

impl ColorType {
    /// Colour type for a base raster of `components` samples per pixel,
    /// with or without a separate alpha mask.
    pub fn select(components: u32, has_mask: bool) -> Result<Self> {
        match (components, has_mask) {
            (1, false) => Ok(Self::Gray),
            (1, true) => Ok(Self::GrayAlpha),
            (3, false) => Ok(Self::Rgb),
            (3, true) => Ok(Self::Rgba),
            (other, _) => Err(PdfError::UnsupportedComponents(other)),
        }
    }

    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Encode a raster (and optional single-channel mask) as PNG bytes.
///
/// `raster` must hold at least `width * height * components` bytes; extra
/// trailing bytes are ignored. `mask` must hold exactly `width * height`.
pub fn encode_png(
    width: u32,
    height: u32,
    raster: &[u8],
    components: u32,
    mask: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let color_type = ColorType::select(components, mask.is_some())?;
    if width == 0 || height == 0 {
        return Err(PdfError::InvalidValue {
            key: if width == 0 { "Width" } else { "Height" }.to_string(),
            value: "0".to_string(),
        });
    }
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| PdfError::dimensions((width, height), (0, 0)))?;
    let base_len = pixels
        .checked_mul(components as usize)
        .ok_or_else(|| PdfError::dimensions((width, height), (0, 0)))?;
    if raster.len() < base_len {
        return Err(PdfError::length(base_len, raster.len()));
    }
    let raster = &raster[..base_len];

    let payload = match mask {
        None => raster.to_vec(),
        Some(mask) => {
            if mask.len() != pixels {
                return Err(PdfError::length(pixels, mask.len()));
            }
            interleave_alpha(raster, mask, components as usize)
        }
    };

    let stride = (width as usize)
        .checked_mul(color_type.channels())
        .ok_or_else(|| PdfError::dimensions((width, height), (0, 0)))?;
    let mut rows = Vec::with_capacity(payload.len() + height as usize);
    for row in payload.chunks_exact(stride) {
        rows.push(0);
        rows.extend_from_slice(row);
    }
    let compressed = flate_encode(&rows)?;

    let mut ihdr = Vec::with_capacity(13);
    ihdr.write_u32::<BigEndian>(width)?;
    ihdr.write_u32::<BigEndian>(height)?;
    ihdr.extend_from_slice(&[8, color_type as u8, 0, 0, 0]);

    let mut png = Vec::with_capacity(compressed.len() + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr)?;
    write_chunk(&mut png, b"IDAT", &compressed)?;
    write_chunk(&mut png, b"IEND", &[])?;
    Ok(png)
}

/// Encode and write a PNG, creating the parent directory if needed.
///
/// Nothing is written when encoding fails.
pub fn write_png(
    path: &Path,
    width: u32,
    height: u32,
    raster: &[u8],
    components: u32,
    mask: Option<&[u8]>,
) -> Result<()> {
    let png = encode_png(width, height, raster, components, mask)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, png)?;
    tracing::debug!(path = %path.display(), width, height, components, alpha = mask.is_some(), "png written");
    Ok(())
}

fn interleave_alpha(raster: &[u8], mask: &[u8], components: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(mask.len() * (components + 1));
    for (pixel, &alpha) in raster.chunks_exact(components).zip(mask) {
        out.extend_from_slice(pixel);
        out.push(alpha);
    }
    out
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| PdfError::length(u32::MAX as usize, data.len()))?;
    out.write_u32::<BigEndian>(len)?;
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = flate2::Crc::new();
    crc.update(kind);
    crc.update(data);
    out.write_u32::<BigEndian>(crc.sum())?;
    Ok(())
}
