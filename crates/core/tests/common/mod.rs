//! Shared helpers for integration tests: a tiny PDF writer, a PNG reader
//! and a PNG predictor encoder.

#![allow(dead_code)]

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Appends indirect objects to an in-memory PDF.
pub struct PdfBuilder {
    buf: Vec<u8>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec(),
        }
    }

    /// `objid 0 obj <body> endobj`
    pub fn object(mut self, objid: u32, body: &str) -> Self {
        self.buf
            .extend(format!("{objid} 0 obj\n{body}\nendobj\n").into_bytes());
        self
    }

    /// Stream object; `entries` are the dictionary entries other than
    /// `/Length`.
    pub fn stream(mut self, objid: u32, entries: &str, data: &[u8]) -> Self {
        self.buf.extend(
            format!("{objid} 0 obj\n<< {entries} /Length {} >>\nstream\n", data.len()).into_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(b"trailer\n<< /Root 1 0 R >>\nstartxref\n0\n%%EOF\n");
        self.buf
    }
}

/// A parsed PNG with its scanlines already unfiltered (all filter bytes
/// are checked to be 0).
#[derive(Debug)]
pub struct DecodedPng {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub chunk_types: Vec<String>,
    pub pixels: Vec<u8>,
}

pub fn read_png(png: &[u8]) -> DecodedPng {
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n", "PNG signature");
    let mut pos = 8;
    let mut chunk_types = Vec::new();
    let mut ihdr = Vec::new();
    let mut idat = Vec::new();
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind = &png[pos + 4..pos + 8];
        let data = &png[pos + 8..pos + 8 + len];
        let stored = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        let mut crc = flate2::Crc::new();
        crc.update(kind);
        crc.update(data);
        assert_eq!(crc.sum(), stored, "CRC of {}", String::from_utf8_lossy(kind));
        match kind {
            b"IHDR" => ihdr = data.to_vec(),
            b"IDAT" => idat.extend_from_slice(data),
            _ => {}
        }
        chunk_types.push(String::from_utf8_lossy(kind).into_owned());
        pos += 12 + len;
    }

    let width = u32::from_be_bytes(ihdr[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(ihdr[4..8].try_into().unwrap());
    let color_type = ihdr[9];
    let channels = match color_type {
        0 => 1,
        2 => 3,
        4 => 2,
        6 => 4,
        other => panic!("unexpected color type {other}"),
    };
    let stride = width as usize * channels;
    let rows = inflate(&idat);
    assert_eq!(rows.len(), (stride + 1) * height as usize);
    let mut pixels = Vec::with_capacity(stride * height as usize);
    for row in rows.chunks_exact(stride + 1) {
        assert_eq!(row[0], 0, "row filter");
        pixels.extend_from_slice(&row[1..]);
    }
    DecodedPng {
        width,
        height,
        bit_depth: ihdr[8],
        color_type,
        chunk_types,
        pixels,
    }
}

/// Apply PNG prediction to `raster` (8-bit samples, `colors` per pixel),
/// using `filters[row % filters.len()]` as each row's filter type.
pub fn predict(raster: &[u8], colors: usize, columns: usize, filters: &[u8]) -> Vec<u8> {
    let row_bytes = colors * columns;
    let mut out = Vec::with_capacity(raster.len() + raster.len() / row_bytes.max(1));
    let mut prev = vec![0u8; row_bytes];
    for (y, row) in raster.chunks_exact(row_bytes).enumerate() {
        let filter = filters[y % filters.len()];
        out.push(filter);
        for i in 0..row_bytes {
            let left = if i >= colors { row[i - colors] } else { 0 };
            let up = prev[i];
            let up_left = if i >= colors { prev[i - colors] } else { 0 };
            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => panic!("filter {other}"),
            };
            out.push(row[i].wrapping_sub(predicted));
        }
        prev.copy_from_slice(row);
    }
    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let (pa, pb, pc) = ((p - a as i16).abs(), (p - b as i16).abs(), (p - c as i16).abs());
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Deterministic pseudo-random bytes.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 8) as u8
        })
        .collect()
}
