//! zlib-wrapped deflate.

use crate::error::{PdfError, Result};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Default ceiling for a single inflated stream.
pub const MAX_DECODED_BYTES: usize = 256 * 1024 * 1024;

/// Inflate `data`, failing once the output would exceed `max_len`.
///
/// Bytes after the end of the zlib stream are ignored.
pub fn flate_decode(data: &[u8], max_len: Option<usize>) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = decoder
            .read(&mut buf)
            .map_err(|e| PdfError::DecodeError(format!("FlateDecode error: {e}")))?;
        if n == 0 {
            break;
        }
        if let Some(max) = max_len
            && out.len().saturating_add(n) > max
        {
            let total = out.len() + n;
            return Err(PdfError::DecodeError(format!(
                "decoded data exceeds expected size ({total} > {max})"
            )));
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Deflate `data` into a zlib stream.
pub fn flate_encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 64), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
