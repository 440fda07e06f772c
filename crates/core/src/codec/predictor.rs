//! PNG predictor reversal (`/Predictor` 10–15).
//!
//! Every row of predicted data carries a one-byte filter type ahead of
//! `colors * columns` sample bytes. Only 8-bit samples are handled.

use crate::error::{PdfError, Result};

/// Per-row filter type of PNG-predicted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RowFilter {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl TryFrom<u8> for RowFilter {
    type Error = PdfError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Up),
            3 => Ok(Self::Average),
            4 => Ok(Self::Paeth),
            other => Err(PdfError::UnsupportedPredictor(format!(
                "PNG row filter type {other}"
            ))),
        }
    }
}

/// Undo PNG prediction.
///
/// `colors` is the number of samples per pixel, which is also the
/// left-neighbour distance in bytes at 8 bits per sample. A trailing
/// partial row is dropped. The row above the first row is all zeros.
pub fn apply_png_predictor(
    data: &[u8],
    colors: usize,
    columns: usize,
    bits_per_component: u32,
) -> Result<Vec<u8>> {
    if bits_per_component != 8 {
        return Err(PdfError::UnsupportedBitDepth(bits_per_component));
    }
    let row_bytes = colors
        .checked_mul(columns)
        .filter(|&n| n < usize::MAX)
        .ok_or_else(|| PdfError::InvalidValue {
            key: "Columns".to_string(),
            value: format!("{columns} with {colors} colors overflows a row"),
        })?;
    let bpp = colors.max(1);
    let row_size = row_bytes + 1;
    if row_size > data.len() {
        tracing::debug!(row_size, len = data.len(), "no complete predictor row");
        return Ok(Vec::new());
    }

    let mut result = Vec::with_capacity(data.len() / row_size * row_bytes);
    let mut prev_row = vec![0u8; row_bytes];
    let mut current_row = vec![0u8; row_bytes];

    for row_start in (0..data.len()).step_by(row_size) {
        if row_start + row_size > data.len() {
            tracing::debug!(
                dropped = data.len() - row_start,
                "partial predictor row dropped"
            );
            break;
        }

        let filter = RowFilter::try_from(data[row_start])?;
        let row_data = &data[row_start + 1..row_start + row_size];

        match filter {
            RowFilter::None => current_row.copy_from_slice(row_data),
            RowFilter::Sub => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(left);
                }
            }
            RowFilter::Up => {
                for i in 0..row_bytes {
                    current_row[i] = row_data[i].wrapping_add(prev_row[i]);
                }
            }
            RowFilter::Average => {
                for i in 0..row_bytes {
                    let left = if i >= bpp {
                        current_row[i - bpp] as u16
                    } else {
                        0
                    };
                    let above = prev_row[i] as u16;
                    current_row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            RowFilter::Paeth => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    let above = prev_row[i];
                    let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(paeth_predictor(left, above, upper_left));
                }
            }
        }

        result.extend_from_slice(&current_row);
        std::mem::swap(&mut prev_row, &mut current_row);
    }

    Ok(result)
}

/// The PNG Paeth predictor. Ties prefer left, then above.
pub const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let p = left as i32 + above as i32 - upper_left as i32;
    let pa = (p - left as i32).abs();
    let pb = (p - above as i32).abs();
    let pc = (p - upper_left as i32).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}
