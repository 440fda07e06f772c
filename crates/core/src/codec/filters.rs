//! `/Filter` chain dispatch.
//!
//! Supported chains are empty, a lone `FlateDecode` (optionally with a PNG
//! predictor), and a lone `DCTDecode`. DCT payloads are never decoded here;
//! they are handed back verbatim for an external codec.

use super::flate::flate_decode;
use super::predictor::apply_png_predictor;
use crate::document::catalog::ObjectCatalog;
use crate::document::dict::{array_items, find_entry, parse_dict_entries, parse_filters};
use crate::error::{PdfError, Result};
use crate::parser::lexer::Token;

/// A stream filter this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    FlateDecode,
    DCTDecode,
}

impl Filter {
    /// Map a filter name, full or abbreviated, without its `/`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FlateDecode" | "Fl" => Some(Self::FlateDecode),
            "DCTDecode" | "DCT" => Some(Self::DCTDecode),
            _ => None,
        }
    }
}

/// Predictor parameters from a `/DecodeParms` dictionary.
///
/// Missing entries stay `None`; [`RowLayout`] supplies the fallbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeParms {
    pub predictor: Option<i64>,
    pub colors: Option<i64>,
    pub columns: Option<i64>,
    pub bits_per_component: Option<i64>,
}

impl DecodeParms {
    pub fn from_dict(dict: &[u8]) -> Self {
        let entries = parse_dict_entries(dict);
        let int = |key: &str| entries.get(key).and_then(Token::as_int);
        Self {
            predictor: int("Predictor"),
            colors: int("Colors"),
            columns: int("Columns"),
            bits_per_component: int("BitsPerComponent"),
        }
    }
}

/// Row geometry used when `/DecodeParms` leaves it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub colors: usize,
    pub columns: usize,
    pub bits_per_component: u32,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            colors: 1,
            columns: 1,
            bits_per_component: 8,
        }
    }
}

/// Filter names of a stream plus the parameters that go with its
/// `FlateDecode` stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    pub names: Vec<String>,
    pub parms: Option<DecodeParms>,
}

impl FilterChain {
    /// Read `/Filter` and `/DecodeParms` from a stream dictionary.
    ///
    /// `/DecodeParms` may be a dictionary, a reference to one, or an array
    /// parallel to the filter array.
    pub fn read(catalog: &ObjectCatalog, dict: &[u8]) -> Self {
        let names = parse_filters(find_entry(dict, "Filter").as_ref());
        let parms = find_entry(dict, "DecodeParms").and_then(|token| match token {
            Token::Array(span) => {
                let index = names
                    .iter()
                    .position(|n| Filter::from_name(n) == Some(Filter::FlateDecode))
                    .unwrap_or(0);
                let items = array_items(span);
                let item = items.get(index)?;
                catalog.resolve_dict(item).map(DecodeParms::from_dict)
            }
            other => catalog.resolve_dict(&other).map(DecodeParms::from_dict),
        });
        Self { names, parms }
    }

    fn parsed(&self) -> Result<Vec<Filter>> {
        self.names
            .iter()
            .map(|n| Filter::from_name(n))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PdfError::UnsupportedFilter(self.names.clone()))
    }
}

/// Output of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedStream {
    /// Samples ready for use.
    Raw(Vec<u8>),
    /// A JPEG bitstream, undecoded.
    Dct(Vec<u8>),
}

/// Run a stream through its filter chain.
///
/// Supported chains: `[]`, `[FlateDecode]` and `[DCTDecode]`. Anything
/// else, including an unknown name or a multi-filter chain, is
/// `UnsupportedFilter`.
pub fn decode(
    raw: &[u8],
    chain: &FilterChain,
    layout: RowLayout,
    max_decoded_bytes: usize,
) -> Result<DecodedStream> {
    let inflate = |data: &[u8]| -> Result<Vec<u8>> {
        let inflated = flate_decode(data, Some(max_decoded_bytes))?;
        unpredict(inflated, chain.parms.as_ref(), layout)
    };
    match chain.parsed()?.as_slice() {
        [] => Ok(DecodedStream::Raw(raw.to_vec())),
        [Filter::FlateDecode] => Ok(DecodedStream::Raw(inflate(raw)?)),
        [Filter::DCTDecode] => Ok(DecodedStream::Dct(raw.to_vec())),
        _ => Err(PdfError::UnsupportedFilter(chain.names.clone())),
    }
}

fn unpredict(data: Vec<u8>, parms: Option<&DecodeParms>, layout: RowLayout) -> Result<Vec<u8>> {
    let Some(parms) = parms else { return Ok(data) };
    match parms.predictor.unwrap_or(1) {
        ..=1 => Ok(data),
        10..=15 => {
            let colors = param_usize("Colors", parms.colors, layout.colors)?;
            let columns = param_usize("Columns", parms.columns, layout.columns)?;
            let bits = match parms.bits_per_component {
                Some(b) => u32::try_from(b).map_err(|_| PdfError::UnsupportedBitDepth(0))?,
                None => layout.bits_per_component,
            };
            apply_png_predictor(&data, colors, columns, bits)
        }
        2 => Err(PdfError::UnsupportedPredictor("TIFF predictor 2".into())),
        other => Err(PdfError::UnsupportedPredictor(format!("predictor {other}"))),
    }
}

fn param_usize(key: &str, value: Option<i64>, fallback: usize) -> Result<usize> {
    match value {
        None => Ok(fallback),
        Some(v) => usize::try_from(v).map_err(|_| PdfError::InvalidValue {
            key: key.to_string(),
            value: v.to_string(),
        }),
    }
}
