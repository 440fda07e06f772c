//! Image XObject geometry, component count and mask reference.

use crate::codec::filters::{FilterChain, RowLayout};
use crate::document::catalog::ObjectCatalog;
use crate::document::dict::{array_items, find_entry, parse_dict_entries};
use crate::error::{PdfError, Result};
use crate::parser::lexer::Token;

/// Component count assumed when `/ColorSpace` says nothing usable.
pub const DEFAULT_COMPONENTS: u32 = 3;

/// What an image object declares about itself. Derived fresh per read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub objid: u32,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    pub components: u32,
    pub filters: FilterChain,
    /// `/SMask`, else `/Mask`, when given as a reference.
    pub mask: Option<u32>,
}

impl ImageDescriptor {
    /// Read the descriptor of image object `objid`.
    ///
    /// `Ok(None)` when the object is absent, has no stream, or lacks any of
    /// `/Width`, `/Height`, `/BitsPerComponent`. A geometry entry that is
    /// present but not a positive integer is an error.
    pub fn read(catalog: &ObjectCatalog, objid: u32) -> Result<Option<Self>> {
        let Some(obj) = catalog.get(objid) else {
            tracing::debug!(objid, "image object not found");
            return Ok(None);
        };
        if !obj.has_stream() {
            tracing::debug!(objid, "image object has no stream");
            return Ok(None);
        }
        let dict = obj.dict();
        let (Some(width), Some(height), Some(bits)) = (
            find_entry(dict, "Width"),
            find_entry(dict, "Height"),
            find_entry(dict, "BitsPerComponent"),
        ) else {
            tracing::debug!(objid, "image geometry incomplete, skipping");
            return Ok(None);
        };

        let width = positive("Width", &width)?;
        let height = positive("Height", &height)?;
        let bits_per_component = positive("BitsPerComponent", &bits)?;

        let mask = ["SMask", "Mask"]
            .iter()
            .find_map(|key| find_entry(dict, key)?.as_reference())
            .map(|r| r.objid);

        Ok(Some(Self {
            objid,
            width,
            height,
            bits_per_component,
            components: infer_components(catalog, dict),
            filters: FilterChain::read(catalog, dict),
            mask,
        }))
    }

    /// Predictor fallbacks for this image's stream.
    pub fn layout(&self) -> RowLayout {
        RowLayout {
            colors: self.components as usize,
            columns: self.width as usize,
            bits_per_component: self.bits_per_component,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn positive(key: &str, token: &Token<'_>) -> Result<u32> {
    token
        .as_int()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| v > 0)
        .ok_or_else(|| PdfError::InvalidValue {
            key: key.to_string(),
            value: token.to_string(),
        })
}

/// Samples per pixel implied by an image dictionary's `/ColorSpace`.
///
/// Handles device names and their abbreviations, references to colour
/// space arrays or dictionaries, and inline arrays. ICC profiles report
/// their `/N`. Anything unrecognised counts as
/// [`DEFAULT_COMPONENTS`].
pub fn infer_components(catalog: &ObjectCatalog, dict: &[u8]) -> u32 {
    let Some(token) = find_entry(dict, "ColorSpace") else {
        return DEFAULT_COMPONENTS;
    };
    colorspace_components(catalog, &token).unwrap_or(DEFAULT_COMPONENTS)
}

fn colorspace_components(catalog: &ObjectCatalog, token: &Token<'_>) -> Option<u32> {
    match *token {
        Token::Word(_) => name_components(token.as_name()?),
        Token::Array(span) => array_components(catalog, span),
        Token::Ref(r) => {
            let target = catalog.dict_of(r.objid)?;
            if target.starts_with(b"[") {
                array_components(catalog, target)
            } else {
                n_entry(target)
            }
        }
        _ => None,
    }
}

fn name_components(name: &str) -> Option<u32> {
    match name {
        "DeviceGray" | "G" | "CalGray" | "Indexed" | "I" | "Separation" | "Pattern" => Some(1),
        "DeviceRGB" | "RGB" | "CalRGB" | "Lab" => Some(3),
        "DeviceCMYK" | "CMYK" => Some(4),
        _ => None,
    }
}

fn array_components(catalog: &ObjectCatalog, span: &[u8]) -> Option<u32> {
    let items = array_items(span);
    let family = items.first()?.as_name()?;
    match family {
        "ICCBased" => {
            let stream_dict = catalog.resolve_dict(items.get(1)?)?;
            n_entry(stream_dict)
        }
        "DeviceN" => match items.get(1)? {
            Token::Array(names) => u32::try_from(array_items(names).len()).ok(),
            _ => None,
        },
        other => name_components(other),
    }
}

fn n_entry(dict: &[u8]) -> Option<u32> {
    parse_dict_entries(dict)
        .get("N")?
        .as_int()
        .and_then(|n| u32::try_from(n).ok())
}
