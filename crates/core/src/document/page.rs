//! Page and image location.
//!
//! Pages are found by their top-level `/Type /Page` entry and reported in
//! object-number order. Images are the `/Subtype /Image` XObjects a page's
//! content stream paints with `Do`, in painting order.

use super::catalog::ObjectCatalog;
use super::dict::{array_items, has_subtype, has_type, parse_dict_entries};
use crate::codec::filters::{DecodedStream, FilterChain, RowLayout, decode};
use crate::error::{PdfError, Result};
use crate::parser::lexer::Token;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

static DO_OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)/([A-Za-z0-9_.+\-]+)\s+Do\b").unwrap());

/// How far up the page tree `/Resources` is looked for.
const MAX_INHERIT_DEPTH: usize = 32;

/// Object numbers of every page, ascending.
pub fn list_pages(catalog: &ObjectCatalog) -> Vec<u32> {
    catalog
        .objids()
        .into_iter()
        .filter(|&id| catalog.dict_of(id).is_some_and(|d| has_type(d, "Page")))
        .collect()
}

/// XObject name → object number for a page.
///
/// A page without its own `/Resources` inherits them from the nearest
/// ancestor in the page tree. Entries that are not references are skipped.
pub fn xobject_map(catalog: &ObjectCatalog, page_dict: &[u8]) -> IndexMap<String, u32> {
    let mut map = IndexMap::new();
    let Some(resources) = page_resources(catalog, page_dict) else {
        return map;
    };
    let entries = parse_dict_entries(resources);
    let Some(xobjects) = entries.get("XObject").and_then(|t| catalog.resolve_dict(t)) else {
        return map;
    };
    for (name, value) in parse_dict_entries(xobjects) {
        match value.as_reference() {
            Some(r) => {
                map.insert(name, r.objid);
            }
            None => tracing::debug!(%name, "XObject entry is not a reference"),
        }
    }
    map
}

fn page_resources<'a>(catalog: &'a ObjectCatalog, page_dict: &'a [u8]) -> Option<&'a [u8]> {
    let mut dict = page_dict;
    for _ in 0..MAX_INHERIT_DEPTH {
        let entries = parse_dict_entries(dict);
        if let Some(resources) = entries.get("Resources") {
            return catalog.resolve_dict(resources);
        }
        let parent = entries.get("Parent")?.as_reference()?;
        dict = catalog.dict_of(parent.objid)?;
    }
    None
}

/// Decoded content of a page: every `/Contents` stream, in array order,
/// joined with `\n`.
///
/// Missing or stream-less content objects are skipped.
pub fn page_content(
    catalog: &ObjectCatalog,
    page_dict: &[u8],
    max_decoded_bytes: usize,
) -> Result<Vec<u8>> {
    let entries = parse_dict_entries(page_dict);
    let refs: Vec<u32> = match entries.get("Contents") {
        Some(Token::Ref(r)) => vec![r.objid],
        Some(Token::Array(span)) => array_items(span)
            .iter()
            .filter_map(Token::as_reference)
            .map(|r| r.objid)
            .collect(),
        _ => Vec::new(),
    };

    let mut parts = Vec::with_capacity(refs.len());
    for objid in refs {
        let Some(obj) = catalog.get(objid) else {
            tracing::warn!(objid, "content stream object not found");
            continue;
        };
        let Some(raw) = obj.stream() else {
            tracing::debug!(objid, "content object has no stream");
            continue;
        };
        let chain = FilterChain::read(catalog, obj.dict());
        match decode(raw, &chain, RowLayout::default(), max_decoded_bytes)? {
            DecodedStream::Raw(bytes) => parts.push(bytes),
            DecodedStream::Dct(_) => return Err(PdfError::UnsupportedFilter(chain.names)),
        }
    }
    Ok(parts.join(&b"\n"[..]))
}

/// Images painted by a page, in content-stream order.
///
/// A name painted twice is reported twice. Names missing from the
/// XObject map, and XObjects that are not images (forms), are left out.
pub fn images_on_page(
    catalog: &ObjectCatalog,
    page_objid: u32,
    max_decoded_bytes: usize,
) -> Result<Vec<(String, u32)>> {
    let page_dict = catalog
        .dict_of(page_objid)
        .ok_or(PdfError::ObjectNotFound(page_objid))?;
    let xobjects = xobject_map(catalog, page_dict);
    if xobjects.is_empty() {
        return Ok(Vec::new());
    }
    let content = page_content(catalog, page_dict, max_decoded_bytes)?;

    let mut images = Vec::new();
    for cap in DO_OPERATOR.captures_iter(&content) {
        let name = String::from_utf8_lossy(&cap[1]);
        let Some(&objid) = xobjects.get(name.as_ref()) else {
            tracing::debug!(page = page_objid, %name, "Do operand not in XObject map");
            continue;
        };
        if catalog.dict_of(objid).is_some_and(|d| has_subtype(d, "Image")) {
            images.push((name.into_owned(), objid));
        }
    }
    tracing::debug!(page = page_objid, images = images.len(), "page scanned");
    Ok(images)
}
