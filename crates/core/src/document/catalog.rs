//! Object catalog built from a brute-force scan of the whole file.
//!
//! No cross-reference table or trailer is consulted. Every `N G obj` header
//! up to the next `endobj` becomes one [`PdfObject`]; a later span with the
//! same object number replaces the earlier one, so incrementally updated
//! files resolve to their newest revision.

use super::dict::parse_dict_entries;
use crate::parser::lexer::{Token, is_whitespace};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use rustc_hash::FxHashMap;

static OBJ_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)(\d+)\s+(\d+)\s+obj").unwrap());

/// One indirect object: its dictionary span and optional stream body.
///
/// Both regions are zero-copy slices of the scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfObject {
    pub objid: u32,
    /// Parsed but not used for identity.
    pub genno: u32,
    dict: Bytes,
    stream: Option<Bytes>,
}

impl PdfObject {
    /// Raw dictionary bytes, trimmed. May be an array or a bare value for
    /// non-dictionary objects, or empty.
    pub fn dict(&self) -> &[u8] {
        &self.dict
    }

    /// Raw (still encoded) stream bytes.
    pub fn stream(&self) -> Option<&[u8]> {
        self.stream.as_deref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }
}

/// Object number → object map for one PDF file. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ObjectCatalog {
    data: Bytes,
    objects: FxHashMap<u32, PdfObject>,
}

impl ObjectCatalog {
    /// Scan `data` for every `N G obj … endobj` span.
    ///
    /// Spans without a closing `endobj` are skipped.
    pub fn build(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let mut objects = FxHashMap::default();

        for cap in OBJ_HEADER.captures_iter(&data) {
            let (Some(objid), Some(genno)) = (parse_u32(&cap[1]), parse_u32(&cap[2])) else {
                continue;
            };
            let Some(header) = cap.get(0) else { continue };
            let start = header.end();
            let Some(end) = find(&data[start..], b"endobj").map(|off| start + off) else {
                tracing::warn!(objid, offset = header.start(), "object without endobj skipped");
                continue;
            };
            let object = split_body(&data, objid, genno, start, end);
            if objects.insert(objid, object).is_some() {
                tracing::debug!(objid, "object redefined, keeping later span");
            }
        }

        tracing::debug!(objects = objects.len(), bytes = data.len(), "object catalog built");
        Self { data, objects }
    }

    pub fn get(&self, objid: u32) -> Option<&PdfObject> {
        self.objects.get(&objid)
    }

    pub fn contains(&self, objid: u32) -> bool {
        self.objects.contains_key(&objid)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All object numbers in ascending order.
    pub fn objids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The scanned file.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Dictionary bytes of object `objid`, if present.
    pub fn dict_of(&self, objid: u32) -> Option<&[u8]> {
        self.get(objid).map(PdfObject::dict)
    }

    /// Resolve a value token to dictionary bytes.
    ///
    /// A `<<…>>` span is returned as is; a reference yields the target
    /// object's dictionary bytes. Anything else, or a dangling reference,
    /// is `None`.
    pub fn resolve_dict<'a>(&'a self, token: &Token<'a>) -> Option<&'a [u8]> {
        match *token {
            Token::Dict(span) => Some(span),
            Token::Ref(r) => {
                let resolved = self.dict_of(r.objid);
                if resolved.is_none() {
                    tracing::debug!(reference = %r, "unresolved reference");
                }
                resolved
            }
            _ => None,
        }
    }
}

fn split_body(data: &Bytes, objid: u32, genno: u32, start: usize, end: usize) -> PdfObject {
    let body = &data[start..end];
    let Some(kw) = find_stream_keyword(body) else {
        let (s, e) = trim_range(body);
        return PdfObject {
            objid,
            genno,
            dict: data.slice(start + s..start + e),
            stream: None,
        };
    };

    let (s, e) = trim_range(&body[..kw]);
    let dict = data.slice(start + s..start + e);

    let mut stream_start = kw + b"stream".len();
    if body[stream_start..].starts_with(b"\r\n") {
        stream_start += 2;
    } else if body[stream_start..].starts_with(b"\n") {
        stream_start += 1;
    }

    let stream_end = declared_length(&dict)
        .map(|len| stream_start + len)
        .filter(|&end| end <= body.len())
        .or_else(|| find(&body[stream_start..], b"endstream").map(|off| stream_start + off))
        .unwrap_or(body.len());

    PdfObject {
        objid,
        genno,
        dict,
        stream: Some(data.slice(start + stream_start..start + stream_end)),
    }
}

/// Direct integer `/Length` from the top level of a stream dictionary.
fn declared_length(dict: &[u8]) -> Option<usize> {
    let entries = parse_dict_entries(dict);
    let len = entries.get("Length")?.as_int()?;
    usize::try_from(len).ok()
}

/// First `stream` keyword in an object body, ignoring `endstream` and
/// occurrences glued to other regular characters.
fn find_stream_keyword(body: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(off) = find(&body[from..], b"stream") {
        let pos = from + off;
        let before_ok = pos == 0 || is_whitespace(body[pos - 1]) || body[pos - 1] == b'>';
        let after = pos + b"stream".len();
        let after_ok = after >= body.len() || is_whitespace(body[after]);
        if before_ok && after_ok {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

fn trim_range(bytes: &[u8]) -> (usize, usize) {
    let start = bytes.iter().position(|&b| !is_whitespace(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !is_whitespace(b)).map_or(start, |p| p + 1);
    (start, end)
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_u32(digits: &[u8]) -> Option<u32> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}
