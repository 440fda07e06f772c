//! Dictionary lookups over raw `<<…>>` spans.
//!
//! Nothing here is cached: views are re-derived from the bytes whenever a
//! caller needs them. Absent keys and unparsable values degrade to `None`
//! or an empty view; the caller decides whether that is fatal.

use crate::parser::lexer::{Token, is_delimiter, is_whitespace, next_value_token, skip_whitespace};
use indexmap::IndexMap;

/// Name (without `/`) → value token, in dictionary order.
pub type DictView<'a> = IndexMap<String, Token<'a>>;

/// Find `key` (with or without its leading `/`) anywhere in `dict` and read
/// the value token that follows it.
///
/// This is a linear search, so a key inside a nested dictionary can match
/// when the top level lacks it. Use [`parse_dict_entries`] when only
/// top-level keys may match.
pub fn find_entry<'a>(dict: &'a [u8], key: &str) -> Option<Token<'a>> {
    let key = key.strip_prefix('/').unwrap_or(key).as_bytes();
    let mut from = 0;
    while from < dict.len() {
        let off = dict[from..].iter().position(|&b| b == b'/')?;
        let name_start = from + off + 1;
        let name_end = name_start + key.len();
        from = name_start;
        if !dict[name_start..].starts_with(key) {
            continue;
        }
        // `/Width` must not match `/WidthScale`
        if name_end < dict.len() && is_name_byte(dict[name_end]) {
            continue;
        }
        return match next_value_token(dict, name_end) {
            Ok((token, _)) if !token.is_empty() => Some(token),
            _ => None,
        };
    }
    None
}

/// Parse the top-level entries of a `<<…>>` span.
///
/// Parsing stops quietly at the closing `>>`, at the first key that is not
/// a name, or at an unbalanced value. Anything that is not a dictionary
/// span yields an empty view.
pub fn parse_dict_entries(dict: &[u8]) -> DictView<'_> {
    let mut entries = DictView::new();
    let raw = trim(dict);
    if !raw.starts_with(b"<<") || !raw.ends_with(b">>") || raw.len() < 4 {
        return entries;
    }
    let limit = raw.len() - 2;
    let mut pos = 2;
    loop {
        pos = skip_whitespace(raw, pos);
        if pos >= limit || raw[pos..].starts_with(b">>") || raw[pos] != b'/' {
            break;
        }
        let key_start = pos + 1;
        pos = key_start;
        while pos < raw.len() && is_name_byte(raw[pos]) {
            pos += 1;
        }
        let key: String = raw[key_start..pos]
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| b as char)
            .collect();
        let Ok((value, next)) = next_value_token(raw, pos) else {
            tracing::debug!(%key, "unbalanced dictionary value, stopping");
            break;
        };
        // key without a value
        if value.is_empty() {
            break;
        }
        entries.insert(key, value);
        pos = next;
    }
    entries
}

/// Integer entry of a dictionary, looked up linearly.
pub fn find_int(dict: &[u8], key: &str) -> Option<i64> {
    find_entry(dict, key)?.as_int()
}

/// Filter names from a `/Filter` value: a single name or an array of names.
pub fn parse_filters(token: Option<&Token<'_>>) -> Vec<String> {
    match token {
        Some(Token::Word(_)) => token
            .and_then(Token::as_name)
            .map(|name| vec![name.to_string()])
            .unwrap_or_default(),
        Some(Token::Array(span)) => array_items(span)
            .iter()
            .filter_map(Token::as_name)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Value tokens of an `[…]` span, references folded.
///
/// Stops at the first unbalanced item.
pub fn array_items(span: &[u8]) -> Vec<Token<'_>> {
    let raw = trim(span);
    let inner = match raw {
        [b'[', inner @ .., b']'] => inner,
        _ => return Vec::new(),
    };
    let mut items = Vec::new();
    let mut pos = 0;
    while pos < inner.len() {
        match next_value_token(inner, pos) {
            Ok((token, next)) if !token.is_empty() => {
                items.push(token);
                pos = next;
            }
            _ => break,
        }
    }
    items
}

/// True when the top-level `/Type` of `dict` is exactly `/name`.
pub fn has_type(dict: &[u8], name: &str) -> bool {
    top_level_name(dict, "Type") == Some(name)
}

/// True when the top-level `/Subtype` of `dict` is exactly `/name`.
pub fn has_subtype(dict: &[u8], name: &str) -> bool {
    top_level_name(dict, "Subtype") == Some(name)
}

fn top_level_name<'a>(dict: &'a [u8], key: &str) -> Option<&'a str> {
    parse_dict_entries(dict).get(key)?.as_name()
}

const fn is_name_byte(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b) && b != b'/'
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_whitespace(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !is_whitespace(b)).map_or(start, |p| p + 1);
    &bytes[start..end]
}
