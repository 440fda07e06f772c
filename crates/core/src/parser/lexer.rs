//! Byte-level tokenizer for PDF object syntax.
//!
//! Tokens borrow from the scanned buffer. Dictionaries and arrays are not
//! parsed here; they come back as one balanced span which callers re-scan
//! on demand (see [`crate::document::dict`]).

use crate::error::{PdfError, Result};
use std::fmt;

/// PDF whitespace set used by the tokenizer.
pub const WHITESPACE: &[u8] = b" \t\r\n\x0c\x0b";

/// True for bytes in [`WHITESPACE`].
pub const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0c | 0x0b)
}

/// True for bytes that end a bare token run.
pub const fn is_delimiter(b: u8) -> bool {
    matches!(b, b'<' | b'>' | b'[' | b']' | b'(' | b')')
}

/// Advance `pos` past any whitespace.
pub fn skip_whitespace(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && is_whitespace(data[pos]) {
        pos += 1;
    }
    pos
}

/// An indirect reference `N G R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    pub objid: u32,
    pub genno: u32,
}

impl ObjRef {
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.objid, self.genno)
    }
}

/// A single PDF value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Balanced `<< … >>` span, delimiters included.
    Dict(&'a [u8]),
    /// Balanced `[ … ]` span, delimiters included.
    Array(&'a [u8]),
    /// Literal `( … )` or hex `< … >` string, delimiters included.
    String(&'a [u8]),
    /// Folded `N G R` reference (only produced by [`next_value_token`]).
    Ref(ObjRef),
    /// Bare run: name, number or keyword. Empty at end of data or at a
    /// closing delimiter.
    Word(&'a [u8]),
}

impl<'a> Token<'a> {
    /// True for the empty word returned at end of data.
    pub fn is_empty(&self) -> bool {
        matches!(self, Token::Word(w) if w.is_empty())
    }

    /// Raw bytes of the token. References have no single span.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            Token::Dict(b) | Token::Array(b) | Token::String(b) | Token::Word(b) => Some(b),
            Token::Ref(_) => None,
        }
    }

    /// Parse a bare run as a signed integer.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Token::Word(w) if !w.is_empty() => std::str::from_utf8(w).ok()?.parse().ok(),
            _ => None,
        }
    }

    /// Name without its leading `/`.
    pub fn as_name(&self) -> Option<&'a str> {
        match *self {
            Token::Word([b'/', rest @ ..]) => std::str::from_utf8(rest).ok(),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjRef> {
        match *self {
            Token::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&'a [u8]> {
        match *self {
            Token::Dict(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&'a [u8]> {
        match *self {
            Token::Array(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ref(r) => write!(f, "{r}"),
            t => {
                let bytes = t.as_bytes().unwrap_or_default();
                write!(f, "{}", String::from_utf8_lossy(bytes))
            }
        }
    }
}

/// Read the next token starting at `pos`.
///
/// Returns the token and the position just after it. `<<` and `[` yield the
/// full balanced span; an unbalanced span is a `MalformedStructure` error.
pub fn next_token(data: &[u8], pos: usize) -> Result<(Token<'_>, usize)> {
    let pos = skip_whitespace(data, pos);
    if pos >= data.len() {
        return Ok((Token::Word(&data[data.len()..]), data.len()));
    }
    match data[pos] {
        b'<' if data.get(pos + 1) == Some(&b'<') => {
            let end = read_balanced(data, pos, b"<<", b">>")?;
            Ok((Token::Dict(&data[pos..end]), end))
        }
        b'<' => {
            let end = skip_hex_string(data, pos)?;
            Ok((Token::String(&data[pos..end]), end))
        }
        b'[' => {
            let end = read_balanced(data, pos, b"[", b"]")?;
            Ok((Token::Array(&data[pos..end]), end))
        }
        b'(' => {
            let end = skip_literal_string(data, pos)?;
            Ok((Token::String(&data[pos..end]), end))
        }
        // closing delimiter: nothing to read, leave it for the caller
        b'>' | b']' | b')' => Ok((Token::Word(&data[pos..pos]), pos)),
        _ => {
            let start = pos;
            let mut end = pos + 1;
            while end < data.len()
                && !is_whitespace(data[end])
                && !is_delimiter(data[end])
                && data[end] != b'/'
            {
                end += 1;
            }
            Ok((Token::Word(&data[start..end]), end))
        }
    }
}

/// Read the next value token, folding `N G R` into [`Token::Ref`].
///
/// When the reference pattern does not match, the first token is returned
/// and the position is left right after it, so no look-ahead token is
/// consumed. This holds even when `N G` matched and only `R` is missing:
/// the second number stays available, which keeps `[1 2 3 0 R]` intact.
pub fn next_value_token(data: &[u8], pos: usize) -> Result<(Token<'_>, usize)> {
    let (first, after_first) = next_token(data, pos)?;
    let Some(objid) = parse_digits(&first) else {
        return Ok((first, after_first));
    };
    let Ok((second, after_second)) = next_token(data, after_first) else {
        return Ok((first, after_first));
    };
    let Some(genno) = parse_digits(&second) else {
        return Ok((first, after_first));
    };
    match next_token(data, after_second) {
        Ok((Token::Word(b"R"), after_r)) => Ok((Token::Ref(ObjRef::new(objid, genno)), after_r)),
        _ => Ok((first, after_first)),
    }
}

fn parse_digits(token: &Token<'_>) -> Option<u32> {
    match *token {
        Token::Word(w) if !w.is_empty() && w.iter().all(u8::is_ascii_digit) => {
            std::str::from_utf8(w).ok()?.parse().ok()
        }
        _ => None,
    }
}

/// Return the end (exclusive) of the balanced span opening at `pos`.
///
/// Strings are skipped as units so that delimiters inside them never change
/// the nesting depth.
fn read_balanced(data: &[u8], pos: usize, open: &[u8], close: &[u8]) -> Result<usize> {
    let mut depth = 0usize;
    let mut i = pos;
    while i < data.len() {
        if data[i..].starts_with(open) {
            depth += 1;
            i += open.len();
        } else if data[i..].starts_with(close) {
            depth = depth.saturating_sub(1);
            i += close.len();
            if depth == 0 {
                return Ok(i);
            }
        } else if data[i] == b'(' {
            i = skip_literal_string(data, i)?;
        } else if data[i] == b'<' && !data[i..].starts_with(b"<<") {
            i = skip_hex_string(data, i)?;
        } else {
            i += 1;
        }
    }
    Err(PdfError::MalformedStructure {
        pos,
        msg: format!("unbalanced `{}`", String::from_utf8_lossy(open)),
    })
}

fn skip_literal_string(data: &[u8], pos: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut i = pos;
    while i < data.len() {
        match data[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => (),
        }
        i += 1;
    }
    Err(PdfError::MalformedStructure {
        pos,
        msg: "unterminated literal string".to_string(),
    })
}

fn skip_hex_string(data: &[u8], pos: usize) -> Result<usize> {
    match data[pos + 1..].iter().position(|&b| b == b'>') {
        Some(off) => Ok(pos + 1 + off + 1),
        None => Err(PdfError::MalformedStructure {
            pos,
            msg: "unterminated hex string".to_string(),
        }),
    }
}
