//! PDF byte-level parsing.
//!
//! - `lexer`: whitespace skipping, balanced spans, reference folding

pub mod lexer;

// Re-export main types for convenience
pub use lexer::{ObjRef, Token, next_token, next_value_token, skip_whitespace};
