//! Error types for pdfraster.

use std::time::Duration;
use thiserror::Error;

/// Primary error type for PDF scanning, decoding and PNG output.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("malformed structure at position {pos}: {msg}")]
    MalformedStructure { pos: usize, msg: String },

    #[error("missing required field: /{0}")]
    MissingField(String),

    #[error("invalid value for /{key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("unsupported filter chain: {0:?}")]
    UnsupportedFilter(Vec<String>),

    #[error("unsupported predictor: {0}")]
    UnsupportedPredictor(String),

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u32),

    #[error("unsupported component count: {0}")]
    UnsupportedComponents(u32),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("external codec failed: {0}")]
    CodecFailed(String),

    #[error("external codec timed out after {0:?}")]
    CodecTimeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    pub(crate) fn dimensions(expected: (u32, u32), got: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            expected: format!("{}x{}", expected.0, expected.1),
            got: format!("{}x{}", got.0, got.1),
        }
    }

    pub(crate) fn length(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{expected} bytes"),
            got: format!("{got} bytes"),
        }
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
