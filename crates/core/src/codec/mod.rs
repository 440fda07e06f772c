//! Stream codecs.
//!
//! This module contains:
//! - `flate`: zlib inflate/deflate with a decoded-size ceiling
//! - `predictor`: PNG row predictor reversal
//! - `filters`: `/Filter` + `/DecodeParms` dispatch

pub mod filters;
pub mod flate;
pub mod predictor;

// Re-export main functions for convenience
pub use filters::{DecodeParms, DecodedStream, Filter, FilterChain, RowLayout, decode};
pub use flate::{flate_decode, flate_encode};
pub use predictor::{RowFilter, apply_png_predictor, paeth_predictor};
