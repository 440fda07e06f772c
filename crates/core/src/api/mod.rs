//! High-level API.
//!
//! # Example
//!
//! ```ignore
//! use pdfraster_core::api::{extract_file, ExtractOptions};
//!
//! let images = extract_file("exam.pdf".as_ref(), "out".as_ref(), &ExtractOptions::default())?;
//! ```

pub mod high_level;

// Re-export for convenience
pub use crate::config::ExtractOptions;
pub use high_level::{
    ExtractedImage, LocatedImage, PageImages, extract_all, extract_file, scan_images,
};
