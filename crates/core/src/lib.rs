//! pdfraster - image extraction from PDF files without a PDF library.
//!
//! The pipeline runs bottom-up:
//! - [`parser::lexer`] tokenizes raw PDF bytes
//! - [`document::catalog`] indexes every `N G obj … endobj` span
//! - [`document::dict`] and [`document::page`] resolve dictionaries and
//!   find the images each page paints
//! - [`codec`] undoes Flate and PNG predictors
//! - [`image`] rebuilds the raster, applies masks and writes PNG files
//!
//! [`api`] wraps all of it for whole documents.

pub mod api;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod image;
pub mod parser;

pub use api::{ExtractedImage, PageImages, extract_all, extract_file, scan_images};
pub use config::ExtractOptions;
pub use document::ObjectCatalog;
pub use error::{PdfError, Result};
