//! Image reconstruction and PNG output.
//!
//! This module contains:
//! - `descriptor`: geometry, component count and mask of an image object
//! - `extract`: the per-image pipeline (`ImageExtractor`)
//! - `png`: minimal PNG serializer
//! - `external`: the external JPEG codec boundary
//! - `writer`: output directory naming

pub mod descriptor;
pub mod external;
pub mod extract;
pub mod png;
pub mod writer;

pub use descriptor::{ImageDescriptor, infer_components};
pub use external::{CodecCommand, CommandCodec, JpegCodec};
pub use extract::{ImageExtractor, MaskRaster};
pub use png::{ColorType, PNG_SIGNATURE, encode_png, write_png};
pub use writer::ImageWriter;
