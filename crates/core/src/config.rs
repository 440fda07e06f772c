//! Extraction options.

use crate::codec::flate::MAX_DECODED_BYTES;
use crate::image::external::CodecCommand;
use std::time::Duration;

/// Options for image extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Ceiling for any single inflated stream, in bytes.
    pub max_decoded_bytes: usize,

    /// External JPEG codec used for DCT-coded images.
    pub codec: CodecCommand,

    /// Bound on one codec invocation. None waits indefinitely.
    pub codec_timeout: Option<Duration>,

    /// Worker threads for batch extraction. None or 1 runs sequentially.
    pub threads: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_decoded_bytes: MAX_DECODED_BYTES,
            codec: CodecCommand::default(),
            codec_timeout: Some(Duration::from_secs(30)),
            threads: None,
        }
    }
}

impl ExtractOptions {
    /// True when batch work should go through a thread pool.
    pub fn is_parallel(&self) -> bool {
        self.threads.is_some_and(|n| n > 1)
    }
}
