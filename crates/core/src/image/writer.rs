//! Output directory and file naming for extracted images.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Hands out deterministic output paths inside one directory.
///
/// The name depends only on the page and the image's position on it, so
/// paths can be computed up front and written from any thread.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    outdir: PathBuf,
}

impl ImageWriter {
    /// Use `outdir`, creating it if needed.
    pub fn new(outdir: impl AsRef<Path>) -> Result<Self> {
        let outdir = outdir.as_ref().to_path_buf();
        fs::create_dir_all(&outdir)?;
        Ok(Self { outdir })
    }

    /// Use `outdir` after deleting anything already in it.
    pub fn recreate(outdir: impl AsRef<Path>) -> Result<Self> {
        let outdir = outdir.as_ref();
        if outdir.exists() {
            tracing::debug!(dir = %outdir.display(), "clearing output directory");
            fs::remove_dir_all(outdir)?;
        }
        Self::new(outdir)
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Path for the `index`-th image (1-based) on page `page` (1-based).
    pub fn path_for(&self, page: usize, index: usize) -> PathBuf {
        self.outdir.join(format!("p{page}_{index}.png"))
    }
}
