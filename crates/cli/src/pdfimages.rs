//! pdfimages - Extract images from PDF files as PNG
//!
//! Each input PDF gets its own sub-directory of the output directory, named
//! after the file stem. Images are written as `p{page}_{n}.png`.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pdfraster_core::api::{ExtractedImage, PageImages, extract_all, scan_images};
use pdfraster_core::image::{CodecCommand, CommandCodec, ImageWriter};
use pdfraster_core::{ExtractOptions, ObjectCatalog};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Extract the images painted on each page of one or more PDF files.
#[derive(Parser, Debug)]
#[command(name = "pdfimages")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more paths to PDF files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory receiving one sub-directory per PDF
    #[arg(short = 'o', long = "output-dir", default_value = "images")]
    output_dir: PathBuf,

    /// Only list pages and images, extract nothing
    #[arg(long, action = ArgAction::SetTrue)]
    list: bool,

    /// Print a JSON manifest to stdout
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Program used to turn DCT (JPEG) images into PNG
    #[arg(long, default_value = "magick")]
    codec: String,

    /// Seconds to wait for one codec run (0 = no limit)
    #[arg(long = "codec-timeout", default_value = "30")]
    codec_timeout: u64,

    /// Worker threads per PDF
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

#[derive(Serialize)]
struct FileListing<'a> {
    file: &'a Path,
    pages: Vec<PageImages>,
}

#[derive(Serialize)]
struct FileManifest<'a> {
    file: &'a Path,
    output_dir: &'a Path,
    images: Vec<ExtractedImage>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let options = build_options(&args);
    let codec = CommandCodec::new(options.codec.clone(), options.codec_timeout);

    let mut listings = Vec::new();
    let mut manifests = Vec::new();
    for path in &args.files {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
        let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let catalog = ObjectCatalog::build(data);
        tracing::info!(file = %path.display(), objects = catalog.len(), "scanning");

        if args.list {
            let pages = scan_images(&catalog, &options)
                .with_context(|| format!("scanning {}", path.display()))?;
            if !args.json {
                print_listing(path, &pages);
            }
            listings.push(FileListing { file: path, pages });
            continue;
        }

        let outdir = args.output_dir.join(file_stem(path)?);
        let writer = ImageWriter::recreate(&outdir)
            .with_context(|| format!("preparing {}", outdir.display()))?;
        let images = extract_all(&catalog, writer.outdir(), &options, &codec)
            .with_context(|| format!("extracting images from {}", path.display()))?;
        if !args.json {
            println!("{}: {} image(s) -> {}", path.display(), images.len(), outdir.display());
        }
        manifests.push((path.as_path(), outdir, images));
    }

    if args.json {
        let json = if args.list {
            serde_json::to_string_pretty(&listings)?
        } else {
            let manifests: Vec<FileManifest<'_>> = manifests
                .iter()
                .map(|(file, outdir, images)| FileManifest {
                    file,
                    output_dir: outdir,
                    images: images.clone(),
                })
                .collect();
            serde_json::to_string_pretty(&manifests)?
        };
        println!("{json}");
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_options(args: &Args) -> ExtractOptions {
    ExtractOptions {
        codec: CodecCommand::default().with_program(&args.codec),
        codec_timeout: (args.codec_timeout > 0).then(|| Duration::from_secs(args.codec_timeout)),
        threads: args.threads,
        ..ExtractOptions::default()
    }
}

fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no usable file name in {}", path.display()))
}

fn print_listing(path: &Path, pages: &[PageImages]) {
    println!("{}:", path.display());
    for page in pages {
        let images: Vec<String> = page
            .images
            .iter()
            .map(|img| format!("{} ({} 0 R)", img.name, img.objid))
            .collect();
        println!("  page {}: {}", page.page, images.join(", "));
    }
}
