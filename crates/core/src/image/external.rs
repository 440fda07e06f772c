//! External JPEG codec boundary.
//!
//! DCT-coded images are never decoded in-process. A [`JpegCodec`] receives
//! the JPEG bitstream and an optional 8-bit grayscale mask PNG of the same
//! size, both as files, and must leave a finished PNG at the output path.

use crate::error::{PdfError, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Decodes a JPEG (optionally applying an alpha mask) into a PNG file.
pub trait JpegCodec: Send + Sync {
    fn compose(&self, jpeg: &Path, mask: Option<&Path>, output: &Path) -> Result<()>;
}

/// Program and argument templates for a command-line codec.
///
/// `{input}`, `{mask}` and `{output}` in any argument are replaced with the
/// respective paths. `mask_args` is used when a mask is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCommand {
    pub program: String,
    pub args: Vec<String>,
    pub mask_args: Vec<String>,
}

impl Default for CodecCommand {
    /// ImageMagick 7.
    fn default() -> Self {
        Self {
            program: "magick".to_string(),
            args: to_strings(&["{input}", "{output}"]),
            mask_args: to_strings(&[
                "{input}",
                "{mask}",
                "-alpha",
                "off",
                "-compose",
                "CopyOpacity",
                "-composite",
                "{output}",
            ]),
        }
    }
}

impl CodecCommand {
    /// Same argument templates, different executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments with placeholders filled in.
    pub fn render(&self, jpeg: &Path, mask: Option<&Path>, output: &Path) -> Vec<String> {
        let templates = if mask.is_some() { &self.mask_args } else { &self.args };
        let input = jpeg.to_string_lossy();
        let mask = mask.map(|m| m.to_string_lossy()).unwrap_or_default();
        let output = output.to_string_lossy();
        templates
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{mask}", &mask)
                    .replace("{output}", &output)
            })
            .collect()
    }
}

fn to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// [`JpegCodec`] backed by a child process.
///
/// The child gets no stdin; its stderr is captured for error messages.
/// When a timeout is set and expires the child is killed.
#[derive(Debug, Clone, Default)]
pub struct CommandCodec {
    command: CodecCommand,
    timeout: Option<Duration>,
}

impl CommandCodec {
    pub fn new(command: CodecCommand, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }

    pub fn command(&self) -> &CodecCommand {
        &self.command
    }
}

impl JpegCodec for CommandCodec {
    fn compose(&self, jpeg: &Path, mask: Option<&Path>, output: &Path) -> Result<()> {
        let args = self.command.render(jpeg, mask, output);
        tracing::debug!(program = %self.command.program, ?args, "running codec");

        let mut child = Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PdfError::CodecFailed(format!("{}: {}", self.command.program, e)))?;

        // a full stderr pipe would stall the child
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Some(limit) = self.timeout
                && started.elapsed() >= limit
            {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(program = %self.command.program, ?limit, "codec timed out");
                return Err(PdfError::CodecTimeout(limit));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(PdfError::CodecFailed(format!(
                "{} exited with {}: {}",
                self.command.program,
                status,
                stderr.trim()
            )));
        }
        if !output.exists() {
            return Err(PdfError::CodecFailed(format!(
                "{} produced no output at {}",
                self.command.program,
                output.display()
            )));
        }
        Ok(())
    }
}
