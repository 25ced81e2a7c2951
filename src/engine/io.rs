// src/engine/io.rs
//
// Decoding uploads into `ImageBuffer` and encoding results for display.
// Only JPEG and PNG are handled.

use crate::buffer::ImageBuffer;
use crate::engine::limits::EngineLimits;
use crate::error::{EngineError, Result};
use crate::ops::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageFormat, ImageReader};
use std::io::{Cursor, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Where encoded image bytes come from.
#[derive(Clone, Debug)]
pub enum Source {
    /// In-memory bytes, e.g. an HTTP upload.
    Memory(Arc<Vec<u8>>),
    /// File read when `load` is called.
    Path(PathBuf),
}

impl Source {
    pub fn load(&self) -> Result<Arc<Vec<u8>>> {
        match self {
            Source::Memory(data) => Ok(Arc::clone(data)),
            Source::Path(path) => read_file(path).map(Arc::new),
        }
    }

    pub fn decode(&self, limits: &EngineLimits) -> Result<ImageBuffer> {
        decode_image(&self.load()?, limits)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        let shown = path.to_string_lossy().to_string();
        if e.kind() == IoErrorKind::NotFound {
            EngineError::file_not_found(shown)
        } else {
            EngineError::file_read_failed(shown, e)
        }
    })
}

fn sniff_format(bytes: &[u8]) -> Result<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(format),
        Ok(other) => Err(EngineError::unsupported_format(format!("{other:?}").to_lowercase())),
        Err(_) => Err(EngineError::unsupported_format("unknown")),
    }
}

/// Header facts available without decoding pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectMetadata {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Read format and dimensions from the header only.
pub fn inspect_header(bytes: &[u8]) -> Result<InspectMetadata> {
    let format = sniff_format(bytes)?;
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| EngineError::decode_failed(format!("failed to read dimensions: {e}")))?;
    Ok(InspectMetadata { width, height, format })
}

/// Decode JPEG or PNG bytes into an 8-bit gray or RGB buffer.
///
/// Header dimensions are checked against `limits` before any pixel data is
/// decoded, so an oversized upload never allocates its full frame.
pub fn decode_image(bytes: &[u8], limits: &EngineLimits) -> Result<ImageBuffer> {
    let header = inspect_header(bytes)?;
    limits.enforce_samples(header.width, header.height, 1)?;

    let decoded = image::load_from_memory_with_format(bytes, header.format)
        .map_err(|e| EngineError::decode_failed(e.to_string()))?;
    let buffer = ImageBuffer::from_dynamic(&decoded)?;
    limits.enforce_buffer(&buffer)?;

    debug!(
        target: "transform_lab::io",
        format = ?header.format,
        width = header.width,
        height = header.height,
        channels = buffer.channels(),
        "decoded image"
    );
    Ok(buffer)
}

pub fn load_image(path: impl AsRef<Path>, limits: &EngineLimits) -> Result<ImageBuffer> {
    decode_image(&read_file(path.as_ref())?, limits)
}

/// Encode a buffer as PNG or JPEG.
pub fn encode(buffer: &ImageBuffer, format: OutputFormat) -> Result<Vec<u8>> {
    let img = buffer.to_dynamic()?;
    let mut out = Vec::new();
    let written = match format {
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new(&mut out)),
        OutputFormat::Jpeg { quality } => img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality)),
    };
    written.map_err(|e| EngineError::encode_failed(format.extension(), e.to_string()))?;
    Ok(out)
}

/// Encode by file extension and write to `path`.
pub fn save_image(buffer: &ImageBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = OutputFormat::from_path(path)?;
    let bytes = encode(buffer, format)?;
    std::fs::write(path, &bytes)
        .map_err(|e| EngineError::file_write_failed(path.to_string_lossy().to_string(), e))?;
    debug!(target: "transform_lab::io", path = %path.display(), bytes = bytes.len(), "saved image");
    Ok(())
}
