// src/ops.rs
//
// Built-in algorithm identifiers, parameter names, presets and output formats.

use crate::error::{EngineError, Result};
use crate::schema::ParameterBinding;
use std::path::Path;

/// Identifiers of the built-in algorithms, in registration order.
pub mod ids {
    pub const MEAN_BLUR: &str = "mean_blur";
    pub const GAUSSIAN_BLUR: &str = "gaussian_blur";
    pub const CANNY: &str = "canny";
    pub const EQUALIZE_HIST: &str = "equalize_hist";
    pub const THRESHOLD: &str = "threshold";
    pub const ADAPTIVE_THRESHOLD: &str = "adaptive_threshold";

    pub const ALL: [&str; 6] = [
        MEAN_BLUR,
        GAUSSIAN_BLUR,
        CANNY,
        EQUALIZE_HIST,
        THRESHOLD,
        ADAPTIVE_THRESHOLD,
    ];
}

/// Parameter names shared by the built-in descriptors.
pub mod params {
    pub const KERNEL_SIZE: &str = "kernelSize";
    pub const SIGMA: &str = "sigma";
    pub const LOW: &str = "low";
    pub const HIGH: &str = "high";
    pub const THRESHOLD: &str = "threshold";
    pub const BLOCK_SIZE: &str = "blockSize";
    pub const OFFSET: &str = "offset";
}

/// Output format for encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    pub fn from_str(format: &str, quality: Option<u8>) -> Result<Self> {
        let q = quality.unwrap_or(Self::DEFAULT_JPEG_QUALITY).clamp(1, 100);
        match format.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg { quality: q }),
            "png" => Ok(Self::Png),
            other => Err(EngineError::unsupported_format(other.to_string())),
        }
    }

    /// Pick a format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| EngineError::unsupported_format(path.display().to_string()))?;
        Self::from_str(ext, None)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

// =============================================================================
// PRESETS - Named starting points for the slider surface
// =============================================================================

/// An algorithm together with a ready-made binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub algorithm: &'static str,
    pub binding: ParameterBinding,
}

impl Preset {
    pub const NAMES: [&'static str; 6] = ["soften", "smooth", "edges", "contrast", "binarize", "document"];

    fn new(name: &'static str, algorithm: &'static str, binding: ParameterBinding) -> Self {
        Self {
            name,
            algorithm,
            binding,
        }
    }

    /// Get the built-in preset by name
    pub fn get(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "soften" => Some(Self::soften()),
            "smooth" => Some(Self::smooth()),
            "edges" => Some(Self::edges()),
            "contrast" => Some(Self::contrast()),
            "binarize" => Some(Self::binarize()),
            "document" => Some(Self::document()),
            _ => None,
        }
    }

    /// Light 3x3 box blur.
    pub fn soften() -> Self {
        Self::new(
            "soften",
            ids::MEAN_BLUR,
            ParameterBinding::new().with(params::KERNEL_SIZE, 3),
        )
    }

    /// Noise removal before thresholding or edge detection.
    pub fn smooth() -> Self {
        Self::new(
            "smooth",
            ids::GAUSSIAN_BLUR,
            ParameterBinding::new()
                .with(params::KERNEL_SIZE, 7)
                .with(params::SIGMA, 1.5),
        )
    }

    /// Canny with the usual 1:2 threshold ratio.
    pub fn edges() -> Self {
        Self::new(
            "edges",
            ids::CANNY,
            ParameterBinding::new()
                .with(params::LOW, 50)
                .with(params::HIGH, 100),
        )
    }

    pub fn contrast() -> Self {
        Self::new("contrast", ids::EQUALIZE_HIST, ParameterBinding::new())
    }

    pub fn binarize() -> Self {
        Self::new(
            "binarize",
            ids::THRESHOLD,
            ParameterBinding::new().with(params::THRESHOLD, 127),
        )
    }

    /// Scanned pages with uneven lighting.
    pub fn document() -> Self {
        Self::new(
            "document",
            ids::ADAPTIVE_THRESHOLD,
            ParameterBinding::new()
                .with(params::BLOCK_SIZE, 15)
                .with(params::OFFSET, 10),
        )
    }
}
