// src/buffer.rs
//
// Immutable in-memory pixel buffers.
// Transforms never mutate a buffer; they build a new one.

use crate::error::{EngineError, Result};
use image::{DynamicImage, GrayImage, RgbImage};

/// Channel count of a single-channel (grayscale) buffer.
pub const GRAY: u8 = 1;
/// Channel count of an interleaved RGB buffer.
pub const RGB: u8 = 3;

/// 8-bit interleaved pixel data with fixed dimensions.
///
/// Invariant: `samples.len() == width * height * channels`, both dimensions
/// are positive and `channels` is 1 or 3. Fields are private so the
/// invariant cannot be broken after construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

fn expected_len(width: u32, height: u32, channels: u8) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(EngineError::invalid_buffer(format!(
            "dimensions must be positive, got {width}x{height}"
        )));
    }
    if channels != GRAY && channels != RGB {
        return Err(EngineError::invalid_buffer(format!(
            "channel count must be 1 or 3, got {channels}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(channels as usize))
        .ok_or_else(|| {
            EngineError::invalid_buffer(format!(
                "{width}x{height}x{channels} overflows the addressable sample count"
            ))
        })
}

impl ImageBuffer {
    /// Build a buffer from raw interleaved samples.
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self> {
        let expected = expected_len(width, height, channels)?;
        if samples.len() != expected {
            return Err(EngineError::invalid_buffer(format!(
                "expected {expected} samples for {width}x{height}x{channels}, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Buffer with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self> {
        let len = expected_len(width, height, channels)?;
        Self::new(width, height, channels, vec![value; len])
    }

    pub fn from_fn_gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Result<Self> {
        let len = expected_len(width, height, GRAY)?;
        let mut samples = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self::new(width, height, GRAY, samples)
    }

    pub fn from_fn_rgb(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Result<Self> {
        let len = expected_len(width, height, RGB)?;
        let mut samples = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                samples.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, RGB, samples)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// `width * height * channels`.
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.samples.len() as u64
    }

    #[inline]
    pub fn is_grayscale(&self) -> bool {
        self.channels == GRAY
    }

    /// Samples of the pixel at (x, y). Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.samples[start..start + c]
    }

    /// Explicit colour → gray pre-processing step.
    ///
    /// Uses BT.601 weights in fixed point. Grayscale input is returned as a copy.
    pub fn to_grayscale(&self) -> ImageBuffer {
        if self.is_grayscale() {
            return self.clone();
        }
        let samples = self
            .samples
            .chunks_exact(RGB as usize)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        ImageBuffer {
            width: self.width,
            height: self.height,
            channels: GRAY,
            samples,
        }
    }

    /// Flatten a decoded image into an 8-bit gray or RGB buffer.
    ///
    /// Alpha is dropped and 16-bit/float images are narrowed to 8 bits.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageLuma8(gray) => Self::new(width, height, GRAY, gray.as_raw().clone()),
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => Self::new(width, height, GRAY, img.to_luma8().into_raw()),
            DynamicImage::ImageRgb8(rgb) => Self::new(width, height, RGB, rgb.as_raw().clone()),
            _ => Self::new(width, height, RGB, img.to_rgb8().into_raw()),
        }
    }

    /// Convert back to an `image` crate type for encoding or display.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let built = match self.channels {
            GRAY => GrayImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageLuma8),
            _ => RgbImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageRgb8),
        };
        built.ok_or_else(|| EngineError::invalid_buffer("sample length does not match dimensions"))
    }
}

/// BT.601 luma in 8-bit fixed point, rounded half up.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}
