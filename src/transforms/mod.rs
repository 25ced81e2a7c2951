// src/transforms/mod.rs
//
// Pure transform implementations and the built-in catalogue.
//
// Every transform has the shape `(buffer, binding) -> TransformOutput` and
// never mutates its input. Windowed operations use edge replication: a
// sample outside the buffer takes the value of the nearest edge sample.

pub mod blur;
pub mod edges;
pub mod histogram;
pub mod threshold;

use crate::buffer::ImageBuffer;
use crate::engine::registry::AlgorithmRegistry;
use crate::error::{Result, TransformError};

/// Register the built-in algorithms in listing order.
pub fn register_builtins(registry: &mut AlgorithmRegistry) -> Result<()> {
    registry.register(blur::mean_blur_descriptor(), blur::mean_blur)?;
    registry.register(blur::gaussian_blur_descriptor(), blur::gaussian_blur)?;
    registry.register(edges::canny_descriptor(), edges::canny)?;
    registry.register(histogram::equalize_descriptor(), histogram::equalize_hist)?;
    registry.register(threshold::threshold_descriptor(), threshold::threshold)?;
    registry.register(
        threshold::adaptive_threshold_descriptor(),
        threshold::adaptive_threshold,
    )?;
    Ok(())
}

/// Edge-replicating index: clamps `i` into `0..len`.
#[inline]
pub(crate) fn replicate(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Wrap freshly computed samples, reporting a shape mismatch as a transform failure.
pub(crate) fn output_buffer(
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
) -> std::result::Result<ImageBuffer, TransformError> {
    ImageBuffer::new(width, height, channels, samples).map_err(|e| TransformError::new(e.to_string()))
}

/// Read an integer parameter that must fit a window size.
pub(crate) fn window_param(
    binding: &crate::schema::ParameterBinding,
    name: &str,
) -> std::result::Result<usize, TransformError> {
    let value = binding.int(name)?;
    if value < 1 {
        return Err(TransformError::new(format!("{name} must be positive, got {value}")));
    }
    usize::try_from(value).map_err(|_| TransformError::new(format!("{name} out of range: {value}")))
}
