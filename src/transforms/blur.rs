// src/transforms/blur.rs
//
// Mean (box) and Gaussian blur. Both are separable: a horizontal pass per
// row followed by a vertical pass per row, each row handled by rayon.

use super::{output_buffer, replicate, window_param};
use crate::buffer::ImageBuffer;
use crate::engine::registry::TransformOutput;
use crate::error::TransformError;
use crate::ops::{ids, params};
use crate::schema::{AlgorithmDescriptor, ChannelSet, Constraint, ParameterBinding, ParameterSpec};
use rayon::prelude::*;

/// Kernels at least this wide get a "removes fine detail" hint.
pub const LARGE_KERNEL: usize = 15;

const LARGE_KERNEL_HINT: &str = "large kernel removes fine detail";
const TRUNCATED_HINT: &str = "kernel truncates the Gaussian; increase kernelSize or lower sigma";

fn kernel_size_spec() -> ParameterSpec {
    ParameterSpec::int(params::KERNEL_SIZE, "Kernel size", 1, 31, 2, 5).with_constraint(Constraint::Odd)
}

pub fn mean_blur_descriptor() -> AlgorithmDescriptor {
    AlgorithmDescriptor::new(ids::MEAN_BLUR, "Mean filter")
        .summary("Replaces each sample with the average of its k x k neighbourhood.")
        .accepts(ChannelSet::GRAY | ChannelSet::RGB)
        .param(kernel_size_spec())
}

pub fn gaussian_blur_descriptor() -> AlgorithmDescriptor {
    AlgorithmDescriptor::new(ids::GAUSSIAN_BLUR, "Gaussian filter")
        .summary("Weighted neighbourhood average with Gaussian weights of standard deviation sigma.")
        .accepts(ChannelSet::GRAY | ChannelSet::RGB)
        .param(kernel_size_spec())
        .param(ParameterSpec::float(params::SIGMA, "Sigma", 0.1, 10.0, 0.1, 1.0))
}

/// Mean blur with an exact integer average, rounded half up.
pub fn mean_blur(input: &ImageBuffer, binding: &ParameterBinding) -> Result<TransformOutput, TransformError> {
    let k = window_param(binding, params::KERNEL_SIZE)?;
    if k % 2 == 0 {
        return Err(TransformError::new(format!("kernel size must be odd, got {k}")));
    }
    let samples = box_mean(input, k);
    let buffer = output_buffer(input.width(), input.height(), input.channels(), samples)?;
    let output = TransformOutput::new(buffer);
    Ok(if k >= LARGE_KERNEL {
        output.with_diagnostic(LARGE_KERNEL_HINT)
    } else {
        output
    })
}

/// Gaussian blur with a normalized separable kernel.
pub fn gaussian_blur(input: &ImageBuffer, binding: &ParameterBinding) -> Result<TransformOutput, TransformError> {
    let k = window_param(binding, params::KERNEL_SIZE)?;
    let sigma = binding.float(params::SIGMA)?;
    if k % 2 == 0 {
        return Err(TransformError::new(format!("kernel size must be odd, got {k}")));
    }
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(TransformError::new(format!("sigma must be positive, got {sigma}")));
    }

    let kernel = gaussian_kernel_1d(k, sigma as f32)?;
    let samples = separable_filter(input, &kernel);
    let buffer = output_buffer(input.width(), input.height(), input.channels(), samples)?;

    let radius = (k / 2) as f64;
    let diagnostic = if k >= LARGE_KERNEL {
        Some(LARGE_KERNEL_HINT)
    } else if radius < 2.0 * sigma {
        Some(TRUNCATED_HINT)
    } else {
        None
    };
    let output = TransformOutput::new(buffer);
    Ok(match diagnostic {
        Some(hint) => output.with_diagnostic(hint),
        None => output,
    })
}

/// Normalized 1-D Gaussian kernel of odd length `kernel_size`.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Result<Vec<f32>, TransformError> {
    let mean = (kernel_size - 1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    let mut kernel: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / (2.0 * sigma_sq)).exp()
        })
        .collect();

    let norm = kernel.iter().sum::<f32>();
    if !norm.is_finite() || norm <= 0.0 {
        return Err(TransformError::new(format!(
            "degenerate Gaussian kernel (size {kernel_size}, sigma {sigma})"
        )));
    }
    kernel.iter_mut().for_each(|w| *w /= norm);
    Ok(kernel)
}

/// Integer k x k mean of every sample, per channel, edge-replicated.
///
/// Shared with the adaptive threshold, which needs the same local mean.
pub(crate) fn box_mean(input: &ImageBuffer, k: usize) -> Vec<u8> {
    let (w, h, c) = (input.width() as usize, input.height() as usize, input.channels() as usize);
    let r = (k / 2) as isize;
    let src = input.samples();
    let stride = w * c;

    // horizontal window sums
    let mut sums = vec![0u32; w * h * c];
    sums.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * stride..(y + 1) * stride];
        for x in 0..w {
            for ch in 0..c {
                let mut acc = 0u32;
                for dx in -r..=r {
                    let sx = replicate(x as isize + dx, w);
                    acc += src_row[sx * c + ch] as u32;
                }
                row[x * c + ch] = acc;
            }
        }
    });

    // vertical window sums and rounding
    let area = (k * k) as u32;
    let half = area / 2;
    let mut out = vec![0u8; w * h * c];
    out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for (i, dst) in row.iter_mut().enumerate() {
            let mut acc = 0u32;
            for dy in -r..=r {
                let sy = replicate(y as isize + dy, h);
                acc += sums[sy * stride + i];
            }
            *dst = ((acc + half) / area) as u8;
        }
    });
    out
}

/// Apply the same 1-D kernel horizontally then vertically.
fn separable_filter(input: &ImageBuffer, kernel: &[f32]) -> Vec<u8> {
    let (w, h, c) = (input.width() as usize, input.height() as usize, input.channels() as usize);
    let r = (kernel.len() / 2) as isize;
    let src = input.samples();
    let stride = w * c;

    let mut tmp = vec![0f32; w * h * c];
    tmp.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * stride..(y + 1) * stride];
        for x in 0..w {
            for ch in 0..c {
                let mut acc = 0f32;
                for (j, &weight) in kernel.iter().enumerate() {
                    let sx = replicate(x as isize + j as isize - r, w);
                    acc += weight * src_row[sx * c + ch] as f32;
                }
                row[x * c + ch] = acc;
            }
        }
    });

    let mut out = vec![0u8; w * h * c];
    out.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for (i, dst) in row.iter_mut().enumerate() {
            let mut acc = 0f32;
            for (j, &weight) in kernel.iter().enumerate() {
                let sy = replicate(y as isize + j as isize - r, h);
                acc += weight * tmp[sy * stride + i];
            }
            *dst = acc.round().clamp(0.0, 255.0) as u8;
        }
    });
    out
}
