// src/transforms/threshold.rs
//
// Fixed and adaptive (local mean) threshold segmentation.
// Colour input is reduced to luma first; output is always binary 0/255.

use super::blur::box_mean;
use super::{output_buffer, window_param};
use crate::buffer::{ImageBuffer, GRAY};
use crate::engine::registry::TransformOutput;
use crate::error::TransformError;
use crate::ops::{ids, params};
use crate::schema::{AlgorithmDescriptor, ChannelSet, Constraint, OutputChannels, ParameterBinding, ParameterSpec};
use rayon::prelude::*;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

pub fn threshold_descriptor() -> AlgorithmDescriptor {
    AlgorithmDescriptor::new(ids::THRESHOLD, "Fixed threshold")
        .summary("Samples brighter than the threshold become white, the rest black.")
        .accepts(ChannelSet::GRAY | ChannelSet::RGB)
        .output(OutputChannels::Single)
        .param(ParameterSpec::int(params::THRESHOLD, "Threshold", 0, 255, 1, 127))
}

pub fn adaptive_threshold_descriptor() -> AlgorithmDescriptor {
    AlgorithmDescriptor::new(ids::ADAPTIVE_THRESHOLD, "Adaptive mean threshold")
        .summary("Compares each sample with the mean of its neighbourhood minus an offset.")
        .accepts(ChannelSet::GRAY | ChannelSet::RGB)
        .output(OutputChannels::Single)
        .param(
            ParameterSpec::int(params::BLOCK_SIZE, "Block size", 3, 51, 2, 11).with_constraint(Constraint::Odd),
        )
        .param(ParameterSpec::int(params::OFFSET, "Offset", -50, 50, 1, 2))
}

/// Attach a hint when the whole image landed on one side of the threshold.
fn finish(width: u32, height: u32, samples: Vec<u8>) -> Result<TransformOutput, TransformError> {
    let hint = match samples.first() {
        Some(&first) if samples.iter().all(|&v| v == first) => Some(if first == FOREGROUND {
            "every sample is above the threshold; output is all white"
        } else {
            "no sample is above the threshold; output is all black"
        }),
        _ => None,
    };
    let output = TransformOutput::new(output_buffer(width, height, GRAY, samples)?);
    Ok(match hint {
        Some(hint) => output.with_diagnostic(hint),
        None => output,
    })
}

/// `255 if v > threshold else 0`.
pub fn threshold(input: &ImageBuffer, binding: &ParameterBinding) -> Result<TransformOutput, TransformError> {
    let t = binding.int(params::THRESHOLD)?;
    let gray = input.to_grayscale();
    let samples = gray
        .samples()
        .par_iter()
        .map(|&v| if (v as i64) > t { FOREGROUND } else { BACKGROUND })
        .collect();
    finish(input.width(), input.height(), samples)
}

/// `255 if v > local_mean - offset else 0`, mean over a blockSize x blockSize window.
pub fn adaptive_threshold(input: &ImageBuffer, binding: &ParameterBinding) -> Result<TransformOutput, TransformError> {
    let block = window_param(binding, params::BLOCK_SIZE)?;
    let offset = binding.int(params::OFFSET)?;
    if block % 2 == 0 {
        return Err(TransformError::new(format!("block size must be odd, got {block}")));
    }

    let gray = input.to_grayscale();
    let means = box_mean(&gray, block);
    let samples = gray
        .samples()
        .par_iter()
        .zip(means.par_iter())
        .map(|(&v, &mean)| {
            if (v as i64) > mean as i64 - offset {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
        .collect();
    finish(input.width(), input.height(), samples)
}
