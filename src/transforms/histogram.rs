// src/transforms/histogram.rs
//
// Histogram equalization through a CDF lookup table.

use super::output_buffer;
use crate::buffer::{ImageBuffer, GRAY};
use crate::engine::registry::TransformOutput;
use crate::error::TransformError;
use crate::ops::ids;
use crate::schema::{AlgorithmDescriptor, ChannelSet, OutputChannels, ParameterBinding};
use rayon::prelude::*;

const CHUNK: usize = 64 * 1024;

pub fn equalize_descriptor() -> AlgorithmDescriptor {
    AlgorithmDescriptor::new(ids::EQUALIZE_HIST, "Histogram equalization")
        .summary("Spreads intensities so the output histogram is approximately uniform. Grayscale input only.")
        .accepts(ChannelSet::GRAY)
        .output(OutputChannels::Single)
}

/// 256-bin histogram of a sample slice.
pub fn compute_histogram(samples: &[u8]) -> [u64; 256] {
    samples
        .par_chunks(CHUNK)
        .fold(
            || [0u64; 256],
            |mut hist, chunk| {
                for &v in chunk {
                    hist[v as usize] += 1;
                }
                hist
            },
        )
        .reduce(
            || [0u64; 256],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x += y;
                }
                a
            },
        )
}

/// Lookup table `round((cdf[v] - cdf_min) * 255 / (N - cdf_min))`.
///
/// `None` when every sample has the same value.
pub fn equalization_lut(hist: &[u64; 256]) -> Option<[u8; 256]> {
    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (c, &h) in cdf.iter_mut().zip(hist.iter()) {
        running += h;
        *c = running;
    }
    let total = running;
    let cdf_min = cdf.iter().copied().find(|&v| v > 0)?;
    let denom = total - cdf_min;
    if denom == 0 {
        return None;
    }

    let mut lut = [0u8; 256];
    for (entry, &c) in lut.iter_mut().zip(cdf.iter()) {
        let num = c.saturating_sub(cdf_min) * 255;
        *entry = ((num + denom / 2) / denom).min(255) as u8;
    }
    Some(lut)
}

pub fn equalize_hist(input: &ImageBuffer, _binding: &ParameterBinding) -> Result<TransformOutput, TransformError> {
    if input.channels() != GRAY {
        return Err(TransformError::new(format!(
            "histogram equalization needs 1 channel, got {}",
            input.channels()
        )));
    }
    let hist = compute_histogram(input.samples());
    let Some(lut) = equalization_lut(&hist) else {
        return Ok(TransformOutput::new(input.clone())
            .with_diagnostic("image has a single intensity; equalization leaves it unchanged"));
    };

    let samples = input.samples().par_iter().map(|&v| lut[v as usize]).collect();
    let buffer = output_buffer(input.width(), input.height(), GRAY, samples)?;
    Ok(TransformOutput::new(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_counts_every_sample() {
        let samples: Vec<u8> = (0..=255u8).chain([7, 7, 7]).collect();
        let hist = compute_histogram(&samples);
        assert_eq!(hist.iter().sum::<u64>(), 259);
        assert_eq!(hist[7], 4);
        assert_eq!(hist[0], 1);
    }

    #[test]
    fn two_levels_map_to_extremes() {
        let img = ImageBuffer::from_fn_gray(4, 2, |x, _| if x < 2 { 100 } else { 110 }).unwrap();
        let out = equalize_hist(&img, &ParameterBinding::new()).unwrap();
        assert!(out.diagnostic.is_none());
        let samples = out.buffer.samples();
        assert!(samples.iter().all(|&v| v == 0 || v == 255));
        assert_eq!(out.buffer.pixel(0, 0), &[0]);
        assert_eq!(out.buffer.pixel(3, 1), &[255]);
    }

    #[test]
    fn lut_is_monotonic_and_spans_range() {
        let img = ImageBuffer::from_fn_gray(16, 16, |x, y| (60 + (x + y) * 2) as u8).unwrap();
        let hist = compute_histogram(img.samples());
        let lut = equalization_lut(&hist).unwrap();
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));

        let out = equalize_hist(&img, &ParameterBinding::new()).unwrap().buffer;
        assert_eq!(*out.samples().iter().min().unwrap(), 0);
        assert_eq!(*out.samples().iter().max().unwrap(), 255);
    }

    #[test]
    fn constant_image_is_returned_unchanged() {
        let img = ImageBuffer::filled(5, 5, 1, 42).unwrap();
        let out = equalize_hist(&img, &ParameterBinding::new()).unwrap();
        assert_eq!(out.buffer, img);
        assert!(out.diagnostic.is_some());
    }

    #[test]
    fn colour_input_is_refused() {
        let img = ImageBuffer::filled(2, 2, 3, 42).unwrap();
        assert!(equalize_hist(&img, &ParameterBinding::new()).is_err());
    }
}
