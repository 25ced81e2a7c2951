// src/transforms/edges.rs
//
// Canny edge detection on the luma plane.
//
// Pipeline: 3x3 Sobel (edge-replicated) -> L1 magnitude -> non-maximum
// suppression along the quantized gradient direction -> double threshold
// -> hysteresis over 8-connected neighbours. No pre-blur is applied; chain a
// Gaussian blur first when the input is noisy.

use super::{output_buffer, replicate};
use crate::buffer::{ImageBuffer, GRAY};
use crate::engine::registry::TransformOutput;
use crate::error::TransformError;
use crate::ops::{ids, params};
use crate::schema::{
    AlgorithmDescriptor, ChannelSet, CrossConstraint, OutputChannels, ParameterBinding, ParameterSpec,
};
use rayon::prelude::*;

const TAN_22_5_DEG: f32 = 0.414_213_56;
const TAN_67_5_DEG: f32 = 2.414_213_6;

/// Edge density below which a "few edges" hint is attached.
pub const SPARSE_EDGE_RATIO: f64 = 0.001;
/// Edge density above which a "dense edges" hint is attached.
pub const DENSE_EDGE_RATIO: f64 = 0.25;

const EDGE: u8 = 255;

pub fn canny_descriptor() -> AlgorithmDescriptor {
    AlgorithmDescriptor::new(ids::CANNY, "Canny edge detection")
        .summary("Thin edges from gradient magnitude with hysteresis between a low and a high threshold.")
        .accepts(ChannelSet::GRAY | ChannelSet::RGB)
        .output(OutputChannels::Single)
        .param(ParameterSpec::int(params::LOW, "Low threshold", 0, 255, 1, 100))
        .param(ParameterSpec::int(params::HIGH, "High threshold", 0, 255, 1, 200))
        .cross(CrossConstraint::AtLeast {
            param: params::HIGH,
            other: params::LOW,
        })
}

/// Sobel responses of a single-channel plane.
struct Gradients {
    gx: Vec<i32>,
    gy: Vec<i32>,
    mag: Vec<i32>,
}

fn sobel(gray: &[u8], w: usize, h: usize) -> Gradients {
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];

    gx.par_chunks_mut(w)
        .zip(gy.par_chunks_mut(w))
        .enumerate()
        .for_each(|(y, (gx_row, gy_row))| {
            let up = &gray[replicate(y as isize - 1, h) * w..][..w];
            let mid = &gray[y * w..][..w];
            let down = &gray[replicate(y as isize + 1, h) * w..][..w];
            for x in 0..w {
                let l = replicate(x as isize - 1, w);
                let r = replicate(x as isize + 1, w);
                let px = |row: &[u8], i: usize| row[i] as i32;

                gx_row[x] = (px(up, r) + 2 * px(mid, r) + px(down, r))
                    - (px(up, l) + 2 * px(mid, l) + px(down, l));
                gy_row[x] = (px(down, l) + 2 * px(down, x) + px(down, r))
                    - (px(up, l) + 2 * px(up, x) + px(up, r));
            }
        });

    let mag = gx.iter().zip(&gy).map(|(a, b)| a.abs() + b.abs()).collect();
    Gradients { gx, gy, mag }
}

/// Magnitude at (x, y), zero outside the plane.
#[inline]
fn mag_at(mag: &[i32], w: usize, h: usize, x: isize, y: isize) -> i32 {
    if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
        0
    } else {
        mag[y as usize * w + x as usize]
    }
}

/// True when (x, y) is a local maximum across the edge.
fn is_local_max(g: &Gradients, w: usize, h: usize, x: usize, y: usize) -> bool {
    let i = y * w + x;
    let m = g.mag[i];
    let (gx, gy) = (g.gx[i], g.gy[i]);
    let (ax, ay) = (gx.abs() as f32, gy.abs() as f32);
    let (xi, yi) = (x as isize, y as isize);

    let (before, after) = if ay <= ax * TAN_22_5_DEG {
        // horizontal gradient, vertical edge
        ((xi - 1, yi), (xi + 1, yi))
    } else if ay >= ax * TAN_67_5_DEG {
        ((xi, yi - 1), (xi, yi + 1))
    } else if (gx >= 0) == (gy >= 0) {
        ((xi - 1, yi - 1), (xi + 1, yi + 1))
    } else {
        ((xi + 1, yi - 1), (xi - 1, yi + 1))
    };

    // strict on one side so a flat ridge two pixels wide keeps one pixel
    m > mag_at(&g.mag, w, h, before.0, before.1) && m >= mag_at(&g.mag, w, h, after.0, after.1)
}

/// Canny edge map; output samples are 0 or 255.
pub fn canny(input: &ImageBuffer, binding: &ParameterBinding) -> Result<TransformOutput, TransformError> {
    let low = binding.int(params::LOW)?;
    let high = binding.int(params::HIGH)?;
    if high < low {
        return Err(TransformError::new(format!("high threshold {high} is below low threshold {low}")));
    }
    let (low, high) = (low as i32, high as i32);

    let gray = input.to_grayscale();
    let (w, h) = (input.width() as usize, input.height() as usize);
    let grads = sobel(gray.samples(), w, h);

    // 0 = none, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    class.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, c) in row.iter_mut().enumerate() {
            let m = grads.mag[y * w + x];
            if m > low && is_local_max(&grads, w, h, x, y) {
                *c = if m > high { 2 } else { 1 };
            }
        }
    });

    let mut out = vec![0u8; w * h];
    let mut stack: Vec<usize> = class
        .iter()
        .enumerate()
        .filter(|(_, &c)| c == 2)
        .map(|(i, _)| i)
        .collect();
    for &i in &stack {
        out[i] = EDGE;
    }
    while let Some(i) = stack.pop() {
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if class[j] == 1 && out[j] == 0 {
                    out[j] = EDGE;
                    stack.push(j);
                }
            }
        }
    }

    let edges = out.iter().filter(|&&v| v == EDGE).count();
    let density = edges as f64 / (w * h) as f64;
    let buffer = output_buffer(input.width(), input.height(), GRAY, out)?;
    let output = TransformOutput::new(buffer);
    Ok(if density < SPARSE_EDGE_RATIO {
        output.with_diagnostic("few edges detected; try lowering the thresholds")
    } else if density > DENSE_EDGE_RATIO {
        output.with_diagnostic("dense edge map; try raising the thresholds or blurring first")
    } else {
        output
    })
}
