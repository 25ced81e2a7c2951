#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use transform_lab::ops::ids;
use transform_lab::{ExecutionEngine, ImageBuffer, ParamValue, ParameterBinding};

#[derive(Arbitrary, Debug)]
struct ParamSeed {
    slot: u8,
    as_float: bool,
    int: i64,
    float: f64,
}

#[derive(Arbitrary, Debug)]
struct RunSeed {
    algorithm: u8,
    width: u8,
    height: u8,
    colour: bool,
    params: Vec<ParamSeed>,
}

const NAMES: [&str; 8] = ["kernelSize", "sigma", "low", "high", "threshold", "blockSize", "offset", "bogus"];

fn build_buffer(seed: &RunSeed, pixels: &[u8]) -> Option<ImageBuffer> {
    let width = seed.width as u32 % 48 + 1;
    let height = seed.height as u32 % 48 + 1;
    let channels = if seed.colour { 3 } else { 1 };
    let len = (width * height * channels as u32) as usize;
    let samples = (0..len)
        .map(|i| pixels.get(i % pixels.len().max(1)).copied().unwrap_or(0))
        .collect();
    ImageBuffer::new(width, height, channels, samples).ok()
}

fn seeds_to_binding(seeds: &[ParamSeed]) -> ParameterBinding {
    seeds
        .iter()
        .take(12)
        .map(|seed| {
            let name = NAMES[seed.slot as usize % NAMES.len()];
            let value = if seed.as_float {
                ParamValue::Float(seed.float)
            } else {
                ParamValue::Int(seed.int)
            };
            (name, value)
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let seed = match RunSeed::arbitrary(&mut u) {
        Ok(seed) => seed,
        Err(_) => return,
    };
    let Some(buffer) = build_buffer(&seed, u.take_rest()) else {
        return;
    };

    let engine = ExecutionEngine::default();
    let id = ids::ALL[seed.algorithm as usize % ids::ALL.len()];
    let binding = seeds_to_binding(&seed.params);

    // any binding either runs or reports a typed error
    if let Ok(out) = engine.run(id, &binding, &buffer) {
        assert_eq!(out.buffer.width(), buffer.width());
        assert_eq!(out.buffer.height(), buffer.height());
    }
});
