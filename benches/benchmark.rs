use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use transform_lab::ops::{ids, params};
use transform_lab::{ExecutionEngine, ImageBuffer, ParameterBinding, RunRequest};

fn test_image(width: u32, height: u32) -> ImageBuffer {
    ImageBuffer::from_fn_rgb(width, height, |x, y| [(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
        .expect("valid benchmark image")
}

pub fn builtin_benchmark(c: &mut Criterion) {
    let engine = ExecutionEngine::default();
    let colour = test_image(256, 256);
    let gray = colour.to_grayscale();

    let mut group = c.benchmark_group("builtin_256x256");
    for descriptor in engine.list_algorithms() {
        let binding = ParameterBinding::defaults(descriptor);
        let input = if descriptor.accepts.accepts(3) { &colour } else { &gray };
        group.bench_function(descriptor.id, |b| {
            b.iter(|| engine.run(black_box(descriptor.id), black_box(&binding), black_box(input)))
        });
    }
    group.finish();
}

pub fn kernel_size_benchmark(c: &mut Criterion) {
    let engine = ExecutionEngine::default();
    let img = test_image(256, 256);

    let mut group = c.benchmark_group("mean_blur_kernel");
    for k in [3i64, 9, 15, 31] {
        let binding = ParameterBinding::new().with(params::KERNEL_SIZE, k);
        group.bench_with_input(BenchmarkId::from_parameter(k), &binding, |b, binding| {
            b.iter(|| engine.run(ids::MEAN_BLUR, black_box(binding), black_box(&img)))
        });
    }
    group.finish();
}

pub fn batch_benchmark(c: &mut Criterion) {
    let engine = ExecutionEngine::default();
    let images: Vec<ImageBuffer> = (0..16).map(|_| test_image(128, 128)).collect();
    let binding = engine.default_binding(ids::GAUSSIAN_BLUR).expect("built-in id");
    let requests: Vec<RunRequest<'_>> = images
        .iter()
        .map(|img| RunRequest::new(ids::GAUSSIAN_BLUR, &binding, img))
        .collect();

    c.bench_function("batch_16_gaussian", |b| b.iter(|| engine.run_batch(black_box(&requests))));
    c.bench_function("sequential_16_gaussian", |b| {
        b.iter(|| requests.iter().map(|r| engine.run_request(black_box(r))).collect::<Vec<_>>())
    });
}

criterion_group!(benches, builtin_benchmark, kernel_size_benchmark, batch_benchmark);
criterion_main!(benches);
