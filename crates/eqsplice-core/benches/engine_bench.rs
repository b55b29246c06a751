//! Criterion benchmarks for the equalizer engine
//!
//! Run with: cargo bench -p eqsplice-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use eqsplice_core::{
    AudioGraph, Biquad, Compensation, EqualizerEngine, MemoryGraph, peaking_eq_coefficients,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_peaking_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("PeakingBiquad");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut biquad = Biquad::new();
                biquad.set_coefficients(peaking_eq_coefficients(1000.0, 1.0, 6.0, SAMPLE_RATE));
                b.iter(|| {
                    for &sample in &input {
                        black_box(biquad.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(peaking_eq_coefficients(
                black_box(1000.0),
                black_box(1.0),
                black_box(6.0),
                SAMPLE_RATE,
            ))
        });
    });

    group.finish();
}

fn bench_compensation(c: &mut Criterion) {
    let comp = Compensation::default();
    let gains = [3.0, 6.0, 9.0, 7.0, 6.0, 5.0, 7.0, 9.0, 11.0, 8.0];
    c.bench_function("compensation_db", |b| {
        b.iter(|| black_box(comp.compensation_db(black_box(gains))));
    });
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("EqualizerEngine");

    group.bench_function("set_band_gain", |b| {
        let mut host = MemoryGraph::new(SAMPLE_RATE);
        let ctx = host.create_context();
        let mut eq = EqualizerEngine::new(&mut host, ctx).unwrap();
        eq.set_enabled(&mut host, true).unwrap();
        let mut i = 0usize;
        b.iter(|| {
            eq.set_band_gain(&mut host, i % 10, black_box(4.5)).unwrap();
            i += 1;
        });
    });

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("render", block_size),
            &block_size,
            |b, &frames| {
                let mut host = MemoryGraph::new(SAMPLE_RATE);
                let ctx = host.create_context();
                let mut eq = EqualizerEngine::new(&mut host, ctx).unwrap();
                let source = host
                    .create_buffer_source(ctx, generate_test_signal(frames))
                    .unwrap();
                let dest = host.destination(ctx).unwrap();
                host.connect(source, eq.input()).unwrap();
                host.connect(eq.output(), dest).unwrap();
                eq.set_enabled(&mut host, true).unwrap();
                eq.set_band_gain(&mut host, 5, 6.0).unwrap();
                b.iter(|| black_box(host.render(ctx, frames).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_peaking_biquad, bench_compensation, bench_engine);
criterion_main!(benches);
