//! Correlation search and stretched read benchmarks.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sabre_core::{RingBuffer, SharedRegion};
use sabre_stretch::correlation::optimal_index;
use sabre_stretch::{ExcludeInterval, SearchScratch, StretchConfig, TimeStretchEngine};

const SAMPLE_RATE: f64 = 44100.0;
const QUANTUM: usize = 128;

fn noise(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

fn bench_optimal_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimal_index");

    for &channels in &[1usize, 2] {
        let config = StretchConfig::new(channels, SAMPLE_RATE);
        let candidates = config.candidate_frames();
        let window = config.window_frames();
        let search = noise((candidates + window - 1) * channels, 1);
        let target = noise(window * channels, 2);
        let mut scratch = SearchScratch::new(channels, candidates);

        group.throughput(Throughput::Elements(candidates as u64));
        group.bench_with_input(
            BenchmarkId::new("channels", channels),
            &channels,
            |b, &channels| {
                b.iter(|| {
                    black_box(optimal_index(
                        black_box(&search),
                        black_box(&target),
                        ExcludeInterval::around(candidates as i64 / 2, 80),
                        channels,
                        5,
                        &mut scratch,
                    ))
                })
            },
        );
    }

    group.finish();
}

fn bench_engine_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_read");
    group.throughput(Throughput::Elements(QUANTUM as u64));

    for &rate in &[1.0f32, 0.75, 1.5] {
        let region = Arc::new(SharedRegion::with_frames(2, 16384).unwrap());
        let producer = RingBuffer::new(region.clone(), 2).unwrap();
        let config = StretchConfig::new(2, SAMPLE_RATE).playback_rate(rate);
        let mut engine = TimeStretchEngine::new(region, config).unwrap();

        let chunk = noise(4 * QUANTUM, 3);
        let mut left = vec![0.0f32; QUANTUM];
        let mut right = vec![0.0f32; QUANTUM];

        group.bench_with_input(BenchmarkId::new("rate", rate), &rate, |b, _| {
            b.iter(|| {
                if producer.writable_frames() >= chunk.len() {
                    producer
                        .write(&[&chunk[..], &chunk[..]], chunk.len())
                        .unwrap();
                }
                black_box(engine.read(&mut [&mut left[..], &mut right[..]], QUANTUM))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_optimal_index, bench_engine_read);
criterion_main!(benches);
