use criterion::{black_box, criterion_group, criterion_main, Criterion};
use netwatch::spectral::{analyze, hann_window, magnitude_spectrum};
use netwatch::stats::ServerStats;
use rand::prelude::*;
use rand_distr::StandardNormal;

const SAMPLE_RATE_HZ: f64 = 20.0;
const EXPECTED_FREQ_HZ: f64 = 1.0;
const BANDWIDTH_HZ: f64 = 0.1;

fn pure_tone(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE_HZ;
            (2.0 * std::f64::consts::PI * EXPECTED_FREQ_HZ * t).sin()
        })
        .collect()
}

pub fn hann_window_2048(c: &mut Criterion) {
    c.bench_function("hann_window 2048", |b| {
        b.iter(|| hann_window(black_box(2048)))
    });
}

pub fn magnitude_spectrum_2048(c: &mut Criterion) {
    let samples = pure_tone(2048);
    let windowed: Vec<f64> = samples
        .iter()
        .zip(hann_window(samples.len()))
        .map(|(s, w)| s * w)
        .collect();
    c.bench_function("magnitude_spectrum 2048", |b| {
        b.iter(|| magnitude_spectrum(black_box(&windowed)))
    });
}

pub fn analyze_full_buffer(c: &mut Criterion) {
    let samples = pure_tone(2048);
    c.bench_function("analyze 2048-sample wave buffer", |b| {
        b.iter(|| analyze(black_box(&samples), SAMPLE_RATE_HZ, EXPECTED_FREQ_HZ, BANDWIDTH_HZ))
    });
}

pub fn analyze_noisy_buffer(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let samples: Vec<f64> = (0..2048).map(|_| rng.sample(StandardNormal)).collect();
    c.bench_function("analyze 2048-sample noise buffer", |b| {
        b.iter(|| analyze(black_box(&samples), SAMPLE_RATE_HZ, EXPECTED_FREQ_HZ, BANDWIDTH_HZ))
    });
}

pub fn record_packet_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("server_stats");
    group.bench_function("record_packet", |b| {
        let mut stats = ServerStats::new();
        let mut seq = 0i64;
        b.iter(|| {
            let t = seq as f64 / SAMPLE_RATE_HZ;
            let wave_sample = (2.0 * std::f64::consts::PI * EXPECTED_FREQ_HZ * t).sin();
            stats.record_packet(black_box(seq), t, t, wave_sample);
            seq += 1;
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    hann_window_2048,
    magnitude_spectrum_2048,
    analyze_full_buffer,
    analyze_noisy_buffer,
    record_packet_ingest,
);
criterion_main!(benches);
