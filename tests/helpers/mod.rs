//! Test helpers and fixtures for sabre integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `DSP_EPSILON` (1e-4): DSP processing (windows, overlap-add)
//! - `FREQUENCY_TOLERANCE` (3%): Dominant frequency after time-stretching

#![allow(dead_code)]

pub mod tolerances;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sabre::prelude::*;

/// Low sample rate keeps WSOLA tests fast while leaving room for a few
/// hundred Hz of content.
pub const TEST_SAMPLE_RATE: f64 = 8000.0;

/// Render quantum used by the consumer in every test.
pub const TEST_QUANTUM: usize = 128;

/// Region plus a producer handle, for tests that attach their own consumer.
pub fn test_region(channels: usize, frames: usize) -> (Arc<SharedRegion>, RingBuffer) {
    let region = Arc::new(SharedRegion::with_frames(channels, frames).expect("region"));
    let producer = RingBuffer::new(region.clone(), channels).expect("producer");
    (region, producer)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// Ascending ramp, so dropped or reordered frames are easy to spot.
pub fn generate_ramp(start: usize, num_samples: usize) -> Vec<f32> {
    (start..start + num_samples).map(|i| i as f32).collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Dominant frequency estimated from positive-going zero crossings.
pub fn zero_crossing_frequency(samples: &[f32], sample_rate: f64) -> f64 {
    let crossings = samples
        .windows(2)
        .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
        .count();
    crossings as f64 * sample_rate / samples.len() as f64
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Read mono quanta from `source` until it comes back short, returning
/// everything read.
pub fn drain_mono<S: FrameSource>(source: &mut S, max_frames: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(max_frames);
    let mut quantum = vec![0.0f32; TEST_QUANTUM];
    while out.len() < max_frames {
        let n = source
            .read(&mut [&mut quantum[..]], TEST_QUANTUM)
            .unwrap_or(0);
        out.extend_from_slice(&quantum[..n]);
        if n < TEST_QUANTUM {
            break;
        }
    }
    out
}
