//! # Stretch Render
//!
//! Decode-thread → ring buffer → time-stretched render loop, written to a WAV
//! file instead of a sound card.
//!
//! **Concepts:** `Session::builder()`, `split()`, `Renderer`, playback rate
//!
//! ```bash
//! RUST_LOG=debug cargo run --example stretch_render
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sabre::prelude::*;

const SAMPLE_RATE: f64 = 44100.0;
const QUANTUM: usize = 128;
const SOURCE_SECONDS: f64 = 3.0;
const PLAYBACK_RATE: f32 = 1.5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let output_path =
        std::env::var("OUTPUT_WAV").unwrap_or_else(|_| "stretch_render.wav".to_string());

    let session = Session::builder()
        .channels(2)
        .sample_rate(SAMPLE_RATE)
        .buffer_seconds(0.25)
        .playback_rate(PLAYBACK_RATE)
        .build()?;
    let (producer, mut renderer) = session.split();

    // Decode thread: a two-note chord, written as space frees up.
    let finished = Arc::new(AtomicBool::new(false));
    let decoder = {
        let finished = finished.clone();
        thread::spawn(move || -> sabre::Result<()> {
            let total = (SOURCE_SECONDS * SAMPLE_RATE) as usize;
            let mut written = 0;
            let mut left = vec![0.0f32; 1024];
            let mut right = vec![0.0f32; 1024];
            while written < total {
                let chunk = producer.writable_frames().min(1024).min(total - written);
                if chunk == 0 {
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
                for i in 0..chunk {
                    let t = (written + i) as f64 / SAMPLE_RATE;
                    left[i] = (0.3 * (std::f64::consts::TAU * 440.0 * t).sin()) as f32;
                    right[i] = (0.3 * (std::f64::consts::TAU * 660.0 * t).sin()) as f32;
                }
                producer.write(&[&left[..chunk], &right[..chunk]], chunk)?;
                written += chunk;
            }
            tracing::debug!(frames = written, "decoder finished");
            finished.store(true, Ordering::Release);
            Ok(())
        })
    };

    // Render thread stand-in: one quantum at a time.
    let mut out_l = vec![0.0f32; QUANTUM];
    let mut out_r = vec![0.0f32; QUANTUM];
    let mut rendered: Vec<(f32, f32)> = Vec::new();
    loop {
        let source_done = finished.load(Ordering::Acquire);
        let n = renderer.render(&mut [&mut out_l[..], &mut out_r[..]]);
        rendered.extend(out_l[..n].iter().copied().zip(out_r[..n].iter().copied()));

        // Source exhausted: the engine can no longer fill a quantum.
        if n < QUANTUM && source_done {
            break;
        }
        if n == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    decoder
        .join()
        .map_err(|_| "decode thread panicked")??;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output_path, spec)?;
    for (l, r) in &rendered {
        writer.write_sample(*l)?;
        writer.write_sample(*r)?;
    }
    writer.finalize()?;

    let stats = renderer.stats();
    println!(
        "Rendered {:.2}s of audio from {:.2}s of source at {}x -> {}",
        rendered.len() as f64 / SAMPLE_RATE,
        SOURCE_SECONDS,
        PLAYBACK_RATE,
        output_path
    );
    println!(
        "  underrun frames: {}, clearing ticks: {}",
        stats.underrun_frames, stats.clearing_ticks
    );

    Ok(())
}
