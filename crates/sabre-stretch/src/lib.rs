//! Pitch-preserving time-stretching for the sabre ring buffer.
//!
//! Speeds playback up or slows it down without changing pitch, using WSOLA
//! (waveform-similarity overlap-add) directly on the frames queued in a
//! [`sabre_core::RingBuffer`].
//!
//! # Features
//!
//! - **Drop-in reader**: [`TimeStretchEngine`] exposes the ring's `read`
//!   contract and implements [`sabre_core::FrameSource`]
//! - **Unit-rate bypass**: rate 1.0 forwards reads untouched
//! - **Lock-free rate control**: shared [`sabre_core::AtomicFloat`] handle
//! - **Similarity search**: decimated scan plus local refinement, see
//!   [`correlation`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sabre_core::{RingBuffer, SharedRegion};
//! use sabre_stretch::{StretchConfig, TimeStretchEngine};
//!
//! let region = Arc::new(SharedRegion::with_frames(2, 48000)?);
//! let producer = RingBuffer::new(region.clone(), 2)?;
//! let mut engine = TimeStretchEngine::new(region, StretchConfig::new(2, 48000.0).playback_rate(1.5))?;
//!
//! // producer thread: producer.write(&[&left, &right], frames)?;
//! // render thread:   engine.read(&mut [&mut out_l, &mut out_r], 128);
//! ```

// Error types
pub mod error;
pub use error::{Error, Result};

// Configuration
pub mod config;
pub use config::{StretchConfig, WsolaParams};

// State types
mod types;
pub use types::{EngineState, ExcludeInterval, HopKind};

// Similarity search
pub mod correlation;
pub use correlation::SearchScratch;

// WSOLA core
mod wsola;

mod engine;
pub use engine::TimeStretchEngine;
