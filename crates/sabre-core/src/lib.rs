//! Real-time PCM transport over a shared memory region.
//!
//! # Primary API
//!
//! - [`SharedRegion`]: fixed-layout header + interleaved sample storage
//! - [`RingBuffer`]: single-producer / single-consumer frame transfer,
//!   `clear()` flush and transport signals (pause, background, frame position)
//! - [`Renderer`]: consumer-side render-quantum driver over any [`FrameSource`]
//! - [`Playhead`]: player-side track position from the wrapping frame counter
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sabre_core::{RingBuffer, SharedRegion};
//!
//! let region = Arc::new(SharedRegion::with_frames(2, 1024)?);
//! let producer = RingBuffer::new(region.clone(), 2)?;
//! let consumer = RingBuffer::new(region, 2)?;
//!
//! let left = [0.25f32; 128];
//! let right = [-0.25f32; 128];
//! producer.write(&[&left[..], &right[..]], 128)?;
//!
//! let mut out_l = [0.0f32; 128];
//! let mut out_r = [0.0f32; 128];
//! assert_eq!(consumer.read(&mut [&mut out_l[..], &mut out_r[..]], 128), Some(128));
//! # Ok::<(), sabre_core::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub(crate) mod compat;

pub mod region;
pub use region::{HeaderField, SharedRegion, HEADER_BYTES, SAMPLE_BYTES};

mod ring_buffer;
pub use ring_buffer::{ReaderGuard, RingBuffer, CLEAR_WAIT_TIMEOUT};

mod signals;
pub use signals::MAX_FRAME;

mod source;
pub use source::FrameSource;

mod render;
pub use render::{RenderStats, Renderer};

mod playhead;
pub use playhead::Playhead;

pub(crate) mod lockfree;
pub use lockfree::AtomicFloat;

/// Largest supported channel count.
pub const MAX_CHANNELS: usize = 32;
