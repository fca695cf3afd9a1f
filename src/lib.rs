//! # Sabre - Shared Audio Buffer Ring Engine
//!
//! Real-time PCM transport between a decode thread and an audio render
//! callback, with optional pitch-preserving time-stretching.
//!
//! ## Architecture
//!
//! Sabre is an umbrella crate that coordinates:
//! - **sabre-core** - Shared region, lock-free ring buffer, transport signals,
//!   render-quantum driver, playhead
//! - **sabre-stretch** - WSOLA time-stretch engine and similarity search
//!
//! ## Quick Start
//!
//! ```ignore
//! use sabre::prelude::*;
//!
//! let session = Session::builder()
//!     .channels(2)
//!     .sample_rate(48000.0)
//!     .playback_rate(1.5)
//!     .build()?;
//! let (producer, mut renderer) = session.split();
//!
//! // Decode thread
//! producer.write(&[&left, &right], frames)?;
//!
//! // Render callback, once per quantum
//! renderer.render(&mut [&mut out_l, &mut out_r]);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Ring buffer transport plus time-stretching
//! - `stretch` - WSOLA time-stretch engine

/// Re-export of sabre-core for direct access
pub use sabre_core as core;

// Core types
pub use sabre_core::{
    // Lock-free primitives
    AtomicFloat,
    // Consumer side
    FrameSource,
    HeaderField,
    Playhead,
    ReaderGuard,
    RenderStats,
    Renderer,
    // Transport
    RingBuffer,
    SharedRegion,
    CLEAR_WAIT_TIMEOUT,
    HEADER_BYTES,
    MAX_CHANNELS,
    MAX_FRAME,
    SAMPLE_BYTES,
};

// Time-stretching
#[cfg(feature = "stretch")]
pub use sabre_stretch as stretch;

#[cfg(feature = "stretch")]
pub use sabre_stretch::{EngineState, HopKind, StretchConfig, TimeStretchEngine, WsolaParams};

pub mod error;
pub use error::{Error, Result};

mod builder;
mod session;

pub use builder::SessionBuilder;
pub use session::{Session, SessionSource};

/// Convenience prelude for common imports
pub mod prelude {
    // Session
    pub use crate::{Session, SessionBuilder};

    // Transport
    pub use crate::core::{FrameSource, Playhead, Renderer, RingBuffer, SharedRegion};

    // Time-stretching
    #[cfg(feature = "stretch")]
    pub use crate::stretch::{StretchConfig, TimeStretchEngine};
}
