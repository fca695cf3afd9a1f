//! Pitch-preserving time-stretch over a shared ring buffer.

use std::sync::Arc;

use sabre_core::{AtomicFloat, FrameSource, RingBuffer, SharedRegion};

use crate::config::{is_valid_rate, StretchConfig};
use crate::types::{EngineState, HopKind};
use crate::wsola::Wsola;
use crate::Result;

/// Consumer-side reader that plays the ring's audio at a different speed
/// without changing its pitch.
///
/// Presents the same `read` contract as [`RingBuffer`]. At rate 1.0 reads are
/// forwarded unchanged; at any other rate the engine runs WSOLA, pulling
/// source frames through the ring's reader critical section and releasing
/// them as hops are synthesized.
///
/// ## RT-Safety
///
/// All working buffers are allocated in [`new`](Self::new). `read` never
/// allocates, locks or logs, and must only be called from the consumer thread.
///
/// # Example
///
/// ```ignore
/// let mut engine = TimeStretchEngine::new(region, StretchConfig::new(2, 48000.0))?;
/// engine.update_playback_rate(1.25);
/// let n = engine.read(&mut [&mut left[..], &mut right[..]], 128);
/// ```
#[derive(Debug)]
pub struct TimeStretchEngine {
    ring: RingBuffer,
    rate: Arc<AtomicFloat>,
    /// Last sanitized rate seen by `read`.
    applied_rate: f32,
    wsola: Wsola,
    state: EngineState,
    sample_rate: f64,
}

impl TimeStretchEngine {
    pub fn new(region: Arc<SharedRegion>, config: StretchConfig) -> Result<Self> {
        config.validate()?;
        let ring = RingBuffer::new(region, config.channel_count)?;
        let wsola = Wsola::new(&config);

        tracing::debug!(
            channels = config.channel_count,
            sample_rate = config.sample_rate,
            playback_rate = config.playback_rate,
            window_frames = wsola.window_frames(),
            hop_frames = wsola.hop_frames(),
            candidate_frames = wsola.candidate_frames(),
            "Created time-stretch engine"
        );

        Ok(Self {
            ring,
            rate: Arc::new(AtomicFloat::new(config.playback_rate)),
            applied_rate: config.playback_rate,
            wsola,
            state: EngineState::Idle,
            sample_rate: config.sample_rate,
        })
    }

    /// Read up to `frames` frames of stretched audio into per-channel slices.
    ///
    /// Returns `None` while the producer is clearing. A short count means not
    /// enough source audio is queued; retry on the next quantum.
    pub fn read(&mut self, channels: &mut [&mut [f32]], frames: usize) -> Option<usize> {
        let rate = self.sanitized_rate();

        if rate == 1.0 {
            if self.state != EngineState::Passthrough {
                self.wsola.reset();
                self.state = EngineState::Passthrough;
            }
            return self.ring.read(channels, frames);
        }
        if self.state == EngineState::Passthrough {
            self.wsola.reset();
            self.state = EngineState::Idle;
        }

        let frames = channels.iter().map(|c| c.len()).fold(frames, usize::min);
        let guard = self.ring.begin_read()?;
        let rate = rate as f64;

        let mut rendered = 0;
        let mut synthesized = false;
        loop {
            rendered += self
                .wsola
                .write_completed_frames_to(channels, rendered, frames - rendered);
            if rendered == frames {
                self.state = if synthesized {
                    EngineState::Iterating
                } else {
                    EngineState::Draining
                };
                break;
            }
            if !self.wsola.iterate(&guard, rate) {
                self.state = EngineState::Blocked;
                break;
            }
            synthesized = true;
        }
        Some(rendered)
    }

    /// Rate from the shared cell, clamped to the supported range. A
    /// non-finite value keeps the previous rate.
    #[inline]
    fn sanitized_rate(&mut self) -> f32 {
        let rate = self.rate.get();
        if rate.is_finite() {
            self.applied_rate = rate.clamp(StretchConfig::MIN_RATE, StretchConfig::MAX_RATE);
        }
        self.applied_rate
    }

    /// Change the playback rate. Clamped to the supported range; non-finite
    /// values are ignored.
    pub fn update_playback_rate(&self, rate: f32) {
        if !rate.is_finite() {
            tracing::debug!(rate, "Ignoring non-finite playback rate");
            return;
        }
        let clamped = rate.clamp(StretchConfig::MIN_RATE, StretchConfig::MAX_RATE);
        if !is_valid_rate(rate) {
            tracing::debug!(requested = rate, clamped, "Playback rate clamped");
        }
        let previous = self.rate.swap(clamped);
        if previous != clamped {
            tracing::debug!(previous, rate = clamped, "Playback rate updated");
        }
    }

    pub fn playback_rate(&self) -> f32 {
        self.rate.get()
    }

    /// Shared rate cell, for a control thread to change the rate lock-free.
    /// Values written here are clamped when the next read picks them up, and
    /// non-finite ones are ignored.
    pub fn playback_rate_handle(&self) -> Arc<AtomicFloat> {
        Arc::clone(&self.rate)
    }

    /// Forget all stretching progress, e.g. after the producer cleared the
    /// ring on a seek. Keeps every buffer allocated.
    pub fn reset(&mut self) {
        self.wsola.reset();
        if self.state != EngineState::Passthrough {
            self.state = EngineState::Idle;
        }
        tracing::debug!("Time-stretch engine reset");
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// How the most recent hop was chosen, `None` before the first hop.
    pub fn last_hop(&self) -> Option<HopKind> {
        self.wsola.last_hop()
    }

    /// Source frames queued in the ring, not yet released by the engine.
    pub fn readable_source_frames(&self) -> usize {
        self.ring.readable_frames()
    }

    /// Stretched frames synthesized but not yet read.
    pub fn queued_output_frames(&self) -> usize {
        self.wsola.complete_frames()
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    pub fn channel_count(&self) -> usize {
        self.ring.channel_count()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn window_frames(&self) -> usize {
        self.wsola.window_frames()
    }

    /// Output frames produced per WSOLA iteration.
    pub fn hop_frames(&self) -> usize {
        self.wsola.hop_frames()
    }

    pub fn candidate_frames(&self) -> usize {
        self.wsola.candidate_frames()
    }

    /// Source frames that must be queued beyond the search cursor before a
    /// hop can be synthesized.
    pub fn search_frames(&self) -> usize {
        self.wsola.search_frames()
    }
}

impl FrameSource for TimeStretchEngine {
    fn channel_count(&self) -> usize {
        TimeStretchEngine::channel_count(self)
    }

    fn read(&mut self, channels: &mut [&mut [f32]], frames: usize) -> Option<usize> {
        TimeStretchEngine::read(self, channels, frames)
    }

    fn ring(&self) -> &RingBuffer {
        &self.ring
    }
}
