//! Producer/consumer pair over one shared region.

use std::sync::Arc;

use sabre_core::{Playhead, Renderer, RingBuffer, SharedRegion};

use crate::SessionBuilder;

/// Source the consumer side of a [`Session`] renders from.
#[cfg(feature = "stretch")]
pub type SessionSource = crate::stretch::TimeStretchEngine;

/// Source the consumer side of a [`Session`] renders from.
#[cfg(not(feature = "stretch"))]
pub type SessionSource = RingBuffer;

/// One playback session: the decode side writes into `producer`, the render
/// callback drives `renderer`. Split it to move each half to its thread.
#[derive(Debug)]
pub struct Session {
    region: Arc<SharedRegion>,
    producer: RingBuffer,
    renderer: Renderer<SessionSource>,
    sample_rate: f64,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub(crate) fn new(
        region: Arc<SharedRegion>,
        producer: RingBuffer,
        renderer: Renderer<SessionSource>,
        sample_rate: f64,
    ) -> Self {
        Self {
            region,
            producer,
            renderer,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.producer.channel_count()
    }

    pub fn region(&self) -> &Arc<SharedRegion> {
        &self.region
    }

    /// Producer handle. Also carries the transport signals for the player.
    pub fn producer(&self) -> &RingBuffer {
        &self.producer
    }

    pub fn renderer(&self) -> &Renderer<SessionSource> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<SessionSource> {
        &mut self.renderer
    }

    /// Playhead starting at the current frame position.
    pub fn playhead(&self) -> Playhead {
        let mut playhead = Playhead::new();
        playhead.mark_cleared(self.producer.current_frame(), 0);
        playhead
    }

    /// Flush queued audio for a seek to `seek_offset` source frames and
    /// return the playhead to track the new position with.
    ///
    /// Only valid while the renderer is still held by this session; after
    /// [`split`](Self::split), clear the producer and reset the source on
    /// their own threads.
    pub fn seek(&mut self, seek_offset: u64) -> Playhead {
        self.producer.clear();
        #[cfg(feature = "stretch")]
        self.renderer.source_mut().reset();

        let mut playhead = Playhead::new();
        playhead.mark_cleared(self.producer.current_frame(), seek_offset);
        playhead
    }

    pub fn split(self) -> (RingBuffer, Renderer<SessionSource>) {
        (self.producer, self.renderer)
    }
}
