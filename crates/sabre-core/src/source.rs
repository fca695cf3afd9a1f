//! Consumer-side read contract.

use crate::RingBuffer;

/// Anything the render thread can pull interleaved-channel audio from.
///
/// Implemented by [`RingBuffer`] and by stretching wrappers over it, so the
/// render callback does not care whether time-stretching is active.
pub trait FrameSource {
    fn channel_count(&self) -> usize;

    /// Fill up to `frames` frames into per-channel slices.
    ///
    /// `None` means "no data this tick" (the producer is clearing); a short
    /// count means the source ran dry. Callers treat both the same way.
    fn read(&mut self, channels: &mut [&mut [f32]], frames: usize) -> Option<usize>;

    /// Ring whose header carries the transport signals for this source.
    fn ring(&self) -> &RingBuffer;
}

impl FrameSource for RingBuffer {
    fn channel_count(&self) -> usize {
        RingBuffer::channel_count(self)
    }

    fn read(&mut self, channels: &mut [&mut [f32]], frames: usize) -> Option<usize> {
        RingBuffer::read(self, channels, frames)
    }

    fn ring(&self) -> &RingBuffer {
        self
    }
}
