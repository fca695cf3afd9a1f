//! Transport side channel carried in the region header.
//!
//! Each cell has exactly one writer role (the player for pause requests and
//! the background hint, the consumer for the paused flag and frame position),
//! so per-cell sequential consistency is all the ordering these need.

use crate::compat::Ordering;
use crate::region::HeaderField;
use crate::RingBuffer;

/// FramePosition wraps here: 8388608 render quanta of 128 frames.
pub const MAX_FRAME: u32 = 8_388_608 * 128;

impl RingBuffer {
    pub fn pause(&self) {
        self.cell(HeaderField::Paused).store(1, Ordering::SeqCst);
    }

    pub fn unpause(&self) {
        self.cell(HeaderField::Paused).store(0, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.cell(HeaderField::Paused).load(Ordering::SeqCst) == 1
    }

    /// Ask the consumer to pause once `after_frames` more frames have been
    /// rendered. Zero pauses at the next quantum.
    pub fn request_pause(&self, after_frames: u32) {
        self.cell(HeaderField::PauseRequested)
            .store(after_frames.saturating_add(1), Ordering::SeqCst);
    }

    /// Consume the pending pause request, if any. A request is observed
    /// exactly once.
    #[inline]
    pub fn take_pause_request(&self) -> Option<u32> {
        match self.cell(HeaderField::PauseRequested).swap(0, Ordering::SeqCst) {
            0 => None,
            encoded => Some(encoded - 1),
        }
    }

    pub fn set_backgrounded(&self, backgrounded: bool) {
        self.cell(HeaderField::Backgrounded)
            .store(backgrounded as u32, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_backgrounded(&self) -> bool {
        self.cell(HeaderField::Backgrounded).load(Ordering::SeqCst) == 1
    }

    #[inline]
    pub fn current_frame(&self) -> u32 {
        self.cell(HeaderField::FramePosition).load(Ordering::SeqCst)
    }

    /// Reset or reposition the frame counter, e.g. on track change.
    pub fn set_current_frame(&self, frame: u32) {
        self.cell(HeaderField::FramePosition)
            .store(frame % MAX_FRAME, Ordering::SeqCst);
    }

    /// Advance the frame counter by rendered frames. Consumer side only.
    #[inline]
    pub fn advance_current_frame(&self, frames: usize) {
        let cell = self.cell(HeaderField::FramePosition);
        let current = cell.load(Ordering::Relaxed) as u64;
        let next = (current + frames as u64) % MAX_FRAME as u64;
        cell.store(next as u32, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use crate::compat::Arc;
    use crate::{RingBuffer, SharedRegion};

    use super::MAX_FRAME;

    fn ring() -> RingBuffer {
        RingBuffer::new(Arc::new(SharedRegion::with_frames(2, 8).unwrap()), 2).unwrap()
    }

    #[test]
    fn test_pause_flag() {
        let ring = ring();
        assert!(!ring.is_paused());
        ring.pause();
        assert!(ring.is_paused());
        ring.unpause();
        assert!(!ring.is_paused());
    }

    #[test]
    fn test_pause_request_consumed_once() {
        let ring = ring();
        assert_eq!(ring.take_pause_request(), None);

        ring.request_pause(4410);
        assert_eq!(ring.take_pause_request(), Some(4410));
        assert_eq!(ring.take_pause_request(), None);

        ring.request_pause(12);
        assert_eq!(ring.take_pause_request(), Some(12));
    }

    #[test]
    fn test_immediate_pause_request_is_visible() {
        let ring = ring();
        ring.request_pause(0);
        assert_eq!(ring.take_pause_request(), Some(0));
        assert_eq!(ring.take_pause_request(), None);
    }

    #[test]
    fn test_background_flag() {
        let ring = ring();
        ring.set_backgrounded(true);
        assert!(ring.is_backgrounded());
        ring.set_backgrounded(false);
        assert!(!ring.is_backgrounded());
    }

    #[test]
    fn test_frame_position_wraps() {
        let ring = ring();
        ring.set_current_frame(MAX_FRAME - 100);
        ring.advance_current_frame(128);
        assert_eq!(ring.current_frame(), 28);

        ring.set_current_frame(0);
        ring.advance_current_frame(128);
        ring.advance_current_frame(128);
        assert_eq!(ring.current_frame(), 256);
    }

    #[test]
    fn test_signals_shared_between_handles() {
        let producer = ring();
        let consumer = producer.clone();
        producer.request_pause(7);
        assert_eq!(consumer.take_pause_request(), Some(7));
        consumer.advance_current_frame(64);
        assert_eq!(producer.current_frame(), 64);
    }
}
