//! Player-side mapping from the wrapping frame counter to track position.

use crate::signals::MAX_FRAME;

/// Tracks where the current track is, given the consumer's FramePosition.
///
/// The frame counter keeps running across seeks and wraps at [`MAX_FRAME`],
/// so the player remembers the counter value at the last flush plus the track
/// frame that flush jumped to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Playhead {
    cleared_frame: u32,
    seek_offset: u64,
}

impl Playhead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a flush: `current_frame` is the counter value at the time of
    /// the flush, `seek_offset` the track frame playback resumes from.
    pub fn mark_cleared(&mut self, current_frame: u32, seek_offset: u64) {
        self.cleared_frame = current_frame % MAX_FRAME;
        self.seek_offset = seek_offset;
    }

    /// Track frame currently being played.
    pub fn played_frame(&self, current_frame: u32) -> u64 {
        let current = current_frame % MAX_FRAME;
        let elapsed = if current >= self.cleared_frame {
            current - self.cleared_frame
        } else {
            MAX_FRAME - self.cleared_frame + current
        };
        elapsed as u64 + self.seek_offset
    }

    /// Account for `frames` of track audio the player skipped instead of
    /// writing (e.g. an entirely silent buffer), so the played position
    /// moves past them.
    pub fn skip(&mut self, frames: u32) {
        let frames = frames % MAX_FRAME;
        self.cleared_frame = if frames > self.cleared_frame {
            MAX_FRAME - (frames - self.cleared_frame)
        } else {
            self.cleared_frame - frames
        };
    }
}
