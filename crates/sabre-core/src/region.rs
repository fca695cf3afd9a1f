//! Fixed-layout shared memory region.
//!
//! A region is a flat run of 32-bit atomic cells: a header of
//! [`HEADER_CELLS`] control words followed by interleaved `f32` samples stored
//! as bit patterns. Every cell is independently atomic, so two threads can
//! share one region without a lock as long as each header cell keeps exactly
//! one writer role.

use crate::compat::{AtomicU32, Ordering};
use crate::{Error, Result};

/// Number of 32-bit header cells.
pub const HEADER_CELLS: usize = 8;

/// Size of the control header in bytes.
pub const HEADER_BYTES: usize = HEADER_CELLS * 4;

/// Size of one stored sample in bytes.
pub const SAMPLE_BYTES: usize = 4;

/// Header cells in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum HeaderField {
    /// Consumer-owned sample index of the next unread sample.
    ReadIndex = 0,
    /// Producer-owned sample index of the next free slot.
    WriteIndex = 1,
    /// Raised by the producer for the duration of `clear()`.
    WriterClearing = 2,
    /// Raised by the consumer while it touches the sample array.
    ReaderBusy = 3,
    /// Frames rendered by the consumer, wrapping at `MAX_FRAME`.
    FramePosition = 4,
    Paused = 5,
    /// Pending pause request encoded as `after_frames + 1`; 0 means none.
    PauseRequested = 6,
    Backgrounded = 7,
}

/// Shared control header plus interleaved sample storage.
#[derive(Debug)]
pub struct SharedRegion {
    cells: Box<[AtomicU32]>,
}

impl SharedRegion {
    /// Allocate a zeroed region of exactly `byte_len` bytes.
    pub fn new(byte_len: usize) -> Result<Self> {
        if byte_len < HEADER_BYTES {
            return Err(Error::InvalidRegionSize {
                byte_len,
                reason: "smaller than the control header",
            });
        }
        if (byte_len - HEADER_BYTES) % SAMPLE_BYTES != 0 {
            return Err(Error::InvalidRegionSize {
                byte_len,
                reason: "sample area is not a whole number of samples",
            });
        }

        let cell_count = byte_len / 4;
        let cells: Box<[AtomicU32]> = (0..cell_count).map(|_| AtomicU32::new(0)).collect();

        tracing::debug!(
            byte_len,
            samples = cell_count - HEADER_CELLS,
            "Allocated shared region"
        );

        Ok(Self { cells })
    }

    /// Allocate a region able to hold `frames` usable frames of
    /// `channel_count` channels. One slack frame is added on top.
    pub fn with_frames(channel_count: usize, frames: usize) -> Result<Self> {
        if channel_count == 0 || channel_count > crate::MAX_CHANNELS {
            return Err(Error::InvalidChannelCount(channel_count));
        }
        Self::new(Self::byte_len_for(channel_count, frames + 1))
    }

    /// Byte length of a region storing `storage_frames` frames, slack included.
    pub const fn byte_len_for(channel_count: usize, storage_frames: usize) -> usize {
        HEADER_BYTES + storage_frames * channel_count * SAMPLE_BYTES
    }

    /// Total size in bytes, header included.
    pub fn byte_len(&self) -> usize {
        self.cells.len() * 4
    }

    /// Number of sample slots after the header.
    #[inline]
    pub fn sample_capacity(&self) -> usize {
        self.cells.len() - HEADER_CELLS
    }

    #[inline]
    pub fn header(&self, field: HeaderField) -> &AtomicU32 {
        &self.cells[field as usize]
    }

    /// Sample slots as raw bit cells.
    #[inline]
    pub fn samples(&self) -> &[AtomicU32] {
        &self.cells[HEADER_CELLS..]
    }

    /// Load one sample. Ordering is relaxed; visibility comes from the index
    /// that publishes it.
    #[inline]
    pub(crate) fn load_sample(&self, index: usize) -> f32 {
        f32::from_bits(self.cells[HEADER_CELLS + index].load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn store_sample(&self, index: usize, value: f32) {
        self.cells[HEADER_CELLS + index].store(value.to_bits(), Ordering::Relaxed);
    }
}
