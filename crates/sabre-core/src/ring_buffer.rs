//! Single-producer / single-consumer ring of interleaved PCM frames.
//!
//! Both roles hold their own [`RingBuffer`] handle over one [`SharedRegion`].
//! The producer owns `WriteIndex`, the consumer owns `ReadIndex`; publishing an
//! index with release ordering is the only synchronization point, so samples
//! are always visible before the index that exposes them.
//!
//! One frame of slack is kept free so `ReadIndex == WriteIndex` always means
//! empty.

use std::time::{Duration, Instant};

use crate::compat::{Arc, AtomicU32, Ordering};
use crate::region::{HeaderField, SharedRegion};
use crate::{Error, Result};

/// Upper bound on how long `clear()` waits for an in-flight read.
pub const CLEAR_WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Ring buffer handle over a shared region.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    region: Arc<SharedRegion>,
    channels: usize,
    /// Capacity in samples.
    capacity: usize,
}

impl RingBuffer {
    /// Attach to `region` with a fixed channel count.
    pub fn new(region: Arc<SharedRegion>, channel_count: usize) -> Result<Self> {
        if channel_count == 0 || channel_count > crate::MAX_CHANNELS {
            return Err(Error::InvalidChannelCount(channel_count));
        }
        let capacity = region.sample_capacity();
        if capacity % channel_count != 0 {
            return Err(Error::InvalidRegionSize {
                byte_len: region.byte_len(),
                reason: "sample area is not a whole number of frames",
            });
        }
        if capacity < 2 * channel_count {
            return Err(Error::InvalidRegionSize {
                byte_len: region.byte_len(),
                reason: "sample area holds fewer than two frames",
            });
        }

        tracing::debug!(
            channels = channel_count,
            capacity_frames = capacity / channel_count - 1,
            "Attached ring buffer"
        );

        Ok(Self {
            region,
            channels: channel_count,
            capacity,
        })
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Maximum number of frames that can be queued at once.
    #[inline]
    pub fn capacity_frames(&self) -> usize {
        self.capacity / self.channels - 1
    }

    pub fn region(&self) -> &Arc<SharedRegion> {
        &self.region
    }

    #[inline]
    pub(crate) fn cell(&self, field: HeaderField) -> &AtomicU32 {
        self.region.header(field)
    }

    #[inline]
    fn indices(&self) -> (usize, usize) {
        let read = self.cell(HeaderField::ReadIndex).load(Ordering::Acquire) as usize;
        let write = self.cell(HeaderField::WriteIndex).load(Ordering::Acquire) as usize;
        (read, write)
    }

    #[inline]
    fn readable_samples(&self, read: usize, write: usize) -> usize {
        if write >= read {
            write - read
        } else {
            self.capacity - read + write
        }
    }

    #[inline]
    fn writable_samples(&self, read: usize, write: usize) -> usize {
        let free = if write >= read {
            self.capacity - write + read
        } else {
            read - write
        };
        free - self.channels
    }

    /// Frames queued for the consumer. Advisory: stale as soon as either side
    /// moves.
    pub fn readable_frames(&self) -> usize {
        let (read, write) = self.indices();
        self.readable_samples(read, write) / self.channels
    }

    /// Frames the producer may write right now. Advisory.
    pub fn writable_frames(&self) -> usize {
        let (read, write) = self.indices();
        self.writable_samples(read, write) / self.channels
    }

    /// Copy `frames` frames from per-channel slices into the ring.
    ///
    /// Producer side only. The request must fit in [`writable_frames`];
    /// anything else is a caller bug and is rejected without touching the ring.
    ///
    /// [`writable_frames`]: RingBuffer::writable_frames
    pub fn write(&self, channels: &[&[f32]], frames: usize) -> Result<usize> {
        if channels.len() != self.channels {
            return Err(Error::ChannelCountMismatch {
                expected: self.channels,
                actual: channels.len(),
            });
        }
        if let Some((channel, src)) = channels.iter().enumerate().find(|(_, c)| c.len() < frames) {
            return Err(Error::BufferTooShort {
                channel,
                len: src.len(),
                frames,
            });
        }

        let (read, write) = self.indices();
        let writable = self.writable_samples(read, write);
        let needed = frames * self.channels;
        if needed > writable {
            return Err(Error::InsufficientSpace {
                requested: frames,
                writable: writable / self.channels,
            });
        }
        if frames == 0 {
            return Ok(0);
        }

        let first_len = needed.min(self.capacity - write);
        let first_frames = first_len / self.channels;
        let second_frames = (needed - first_len) / self.channels;

        self.store_frames(channels, 0, write, first_frames);
        self.store_frames(channels, first_frames, 0, second_frames);

        self.cell(HeaderField::WriteIndex)
            .store(((write + needed) % self.capacity) as u32, Ordering::Release);
        Ok(frames)
    }

    #[inline]
    fn store_frames(&self, src: &[&[f32]], src_frame: usize, dst_sample: usize, frames: usize) {
        for i in 0..frames {
            let base = dst_sample + i * self.channels;
            for (c, channel) in src.iter().enumerate() {
                self.region.store_sample(base + c, channel[src_frame + i]);
            }
        }
    }

    /// Copy up to `frames` queued frames into per-channel slices.
    ///
    /// Consumer side only. Returns `None` while the producer is clearing,
    /// otherwise the number of frames copied, which may be short.
    pub fn read(&self, channels: &mut [&mut [f32]], frames: usize) -> Option<usize> {
        let guard = self.begin_read()?;
        Some(guard.read_into(channels, frames))
    }

    /// Enter the consumer critical section.
    ///
    /// Returns `None` when the producer is clearing. The busy flag is raised
    /// before the clearing flag is checked so that `clear()` and a reader can
    /// never both proceed.
    pub fn begin_read(&self) -> Option<ReaderGuard<'_>> {
        let busy = self.cell(HeaderField::ReaderBusy);
        busy.store(1, Ordering::SeqCst);
        if self.cell(HeaderField::WriterClearing).load(Ordering::SeqCst) == 1 {
            self.release_reader();
            return None;
        }
        Some(ReaderGuard { ring: self })
    }

    fn release_reader(&self) {
        self.cell(HeaderField::ReaderBusy).store(0, Ordering::SeqCst);
        // Only a clearing producer can be parked on the busy cell.
        if self.cell(HeaderField::WriterClearing).load(Ordering::SeqCst) == 1 {
            // SAFETY: the key is the address of a cell owned by this region,
            // used for nothing but this wait/notify pair.
            unsafe {
                parking_lot_core::unpark_all(
                    self.busy_key(),
                    parking_lot_core::DEFAULT_UNPARK_TOKEN,
                );
            }
        }
    }

    #[inline]
    fn busy_key(&self) -> usize {
        self.cell(HeaderField::ReaderBusy) as *const AtomicU32 as usize
    }

    /// Drop every queued frame. Producer side only.
    ///
    /// Raises the clearing flag, waits up to [`CLEAR_WAIT_TIMEOUT`] for an
    /// in-flight read to finish, then moves `WriteIndex` back to `ReadIndex`.
    /// Returns `false` if the reader was still busy when the wait ran out.
    pub fn clear(&self) -> bool {
        let clearing = self.cell(HeaderField::WriterClearing);
        clearing.store(1, Ordering::SeqCst);

        let idle = self.wait_for_reader(Instant::now() + CLEAR_WAIT_TIMEOUT);
        if !idle {
            tracing::warn!(
                timeout_ms = CLEAR_WAIT_TIMEOUT.as_millis() as u64,
                "Reader still busy after clear wait, flushing anyway"
            );
        }

        let read = self.cell(HeaderField::ReadIndex).load(Ordering::SeqCst);
        self.cell(HeaderField::WriteIndex)
            .store(read, Ordering::SeqCst);
        clearing.store(0, Ordering::SeqCst);
        idle
    }

    fn wait_for_reader(&self, deadline: Instant) -> bool {
        let busy = self.cell(HeaderField::ReaderBusy);
        while busy.load(Ordering::SeqCst) == 1 {
            if Instant::now() >= deadline {
                return false;
            }
            // SAFETY: same key as `release_reader`; the callbacks neither
            // panic nor park.
            unsafe {
                parking_lot_core::park(
                    self.busy_key(),
                    || busy.load(Ordering::SeqCst) == 1,
                    || {},
                    |_, _| {},
                    parking_lot_core::DEFAULT_PARK_TOKEN,
                    Some(deadline),
                );
            }
        }
        true
    }
}

/// Consumer critical section. Holds `ReaderBusy` raised until dropped.
///
/// Offsets passed to the peek and advance operations are in frames relative
/// to the current `ReadIndex`.
#[derive(Debug)]
pub struct ReaderGuard<'a> {
    ring: &'a RingBuffer,
}

impl ReaderGuard<'_> {
    #[inline]
    pub fn readable_frames(&self) -> usize {
        self.ring.readable_frames()
    }

    /// Copy up to `frames` frames into per-channel slices and consume them.
    pub fn read_into(&self, channels: &mut [&mut [f32]], frames: usize) -> usize {
        let ring = self.ring;
        let frames = channels
            .iter()
            .map(|c| c.len())
            .fold(frames, usize::min);

        let (read, write) = ring.indices();
        let readable = ring.readable_samples(read, write).min(frames * ring.channels);
        if readable == 0 {
            return 0;
        }

        let first_len = readable.min(ring.capacity - read);
        let first_frames = first_len / ring.channels;
        let second_frames = (readable - first_len) / ring.channels;
        let samples = ring.region.samples();

        for (i, frame) in samples[read..read + first_len]
            .chunks_exact(ring.channels)
            .enumerate()
        {
            for (cell, channel) in frame.iter().zip(channels.iter_mut()) {
                channel[i] = f32::from_bits(cell.load(Ordering::Relaxed));
            }
        }
        for (i, frame) in samples[..second_frames * ring.channels]
            .chunks_exact(ring.channels)
            .enumerate()
        {
            for (cell, channel) in frame.iter().zip(channels.iter_mut()) {
                channel[first_frames + i] = f32::from_bits(cell.load(Ordering::Relaxed));
            }
        }

        ring.cell(HeaderField::ReadIndex)
            .store(((read + readable) % ring.capacity) as u32, Ordering::Release);
        first_frames + second_frames
    }

    /// Copy `frames` frames starting `offset_frames` past the read index into
    /// the interleaved `dst`, beginning at frame `dst_offset_frames`, without
    /// consuming them. Returns the frames actually copied, which is short when
    /// fewer are queued.
    pub fn peek_into(
        &self,
        offset_frames: usize,
        dst: &mut [f32],
        dst_offset_frames: usize,
        frames: usize,
    ) -> usize {
        let ring = self.ring;
        let ch = ring.channels;
        let (read, write) = ring.indices();
        let readable_frames = ring.readable_samples(read, write) / ch;
        let room = (dst.len() / ch).saturating_sub(dst_offset_frames);
        let frames = frames
            .min(readable_frames.saturating_sub(offset_frames))
            .min(room);

        let mut src = (read + offset_frames * ch) % ring.capacity;
        let out = &mut dst[dst_offset_frames * ch..(dst_offset_frames + frames) * ch];
        for frame in out.chunks_exact_mut(ch) {
            for (c, slot) in frame.iter_mut().enumerate() {
                *slot = ring.region.load_sample(src + c);
            }
            src += ch;
            if src == ring.capacity {
                src = 0;
            }
        }
        frames
    }

    /// Consume `frames` frames without copying them. Clamped to what is
    /// queued; returns the frames actually released.
    pub fn advance(&self, frames: usize) -> usize {
        let ring = self.ring;
        let (read, write) = ring.indices();
        let samples = (frames * ring.channels).min(ring.readable_samples(read, write));
        if samples > 0 {
            ring.cell(HeaderField::ReadIndex)
                .store(((read + samples) % ring.capacity) as u32, Ordering::Release);
        }
        samples / ring.channels
    }
}

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        self.ring.release_reader();
    }
}
