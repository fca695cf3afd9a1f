//! WSOLA resynthesis state.
//!
//! Source frames are addressed relative to the ring's current read index;
//! negative indices lie before the start of the queued audio and read as
//! silence. Each iteration produces one hop of finished output:
//!
//! ```text
//!   target block ──► reuse if inside search window ──┐
//!        │                                           ├─► overlap-add ─► output
//!        └──► correlation search ─► cross-fade ──────┘
//! ```
//!
//! After every hop the consumed source prefix is released back to the
//! producer by advancing the ring's read index.

use std::f64::consts::TAU;

use sabre_core::ReaderGuard;

use crate::config::StretchConfig;
use crate::correlation::{optimal_index, SearchScratch};
use crate::types::{ExcludeInterval, HopKind};

#[derive(Debug, Clone)]
pub(crate) struct Wsola {
    channels: usize,
    window_frames: usize,
    hop_frames: usize,
    candidate_frames: usize,
    search_frames: usize,
    search_center_offset: i64,
    exclude_half_width: i64,
    decimation: usize,

    output_time: f64,
    target_index: i64,
    search_index: i64,
    complete_frames: usize,

    /// Overlap-add accumulator, `window + hop` frames.
    output: Vec<f32>,
    search: Vec<f32>,
    target: Vec<f32>,
    optimal: Vec<f32>,
    window: Vec<f32>,
    transition_window: Vec<f32>,
    scratch: SearchScratch,

    last_hop: Option<HopKind>,
}

impl Wsola {
    pub(crate) fn new(config: &StretchConfig) -> Self {
        let channels = config.channel_count;
        let candidate_frames = config.candidate_frames();
        let window_frames = config.window_frames();
        let hop_frames = window_frames / 2;
        let search_frames = candidate_frames + window_frames - 1;

        let mut window = vec![0.0; window_frames];
        let mut transition_window = vec![0.0; window_frames * 2];
        fill_window(&mut window);
        fill_window(&mut transition_window);

        Self {
            channels,
            window_frames,
            hop_frames,
            candidate_frames,
            search_frames,
            search_center_offset: (candidate_frames / 2 + (window_frames / 2 - 1)) as i64,
            exclude_half_width: (config.wsola.exclude_frames / 2) as i64,
            decimation: config.wsola.decimation,
            output_time: 0.0,
            target_index: 0,
            search_index: 0,
            complete_frames: 0,
            output: vec![0.0; (window_frames + hop_frames) * channels],
            search: vec![0.0; search_frames * channels],
            target: vec![0.0; window_frames * channels],
            optimal: vec![0.0; window_frames * channels],
            window,
            transition_window,
            scratch: SearchScratch::new(channels, candidate_frames),
            last_hop: None,
        }
    }

    pub(crate) fn window_frames(&self) -> usize {
        self.window_frames
    }

    pub(crate) fn hop_frames(&self) -> usize {
        self.hop_frames
    }

    pub(crate) fn candidate_frames(&self) -> usize {
        self.candidate_frames
    }

    pub(crate) fn search_frames(&self) -> usize {
        self.search_frames
    }

    pub(crate) fn complete_frames(&self) -> usize {
        self.complete_frames
    }

    pub(crate) fn last_hop(&self) -> Option<HopKind> {
        self.last_hop
    }

    /// Drop all progress. Buffers keep their allocation.
    pub(crate) fn reset(&mut self) {
        self.complete_frames = 0;
        self.target_index = 0;
        self.search_index = 0;
        self.output_time = 0.0;
        self.output.fill(0.0);
        self.last_hop = None;
    }

    fn can_iterate(&self, readable: usize) -> bool {
        let readable = readable as i64;
        self.target_index + self.window_frames as i64 <= readable
            && self.search_index + self.search_frames as i64 <= readable
    }

    /// Synthesize one hop into the accumulator. Returns `false` when too
    /// little source audio is queued.
    pub(crate) fn iterate(&mut self, guard: &ReaderGuard<'_>, rate: f64) -> bool {
        if !self.can_iterate(guard.readable_frames()) {
            return false;
        }
        debug_assert_eq!(self.complete_frames, 0);

        self.last_hop = Some(self.optimal_block(guard));

        let ch = self.channels;
        let hop = self.hop_frames;
        let base = self.complete_frames;
        for n in 0..hop {
            let fade_out = self.window[hop + n];
            let fade_in = self.window[n];
            for c in 0..ch {
                let i = (base + n) * ch + c;
                self.output[i] = self.output[i] * fade_out + self.optimal[n * ch + c] * fade_in;
                self.output[(base + n + hop) * ch + c] = self.optimal[(n + hop) * ch + c];
            }
        }
        self.complete_frames += hop;

        self.update_output_time(rate, hop as f64);
        self.remove_old_input_frames(guard, rate);
        true
    }

    fn update_output_time(&mut self, rate: f64, time_change: f64) {
        self.output_time += time_change;
        let search_center = (self.output_time * rate + 0.5).floor() as i64;
        self.search_index = search_center - self.search_center_offset;
    }

    /// Release source frames no later hop can reach.
    fn remove_old_input_frames(&mut self, guard: &ReaderGuard<'_>, rate: f64) {
        let earliest = self.target_index.min(self.search_index);
        if earliest <= 0 {
            return;
        }
        let released = guard.advance(earliest as usize) as i64;
        self.target_index -= released;
        self.update_output_time(rate, -(released as f64) / rate);
    }

    fn target_within_search_region(&self) -> bool {
        self.target_index >= self.search_index
            && self.target_index + self.window_frames as i64
                <= self.search_index + self.search_frames as i64
    }

    fn optimal_block(&mut self, guard: &ReaderGuard<'_>) -> HopKind {
        let ch = self.channels;
        let hop = if self.target_within_search_region() {
            let index = self.target_index;
            peek_with_zero_prepend(guard, ch, index, &mut self.optimal);
            HopKind::Reused { index }
        } else {
            peek_with_zero_prepend(guard, ch, self.target_index, &mut self.target);
            peek_with_zero_prepend(guard, ch, self.search_index, &mut self.search);

            let last_optimal = self.target_index - self.hop_frames as i64 - self.search_index;
            let excluded = ExcludeInterval::around(last_optimal, self.exclude_half_width);
            let found = optimal_index(
                &self.search,
                &self.target,
                excluded,
                ch,
                self.decimation,
                &mut self.scratch,
            );
            let index = found as i64 + self.search_index;
            peek_with_zero_prepend(guard, ch, index, &mut self.optimal);

            let w = self.window_frames;
            for n in 0..w {
                let rise = self.transition_window[n];
                let fall = self.transition_window[n + w];
                for c in 0..ch {
                    let i = n * ch + c;
                    self.optimal[i] = self.optimal[i] * rise + self.target[i] * fall;
                }
            }
            HopKind::Searched { index, excluded }
        };
        self.target_index = hop.index() + self.hop_frames as i64;
        hop
    }

    /// Move up to `frames` finished frames into `channels` starting at frame
    /// `dst_offset`. Returns the frames moved.
    pub(crate) fn write_completed_frames_to(
        &mut self,
        channels: &mut [&mut [f32]],
        dst_offset: usize,
        frames: usize,
    ) -> usize {
        let ch = self.channels;
        let rendered = self.complete_frames.min(frames);
        if rendered == 0 {
            return 0;
        }
        for (c, dst) in channels.iter_mut().enumerate().take(ch) {
            for (i, sample) in dst[dst_offset..dst_offset + rendered].iter_mut().enumerate() {
                *sample = self.output[i * ch + c];
            }
        }
        self.output.copy_within(rendered * ch.., 0);
        self.complete_frames -= rendered;
        rendered
    }
}

/// Copy `data.len()` interleaved samples of source starting at frame
/// `offset`, writing silence for the part before the start of the queue.
fn peek_with_zero_prepend(guard: &ReaderGuard<'_>, channels: usize, offset: i64, data: &mut [f32]) {
    let total = data.len() / channels;
    let (offset, zeros) = if offset < 0 {
        (0, (offset.unsigned_abs() as usize).min(total))
    } else {
        (offset as usize, 0)
    };
    data[..zeros * channels].fill(0.0);
    let copied = guard.peek_into(offset, data, zeros, total - zeros);
    data[(zeros + copied) * channels..].fill(0.0);
}

/// Raised-cosine window `0.5 * (1 - cos(2πn/N))`.
fn fill_window(window: &mut [f32]) {
    let scale = TAU / window.len() as f64;
    for (n, w) in window.iter_mut().enumerate() {
        *w = (0.5 * (1.0 - (n as f64 * scale).cos())) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sabre_core::{RingBuffer, SharedRegion};
    use std::sync::Arc;

    fn ring(frames: usize) -> RingBuffer {
        let region = SharedRegion::with_frames(1, frames).unwrap();
        RingBuffer::new(Arc::new(region), 1).unwrap()
    }

    fn config() -> StretchConfig {
        StretchConfig::new(1, 8000.0)
    }

    #[test]
    fn test_geometry() {
        let wsola = Wsola::new(&config());
        assert_eq!(wsola.candidate_frames(), 240);
        assert_eq!(wsola.window_frames(), 160);
        assert_eq!(wsola.hop_frames(), 80);
        assert_eq!(wsola.search_frames(), 399);
        assert_eq!(wsola.search_center_offset, 120 + 79);
        assert_eq!(wsola.output.len(), 240);
    }

    #[test]
    fn test_window_shape() {
        let mut window = vec![0.0; 8];
        fill_window(&mut window);
        assert_eq!(window[0], 0.0);
        assert_abs_diff_eq!(window[4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(window[2], 0.5, epsilon = 1e-6);
        // Halves of a hop-offset pair sum to one, which keeps overlap-add flat.
        for n in 0..4 {
            assert_abs_diff_eq!(window[n] + window[n + 4], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_zero_prepend() {
        let ring = ring(8);
        ring.write(&[&[1.0, 2.0, 3.0]], 3).unwrap();
        let guard = ring.begin_read().unwrap();

        let mut data = [9.0; 5];
        peek_with_zero_prepend(&guard, 1, -2, &mut data);
        assert_eq!(data, [0.0, 0.0, 1.0, 2.0, 3.0]);

        let mut data = [9.0; 4];
        peek_with_zero_prepend(&guard, 1, -10, &mut data);
        assert_eq!(data, [0.0; 4]);

        let mut data = [9.0; 4];
        peek_with_zero_prepend(&guard, 1, 1, &mut data);
        assert_eq!(data, [2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_blocked_without_search_window() {
        let ring = ring(1024);
        let mut wsola = Wsola::new(&config());
        ring.write(&[&vec![0.5; 398]], 398).unwrap();
        let guard = ring.begin_read().unwrap();
        assert!(!wsola.iterate(&guard, 1.5));
        assert_eq!(wsola.complete_frames(), 0);
        assert_eq!(wsola.last_hop(), None);
    }

    #[test]
    fn test_first_hop_reuses_target() {
        let ring = ring(1024);
        let mut wsola = Wsola::new(&config());
        ring.write(&[&vec![0.5; 399]], 399).unwrap();
        let guard = ring.begin_read().unwrap();

        assert!(wsola.iterate(&guard, 1.5));
        assert_eq!(wsola.last_hop(), Some(HopKind::Reused { index: 0 }));
        assert_eq!(wsola.complete_frames(), 80);
        // Search cursor is still before the queue start, nothing released.
        assert_eq!(guard.readable_frames(), 399);
    }

    #[test]
    fn test_completed_frames_drain_in_order() {
        let ring = ring(1024);
        let mut wsola = Wsola::new(&config());
        let ramp: Vec<f32> = (0..399).map(|i| i as f32).collect();
        ring.write(&[&ramp], 399).unwrap();
        let guard = ring.begin_read().unwrap();
        assert!(wsola.iterate(&guard, 1.5));

        let mut out = vec![0.0; 50];
        assert_eq!(wsola.write_completed_frames_to(&mut [&mut out[..]], 0, 50), 50);
        assert_eq!(wsola.complete_frames(), 30);

        // First hop fades the reused block in against an empty accumulator.
        let expected_10 = ramp[10] * wsola.window[10];
        assert_abs_diff_eq!(out[10], expected_10, epsilon = 1e-4);

        let mut rest = vec![0.0; 40];
        assert_eq!(wsola.write_completed_frames_to(&mut [&mut rest[..]], 5, 35), 30);
        assert_abs_diff_eq!(rest[5], ramp[50] * wsola.window[50], epsilon = 1e-4);
        assert_eq!(wsola.complete_frames(), 0);
    }

    #[test]
    fn test_reset_clears_progress() {
        let ring = ring(1024);
        let mut wsola = Wsola::new(&config());
        ring.write(&[&vec![0.5; 600]], 600).unwrap();
        let guard = ring.begin_read().unwrap();
        assert!(wsola.iterate(&guard, 2.0));

        wsola.reset();
        assert_eq!(wsola.complete_frames(), 0);
        assert_eq!(wsola.target_index, 0);
        assert_eq!(wsola.search_index, 0);
        assert_eq!(wsola.output_time, 0.0);
        assert!(wsola.output.iter().all(|&s| s == 0.0));
        assert_eq!(wsola.output.len(), 240);
    }
}
