//! Render-quantum driver for the real-time consumer thread.
//!
//! Wraps a [`FrameSource`] and turns one callback's worth of output buffers
//! into a read, honoring the transport signals at quantum boundaries:
//!
//! 1. Paused or backgrounded: emit silence, consume nothing.
//! 2. A pending pause request starts a linear fade-out over the requested
//!    frame count (or pauses on the spot for 0), after which the paused flag
//!    is raised.
//! 3. Short reads and the clearing sentinel are zero-filled alike.
//! 4. FramePosition advances by the frames actually read. A fade reads no
//!    further than its own end, so playback resumes where it faded out.
//!
//! No allocation, locking or logging happens here.

use crate::FrameSource;

/// Counters kept by the renderer. Read them from the render thread or copy
/// them out; they are not shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames of source audio delivered to the output.
    pub rendered_frames: u64,
    /// Frames zero-filled because the source ran dry.
    pub underrun_frames: u64,
    /// Quanta skipped because the producer was clearing.
    pub clearing_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PauseFade {
    remaining: u32,
    total: u32,
}

/// Consumer-side renderer over any [`FrameSource`].
#[derive(Debug)]
pub struct Renderer<S: FrameSource> {
    source: S,
    fade: Option<PauseFade>,
    stats: RenderStats,
}

impl<S: FrameSource> Renderer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            fade: None,
            stats: RenderStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Whether a pause fade-out is in progress.
    pub fn is_fading_out(&self) -> bool {
        self.fade.is_some()
    }

    /// Render one quantum into `output` (one slice per channel, all the same
    /// length). Returns the frames of source audio rendered; the rest of the
    /// quantum is silence.
    pub fn render(&mut self, output: &mut [&mut [f32]]) -> usize {
        let frames = output.iter().map(|c| c.len()).min().unwrap_or(0);

        let ring = self.source.ring();
        if ring.is_paused() || ring.is_backgrounded() {
            silence(output, 0);
            return 0;
        }

        if self.fade.is_none() {
            match ring.take_pause_request() {
                Some(0) => {
                    ring.pause();
                    silence(output, 0);
                    return 0;
                }
                Some(after) => {
                    self.fade = Some(PauseFade {
                        remaining: after,
                        total: after,
                    });
                }
                None => {}
            }
        }

        // Frames past the end of a fade stay queued for after unpause.
        let wanted = match self.fade {
            Some(fade) => frames.min(fade.remaining as usize),
            None => frames,
        };
        let read = match self.source.read(output, wanted) {
            Some(n) => n,
            None => {
                self.stats.clearing_ticks += 1;
                0
            }
        };
        if read < wanted {
            self.stats.underrun_frames += (wanted - read) as u64;
        }
        silence(output, read);

        let audible = match self.fade {
            Some(fade) => self.apply_fade(output, read, fade),
            None => read,
        };

        self.source.ring().advance_current_frame(read);
        self.stats.rendered_frames += audible as u64;
        audible
    }

    fn apply_fade(&mut self, output: &mut [&mut [f32]], read: usize, fade: PauseFade) -> usize {
        let audible = read.min(fade.remaining as usize);
        let total = fade.total as f32;
        for channel in output.iter_mut() {
            for (i, sample) in channel[..audible].iter_mut().enumerate() {
                *sample *= (fade.remaining as usize - i) as f32 / total;
            }
        }
        silence(output, audible);

        let remaining = fade.remaining - audible as u32;
        if remaining == 0 {
            self.fade = None;
            self.source.ring().pause();
        } else {
            self.fade = Some(PauseFade { remaining, ..fade });
        }
        audible
    }
}

#[inline]
fn silence(output: &mut [&mut [f32]], from: usize) {
    for channel in output.iter_mut() {
        if from < channel.len() {
            channel[from..].fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::Arc;
    use crate::{RingBuffer, SharedRegion};
    use approx::assert_abs_diff_eq;

    fn renderer(frames: usize) -> (RingBuffer, Renderer<RingBuffer>) {
        let ring = RingBuffer::new(Arc::new(SharedRegion::with_frames(1, frames).unwrap()), 1)
            .unwrap();
        (ring.clone(), Renderer::new(ring))
    }

    fn quantum(renderer: &mut Renderer<RingBuffer>, frames: usize) -> (Vec<f32>, usize) {
        let mut out = vec![f32::NAN; frames];
        let n = renderer.render(&mut [&mut out[..]]);
        (out, n)
    }

    #[test]
    fn test_renders_and_advances_frame_position() {
        let (producer, mut renderer) = renderer(16);
        producer.write(&[&[0.5; 8]], 8).unwrap();

        let (out, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 4);
        assert_eq!(out, vec![0.5; 4]);
        assert_eq!(producer.current_frame(), 4);
    }

    #[test]
    fn test_underrun_is_zero_filled() {
        let (producer, mut renderer) = renderer(16);
        producer.write(&[&[1.0, 1.0]], 2).unwrap();

        let (out, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 2);
        assert_eq!(out, vec![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(renderer.stats().underrun_frames, 2);
        assert_eq!(producer.current_frame(), 2);
    }

    #[test]
    fn test_paused_outputs_silence_without_consuming() {
        let (producer, mut renderer) = renderer(16);
        producer.write(&[&[1.0; 4]], 4).unwrap();
        producer.pause();

        let (out, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 0);
        assert_eq!(out, vec![0.0; 4]);
        assert_eq!(producer.readable_frames(), 4);
    }

    #[test]
    fn test_backgrounded_outputs_silence() {
        let (producer, mut renderer) = renderer(16);
        producer.write(&[&[1.0; 4]], 4).unwrap();
        producer.set_backgrounded(true);

        let (out, _) = quantum(&mut renderer, 4);
        assert_eq!(out, vec![0.0; 4]);
        assert_eq!(producer.readable_frames(), 4);
    }

    #[test]
    fn test_immediate_pause_request() {
        let (producer, mut renderer) = renderer(16);
        producer.write(&[&[1.0; 4]], 4).unwrap();
        producer.request_pause(0);

        let (out, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 0);
        assert_eq!(out, vec![0.0; 4]);
        assert!(producer.is_paused());
    }

    #[test]
    fn test_pause_fade_spans_quanta() {
        let (producer, mut renderer) = renderer(32);
        producer.write(&[&[1.0; 16]], 16).unwrap();
        producer.request_pause(6);

        let (first, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 4);
        assert!(renderer.is_fading_out());
        assert_abs_diff_eq!(first[0], 1.0);
        assert_abs_diff_eq!(first[3], 3.0 / 6.0);

        let (second, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 2);
        assert_abs_diff_eq!(second[0], 2.0 / 6.0);
        assert_abs_diff_eq!(second[1], 1.0 / 6.0);
        assert_eq!(&second[2..], &[0.0, 0.0]);
        assert!(!renderer.is_fading_out());
        assert!(producer.is_paused());

        let (third, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 0);
        assert_eq!(third, vec![0.0; 4]);
    }

    #[test]
    fn test_playback_resumes_where_fade_ended() {
        let (producer, mut renderer) = renderer(128);
        let ramp: Vec<f32> = (0..100).map(|i| i as f32).collect();
        producer.write(&[&ramp], ramp.len()).unwrap();
        producer.request_pause(6);

        quantum(&mut renderer, 4);
        let (_, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 2);
        assert!(producer.is_paused());
        assert_eq!(producer.current_frame(), 6);
        assert_eq!(producer.readable_frames(), 94);
        assert_eq!(renderer.stats().underrun_frames, 0);

        producer.unpause();
        let (out, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 4);
        assert_eq!(out, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(producer.current_frame(), 10);
    }

    #[test]
    fn test_clearing_tick_counts() {
        let (producer, mut renderer) = renderer(16);
        producer.write(&[&[1.0; 4]], 4).unwrap();
        producer
            .cell(crate::region::HeaderField::WriterClearing)
            .store(1, crate::compat::Ordering::SeqCst);

        let (out, n) = quantum(&mut renderer, 4);
        assert_eq!(n, 0);
        assert_eq!(out, vec![0.0; 4]);
        assert_eq!(renderer.stats().clearing_ticks, 1);
    }
}
