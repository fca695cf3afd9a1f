//! Waveform-similarity search.
//!
//! Finds the offset inside an interleaved search window whose block best
//! matches a target block, using an energy-normalized correlation summed
//! across channels:
//!
//! 1. **Decimated scan**: score every `decimation`-th candidate, refine each
//!    local maximum by quadratic interpolation over three consecutive scores.
//! 2. **Exhaustive refinement**: score every candidate within ±`decimation`
//!    of the coarse estimate and keep the best integer offset.
//!
//! Both stages skip offsets inside an [`ExcludeInterval`], which keeps the
//! search from re-picking the alignment of the previous hop.
//!
//! ## RT-Safety
//!
//! All working memory lives in a caller-owned [`SearchScratch`]; nothing here
//! allocates.

use crate::types::ExcludeInterval;

/// Keeps the normalization finite for silent blocks.
const EPSILON: f32 = 1e-12;

/// Reusable working memory for [`optimal_index`].
#[derive(Debug, Clone)]
pub struct SearchScratch {
    channels: usize,
    target_energy: Vec<f32>,
    candidate_energy: Vec<f32>,
    dot: Vec<f32>,
}

impl SearchScratch {
    /// Sized for `candidate_frames` candidate offsets of `channels` channels.
    pub fn new(channels: usize, candidate_frames: usize) -> Self {
        Self {
            channels,
            target_energy: vec![0.0; channels],
            candidate_energy: vec![0.0; channels * candidate_frames],
            dot: vec![0.0; channels],
        }
    }

    pub fn candidate_frames(&self) -> usize {
        self.candidate_energy.len() / self.channels
    }
}

/// Per-channel energy of every `block_frames`-long block of `input`,
/// computed with a sliding sum. `energy[n * channels + c]` is the energy of
/// the block starting at frame `n` in channel `c`.
pub fn moving_block_energies(
    input: &[f32],
    block_frames: usize,
    channels: usize,
    energy: &mut [f32],
) {
    let blocks = input.len() / channels - (block_frames - 1);
    for c in 0..channels {
        let mut sum = 0.0f32;
        for m in 0..block_frames {
            let sample = input[m * channels + c];
            sum += sample * sample;
        }
        energy[c] = sum;

        for n in 1..blocks {
            let slide_out = input[(n - 1) * channels + c];
            let slide_in = input[(n - 1 + block_frames) * channels + c];
            energy[n * channels + c] =
                energy[(n - 1) * channels + c] - slide_out * slide_out + slide_in * slide_in;
        }
    }
}

/// Per-channel dot product of `frames` frames of `a` (from `a_offset`) and
/// `b` (from `b_offset`).
pub fn dot_product(
    a: &[f32],
    a_offset: usize,
    b: &[f32],
    b_offset: usize,
    frames: usize,
    channels: usize,
    out: &mut [f32],
) {
    for (c, dot) in out.iter_mut().enumerate().take(channels) {
        let mut sum = 0.0f32;
        for n in 0..frames {
            sum += a[(a_offset + n) * channels + c] * b[(b_offset + n) * channels + c];
        }
        *dot = sum;
    }
}

/// Energy-normalized similarity, summed across channels.
#[inline]
pub fn similarity(dot: &[f32], energy_a: &[f32], energy_b: &[f32]) -> f32 {
    dot.iter()
        .zip(energy_a)
        .zip(energy_b)
        .map(|((d, ea), eb)| d / (ea * eb + EPSILON).sqrt())
        .sum()
}

/// Fit a parabola through three equally spaced scores.
///
/// Returns the vertex position relative to the middle score (in steps) and
/// the interpolated score there. A flat fit returns the middle score.
pub fn quadratic_interpolation(scores: [f32; 3]) -> (f32, f32) {
    let a = 0.5 * (scores[2] + scores[0]) - scores[1];
    let b = 0.5 * (scores[2] - scores[0]);
    let c = scores[1];
    if a == 0.0 {
        (0.0, scores[1])
    } else {
        let offset = -b / (2.0 * a);
        (offset, a * offset * offset + b * offset + c)
    }
}

struct Scorer<'a> {
    target: &'a [f32],
    search: &'a [f32],
    channels: usize,
    block_frames: usize,
    scratch: &'a mut SearchScratch,
}

impl Scorer<'_> {
    #[inline]
    fn score(&mut self, n: usize) -> f32 {
        let ch = self.channels;
        dot_product(
            self.target,
            0,
            self.search,
            n,
            self.block_frames,
            ch,
            &mut self.scratch.dot,
        );
        similarity(
            &self.scratch.dot,
            &self.scratch.target_energy,
            &self.scratch.candidate_energy[n * ch..(n + 1) * ch],
        )
    }
}

fn decimated_search(
    scorer: &mut Scorer<'_>,
    candidates: usize,
    decimation: usize,
    exclude: ExcludeInterval,
) -> usize {
    let mut scores = [0.0f32; 3];
    let mut n = 0;
    scores[0] = scorer.score(n);
    let mut best = scores[0];
    let mut optimal = 0i64;

    n += decimation;
    if n >= candidates {
        return 0;
    }
    scores[1] = scorer.score(n);

    n += decimation;
    if n >= candidates {
        return if scores[1] > scores[0] { decimation } else { 0 };
    }

    while n < candidates {
        scores[2] = scorer.score(n);

        let peak = (scores[1] > scores[0] && scores[1] >= scores[2])
            || (scores[1] >= scores[0] && scores[1] > scores[2]);
        if peak {
            let (offset, interpolated) = quadratic_interpolation(scores);
            let candidate =
                n as i64 - decimation as i64 + (offset * decimation as f32 + 0.5) as i64;
            if interpolated > best && !exclude.contains(candidate) {
                optimal = candidate;
                best = interpolated;
            }
        } else if n + decimation >= candidates
            && scores[2] >= best
            && !exclude.contains(n as i64)
        {
            optimal = n as i64;
            best = scores[2];
        }

        scores[0] = scores[1];
        scores[1] = scores[2];
        n += decimation;
    }

    optimal.clamp(0, candidates as i64 - 1) as usize
}

fn full_search(scorer: &mut Scorer<'_>, low: usize, high: usize, exclude: ExcludeInterval) -> usize {
    let mut best = f32::MIN_POSITIVE;
    let mut optimal = 0;
    for n in low..=high {
        if exclude.contains(n as i64) {
            continue;
        }
        let score = scorer.score(n);
        if score > best {
            best = score;
            optimal = n;
        }
    }
    optimal
}

/// Offset (in frames) into `search` of the block most similar to `target`.
///
/// Both slices are interleaved with `channels` channels; `search` must hold
/// at least as many frames as `target`, and `scratch` must be sized for the
/// resulting candidate count.
pub fn optimal_index(
    search: &[f32],
    target: &[f32],
    exclude: ExcludeInterval,
    channels: usize,
    decimation: usize,
    scratch: &mut SearchScratch,
) -> usize {
    let target_frames = target.len() / channels;
    let candidates = search.len() / channels - (target_frames - 1);
    debug_assert!(scratch.candidate_frames() >= candidates);
    debug_assert_eq!(scratch.channels, channels);

    moving_block_energies(search, target_frames, channels, &mut scratch.candidate_energy);
    dot_product(
        target,
        0,
        target,
        0,
        target_frames,
        channels,
        &mut scratch.target_energy,
    );

    let decimation = decimation.max(1);
    let mut scorer = Scorer {
        target,
        search,
        channels,
        block_frames: target_frames,
        scratch,
    };
    let coarse = decimated_search(&mut scorer, candidates, decimation, exclude);

    let low = coarse.saturating_sub(decimation);
    let high = (coarse + decimation).min(candidates - 1);
    full_search(&mut scorer, low, high, exclude)
}
