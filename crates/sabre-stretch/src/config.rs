//! Time-stretch engine configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Tuning of the WSOLA analysis and search geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsolaParams {
    /// Overlap-add window length in seconds (default: 0.02)
    pub window_seconds: f64,
    /// Span of candidate offsets searched per hop, in seconds (default: 0.03)
    pub search_interval_seconds: f64,
    /// Width of the exclusion interval around the previous hop's alignment,
    /// in frames (default: 160)
    pub exclude_frames: usize,
    /// Step of the coarse similarity scan, in frames (default: 5)
    pub decimation: usize,
}

impl Default for WsolaParams {
    fn default() -> Self {
        Self {
            window_seconds: 0.02,
            search_interval_seconds: 0.03,
            exclude_frames: 160,
            decimation: 5,
        }
    }
}

/// Configuration for [`TimeStretchEngine`](crate::TimeStretchEngine).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchConfig {
    pub channel_count: usize,
    pub sample_rate: f64,
    /// 1.0 = normal speed, 2.0 = twice as fast, 0.5 = half speed
    pub playback_rate: f32,
    pub wsola: WsolaParams,
}

impl Default for StretchConfig {
    fn default() -> Self {
        Self {
            channel_count: 2,
            sample_rate: 44100.0,
            playback_rate: 1.0,
            wsola: WsolaParams::default(),
        }
    }
}

impl StretchConfig {
    /// Slowest supported rate (quarter speed).
    pub const MIN_RATE: f32 = 0.25;
    /// Fastest supported rate (4x speed).
    pub const MAX_RATE: f32 = 4.0;

    pub fn new(channel_count: usize, sample_rate: f64) -> Self {
        Self {
            channel_count,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn playback_rate(mut self, rate: f32) -> Self {
        self.playback_rate = rate;
        self
    }

    pub fn wsola(mut self, params: WsolaParams) -> Self {
        self.wsola = params;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.channel_count == 0 || self.channel_count > sabre_core::MAX_CHANNELS {
            return Err(Error::InvalidConfig(format!(
                "channel_count {} out of range (1-{})",
                self.channel_count,
                sabre_core::MAX_CHANNELS
            )));
        }
        if !is_valid_rate(self.playback_rate) {
            return Err(Error::InvalidPlaybackRate(self.playback_rate));
        }
        if self.window_frames() < 2 {
            return Err(Error::InvalidConfig(format!(
                "window_seconds {} is shorter than two frames",
                self.wsola.window_seconds
            )));
        }
        if self.candidate_frames() < 1 {
            return Err(Error::InvalidConfig(format!(
                "search_interval_seconds {} is shorter than one frame",
                self.wsola.search_interval_seconds
            )));
        }
        if self.wsola.decimation == 0 {
            return Err(Error::InvalidConfig("decimation must be at least 1".into()));
        }
        Ok(())
    }

    /// Candidate offsets per search.
    pub fn candidate_frames(&self) -> usize {
        frames_for(self.wsola.search_interval_seconds, self.sample_rate)
    }

    /// Overlap-add window length, always even.
    pub fn window_frames(&self) -> usize {
        let frames = frames_for(self.wsola.window_seconds, self.sample_rate);
        frames + frames % 2
    }

    /// Source frames the ring must be able to hold so a hop can always be
    /// synthesized, even at [`MAX_RATE`](Self::MAX_RATE).
    pub fn lookahead_frames(&self) -> usize {
        let window = self.window_frames();
        let search = self.candidate_frames() + window.saturating_sub(1);
        let hop = window / 2;
        search + (Self::MAX_RATE as f64 * hop as f64).ceil() as usize + window
    }
}

pub(crate) fn is_valid_rate(rate: f32) -> bool {
    rate.is_finite() && (StretchConfig::MIN_RATE..=StretchConfig::MAX_RATE).contains(&rate)
}

fn frames_for(seconds: f64, sample_rate: f64) -> usize {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * sample_rate).round() as usize
    } else {
        0
    }
}
