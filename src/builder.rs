//! Builder for configuring and constructing a [`Session`].

use std::sync::Arc;

use sabre_core::SharedRegion;

use crate::{Error, Result, Session};

#[cfg(feature = "stretch")]
use crate::stretch::{StretchConfig, WsolaParams};

/// Sizes the shared region and attaches both ends of the transport.
///
/// With the `stretch` feature the consumer side reads through a
/// [`TimeStretchEngine`](crate::stretch::TimeStretchEngine), otherwise
/// straight from the ring.
///
/// # Example
///
/// ```ignore
/// use sabre::prelude::*;
///
/// let session = Session::builder()
///     .channels(2)
///     .sample_rate(48000.0)
///     .buffer_seconds(0.5)
///     .playback_rate(1.25)
///     .build()?;
///
/// let (producer, renderer) = session.split();
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    channels: usize,
    sample_rate: f64,
    buffer_seconds: f64,

    #[cfg(feature = "stretch")]
    playback_rate: f32,

    #[cfg(feature = "stretch")]
    wsola: WsolaParams,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44100.0,
            buffer_seconds: 1.0,

            #[cfg(feature = "stretch")]
            playback_rate: 1.0,

            #[cfg(feature = "stretch")]
            wsola: WsolaParams::default(),
        }
    }
}

impl SessionBuilder {
    /// Default: 2
    pub fn channels(mut self, count: usize) -> Self {
        self.channels = count;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Queue length of the ring in seconds of source audio. Default: 1.0
    pub fn buffer_seconds(mut self, seconds: f64) -> Self {
        self.buffer_seconds = seconds;
        self
    }

    /// Default: 1.0
    #[cfg(feature = "stretch")]
    pub fn playback_rate(mut self, rate: f32) -> Self {
        self.playback_rate = rate;
        self
    }

    #[cfg(feature = "stretch")]
    pub fn wsola(mut self, params: WsolaParams) -> Self {
        self.wsola = params;
        self
    }

    pub fn build(self) -> Result<Session> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidSession(format!(
                "sample_rate {} must be positive",
                self.sample_rate
            )));
        }
        let frames = (self.buffer_seconds * self.sample_rate).round();
        if !(frames.is_finite() && frames >= 1.0) {
            return Err(Error::InvalidSession(format!(
                "buffer_seconds {} holds no frames",
                self.buffer_seconds
            )));
        }
        let frames = frames as usize;

        #[cfg(feature = "stretch")]
        {
            let config = self.stretch_config();
            config.validate()?;
            let lookahead = config.lookahead_frames();
            if frames < lookahead {
                return Err(Error::InvalidSession(format!(
                    "buffer of {frames} frames cannot hold the {lookahead}-frame stretch lookahead"
                )));
            }
        }

        let region = Arc::new(SharedRegion::with_frames(self.channels, frames)?);
        let producer = sabre_core::RingBuffer::new(region.clone(), self.channels)?;

        #[cfg(feature = "stretch")]
        let source = crate::stretch::TimeStretchEngine::new(region.clone(), self.stretch_config())?;
        #[cfg(not(feature = "stretch"))]
        let source = sabre_core::RingBuffer::new(region.clone(), self.channels)?;

        Ok(Session::new(
            region,
            producer,
            sabre_core::Renderer::new(source),
            self.sample_rate,
        ))
    }

    #[cfg(feature = "stretch")]
    fn stretch_config(&self) -> StretchConfig {
        StretchConfig::new(self.channels, self.sample_rate)
            .playback_rate(self.playback_rate)
            .wsola(self.wsola)
    }
}
