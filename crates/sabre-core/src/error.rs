//! Error types for sabre-core.

use thiserror::Error;

/// Contract violations raised by region and ring buffer construction or by
/// producer-side writes.
///
/// Transient transport states (clearing, underrun) are never errors; they are
/// reported through `Option` sentinels and short frame counts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid region size: {byte_len} bytes ({reason})")]
    InvalidRegionSize { byte_len: usize, reason: &'static str },

    #[error("Invalid channel count: {0}. Must be between 1 and {max}", max = crate::MAX_CHANNELS)]
    InvalidChannelCount(usize),

    #[error("Wrong channel count: expected {expected}, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("Channel {channel} holds {len} samples, {frames} frames requested")]
    BufferTooShort {
        channel: usize,
        len: usize,
        frames: usize,
    },

    #[error("No room for write: {requested} frames requested, {writable} writable")]
    InsufficientSpace { requested: usize, writable: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
