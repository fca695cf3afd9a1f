//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Region or ring buffer contract violation.
    #[error(transparent)]
    Core(#[from] sabre_core::Error),

    /// Invalid engine configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Playback rate outside the supported range.
    #[error("Invalid playback rate: {0}. Must be between 0.25 and 4.0")]
    InvalidPlaybackRate(f32),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
