//! Centralized error type for the sabre umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] sabre_core::Error),

    #[cfg(feature = "stretch")]
    #[error("Stretch: {0}")]
    Stretch(#[from] sabre_stretch::Error),

    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

pub type Result<T> = std::result::Result<T, Error>;
