//! Shared re-exports for sync primitives.

pub use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
