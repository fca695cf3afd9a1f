//! Time-stretching state types.

/// Where the engine ended up after the last `read()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Freshly constructed or reset; no hop synthesized yet.
    #[default]
    Idle,
    /// Rate is exactly 1.0; reads are forwarded to the ring buffer.
    Passthrough,
    /// The request was satisfied and at least one hop was synthesized for it.
    Iterating,
    /// The request was satisfied from already queued output.
    Draining,
    /// Not enough source audio queued for another hop; the read came back
    /// short and will be retried next quantum.
    Blocked,
}

/// How the optimal block for a hop was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopKind {
    /// The target block already lay inside the search window and was used
    /// as-is, without cross-fade.
    Reused { index: i64 },
    /// A correlation search picked `index`; `excluded` is the interval around
    /// the previous hop's alignment that the search skipped, in frames
    /// relative to the start of the search window.
    Searched { index: i64, excluded: ExcludeInterval },
}

impl HopKind {
    /// Source frame index (relative to the ring's read index at the time of
    /// the hop) of the chosen block.
    pub fn index(&self) -> i64 {
        match *self {
            HopKind::Reused { index } | HopKind::Searched { index, .. } => index,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, HopKind::Searched { .. })
    }
}

/// Closed interval of candidate offsets a search must not pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcludeInterval {
    pub low: i64,
    pub high: i64,
}

impl ExcludeInterval {
    pub fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    /// Interval of `half_width` frames either side of `center`.
    pub fn around(center: i64, half_width: i64) -> Self {
        Self::new(center - half_width, center + half_width)
    }

    /// An interval that excludes nothing.
    pub fn none() -> Self {
        Self::new(i64::MAX, i64::MIN)
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        value >= self.low && value <= self.high
    }
}
