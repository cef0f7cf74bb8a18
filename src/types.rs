use serde::{Deserialize, Serialize};

/// Closed depth interval in metres, `top <= base` (depth increases downhole).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub top: f64,
    pub base: f64,
}

impl DepthRange {
    pub fn new(top: f64, base: f64) -> Self {
        if top <= base {
            Self { top, base }
        } else {
            Self { top: base, base: top }
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.base - self.top
    }

    #[inline]
    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.top && depth <= self.base
    }

    /// True when the two closed intervals share at least one depth.
    #[inline]
    pub fn overlaps(&self, other: &DepthRange) -> bool {
        self.top <= other.base && other.top <= self.base
    }
}

/// Controls whether row-partitioned stages and the feature passes run
/// sequentially or with Rayon. Both paths produce identical output.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelOptions {
    enabled: bool,
    min_rows_for_parallel: usize,
}

impl ParallelOptions {
    /// Construct explicit options.
    pub fn new(enabled: bool, min_rows_for_parallel: usize) -> Self {
        Self {
            enabled,
            min_rows_for_parallel: min_rows_for_parallel.max(1),
        }
    }

    /// Disable parallel execution regardless of image size.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_rows_for_parallel: usize::MAX,
        }
    }

    /// Returns true when work over `rows` depth rows should use Rayon.
    pub fn should_parallelize(&self, rows: usize) -> bool {
        cfg!(feature = "parallel") && self.enabled && rows >= self.min_rows_for_parallel
    }
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "parallel"),
            min_rows_for_parallel: 512,
        }
    }
}
