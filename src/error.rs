//! Error taxonomy for the reconstruction and detection core.
//!
//! Only conditions a caller can act on are errors. Rows without any azimuthal
//! coverage are reported as `None` in per-row aggregates, and zero detections
//! are a valid, empty result. Mismatched image/coverage shapes are programming
//! errors and are asserted instead.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ImagerError>;

/// Errors surfaced by the imaging pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImagerError {
    /// Declared button count for a pad disagrees with the supplied channels.
    #[error("geometry mismatch on pad {pad}: declared {expected} buttons, channel set has {actual}")]
    GeometryMismatch {
        pad: usize,
        expected: usize,
        actual: usize,
    },

    /// A channel refers to a pad/button outside the declared geometry.
    #[error("channel for pad {pad} button {button} is not part of the declared tool geometry")]
    UnknownButton { pad: usize, button: usize },

    /// A sequence is not aligned with the shared depth axis.
    #[error("{what} has {actual} samples, depth axis has {expected}")]
    ChannelLength {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Tool geometry violates its own invariants.
    #[error("invalid tool geometry: {0}")]
    InvalidGeometry(String),

    /// No in-zone, non-gap samples were available for cutoff optimisation.
    #[error("no samples available for cutoff optimisation")]
    EmptyDistribution,

    /// An estimator could not separate the intensity distribution.
    #[error("degenerate intensity distribution: {0}")]
    DegenerateDistribution(String),

    /// Runtime configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// File export or import failed.
    #[error("i/o error: {0}")]
    Io(String),
}
