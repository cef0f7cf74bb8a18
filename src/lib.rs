#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod coal;
pub mod config;
pub mod cutoff;
pub mod diagnostics;
pub mod error;
pub mod features;
pub mod image;
pub mod pipeline;
pub mod qc;
pub mod reconstruct;
pub mod tool;
pub mod types;

// Building blocks shared by the stages. Public, but considered internals.
pub mod angle;
pub mod edges;
pub mod normalize;
pub mod signal;
pub mod stats;

// --- High-level re-exports -------------------------------------------------

// Main entry point and its result.
pub use crate::pipeline::{BoreholeImager, PipelineParams, PipelineResult};
pub use crate::reconstruct::ReconstructedImage;

// Inputs supplied by the channel provider.
pub use crate::tool::{ButtonId, DensityLog, RawChannelSet, ToolGeometry};

// Stage outputs.
pub use crate::coal::{CoalSeam, FormationTops};
pub use crate::cutoff::CutoffEstimate;
pub use crate::features::{Bedding, Fault, Feature, FeatureSet, Fracture};

pub use crate::error::{ImagerError, Result};
pub use crate::types::DepthRange;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use borehole_imager::prelude::*;
///
/// # fn main() -> borehole_imager::Result<()> {
/// let geometry = ToolGeometry::evenly_spaced(8, 24, 30.0);
/// let depths: Vec<f64> = (0..1000).map(|i| 400.0 + i as f64 * 0.002).collect();
/// let mut raw = RawChannelSet::new(depths, vec![1.0; 1000]);
/// for pad in 0..8 {
///     for button in 0..24 {
///         raw.insert(ButtonId::new(pad, button), vec![120.0; 1000]);
///     }
/// }
///
/// let imager = BoreholeImager::new(geometry, PipelineParams::default());
/// let result = imager.run(&raw, None, None, None)?;
/// println!("seams={} coverage={:.2}", result.seams.len(), result.image_summary.coverage_fraction);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::tool::{ButtonId, RawChannelSet, ToolGeometry};
    pub use crate::{BoreholeImager, DepthRange, PipelineParams, PipelineResult};
}

// --- Stage-level API (for tools & advanced users) -------------------------

pub mod stages {
    pub use crate::coal::{CoalSegmenter, CoalSummary};
    pub use crate::cutoff::CutoffOptimizer;
    pub use crate::diagnostics::{StageTiming, TimingBreakdown};
    pub use crate::features::FeatureDetector;
    pub use crate::normalize::{NormalizedChannels, SpeedPadNormalizer};
    pub use crate::qc::QcReport;
    pub use crate::reconstruct::{AzimuthalImageBuilder, IntensityNormalizer};
}
