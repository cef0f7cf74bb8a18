//! Parameter bundle for a full processing run.
//!
//! Every field falls back to its default when omitted from a JSON config, so
//! a config only needs to list the knobs it changes.

use crate::coal::CoalParams;
use crate::cutoff::CutoffParams;
use crate::features::FeatureParams;
use crate::normalize::NormalizationParams;
use crate::reconstruct::{AzimuthalMedianParams, IntensityParams};
use crate::types::ParallelOptions;
use serde::{Deserialize, Serialize};

/// Sample population handed to the cutoff optimizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffSource {
    /// Every non-gap image cell.
    #[default]
    ImageCells,
    /// The smoothed azimuthal-average profile with siderite rows removed.
    SmoothedProfile,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Azimuth grid resolution (bins around the borehole).
    pub azimuth_bins: usize,
    /// Per-pad azimuth median applied before intensity normalization.
    pub azimuth_median: AzimuthalMedianParams,
    pub normalization: NormalizationParams,
    pub intensity: IntensityParams,
    pub cutoff_source: CutoffSource,
    pub cutoff: CutoffParams,
    pub coal: CoalParams,
    pub features: FeatureParams,
    pub parallel: ParallelOptions,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            azimuth_bins: 360,
            azimuth_median: AzimuthalMedianParams::default(),
            normalization: NormalizationParams::default(),
            intensity: IntensityParams::default(),
            cutoff_source: CutoffSource::default(),
            cutoff: CutoffParams::default(),
            coal: CoalParams::default(),
            features: FeatureParams::default(),
            parallel: ParallelOptions::default(),
        }
    }
}
