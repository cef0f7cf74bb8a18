//! Coal cutoff selection by consensus of independent estimators.
//!
//! Combination rule: the Otsu split and a weighted consensus of the other
//! estimators are averaged. When Otsu cannot separate the distribution the
//! consensus is used alone (and vice versa); the estimate is then flagged
//! [`Confidence::Reduced`].
mod estimators;

pub use estimators::{gaussian_mixture, histogram_valley, otsu, percentile_cutoff, EstimatorKind};

use crate::error::{ImagerError, Result};
use crate::stats::{self, Histogram};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Consensus weights. Estimators with zero weight are still evaluated and
/// reported.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorWeights {
    pub median: f32,
    pub percentile: f32,
    pub histogram_valley: f32,
    pub gaussian_mixture: f32,
}

impl Default for EstimatorWeights {
    fn default() -> Self {
        Self {
            median: 1.0,
            percentile: 0.0,
            histogram_valley: 0.0,
            gaussian_mixture: 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoffParams {
    pub histogram_bins: usize,
    /// Percentile estimator level, the expected coal fraction in percent.
    pub percentile: f32,
    pub valley_search: (f32, f32),
    pub valley_sigma_bins: f32,
    pub mixture_sigma_multiplier: f32,
    pub mixture_max_iterations: usize,
    pub weights: EstimatorWeights,
}

impl Default for CutoffParams {
    fn default() -> Self {
        Self {
            histogram_bins: 256,
            percentile: 15.0,
            valley_search: (0.1, 0.8),
            valley_sigma_bins: 2.0,
            mixture_sigma_multiplier: 2.0,
            mixture_max_iterations: 200,
            weights: EstimatorWeights::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Full,
    Reduced,
}

/// One estimator's contribution, kept for audit.
#[derive(Clone, Debug, Serialize)]
pub struct EstimatorValue {
    pub kind: EstimatorKind,
    pub value: Option<f32>,
    pub weight: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CutoffEstimate {
    pub cutoff: f32,
    pub otsu: Option<f32>,
    pub consensus: Option<f32>,
    pub estimators: Vec<EstimatorValue>,
    pub confidence: Confidence,
    pub samples: usize,
}

impl CutoffEstimate {
    pub fn value_of(&self, kind: EstimatorKind) -> Option<f32> {
        self.estimators
            .iter()
            .find(|e| e.kind == kind)
            .and_then(|e| e.value)
    }
}

pub struct CutoffOptimizer {
    params: CutoffParams,
}

impl CutoffOptimizer {
    pub fn new(params: CutoffParams) -> Self {
        Self { params }
    }

    /// Cutoff over an arbitrary sample set (non-finite samples ignored).
    pub fn optimize(&self, samples: &[f32]) -> Result<CutoffEstimate> {
        let sorted = stats::sorted_finite(samples.iter().copied());
        if sorted.is_empty() {
            return Err(ImagerError::EmptyDistribution);
        }
        let p = &self.params;
        let hist = Histogram::from_values(&sorted, p.histogram_bins.max(2))
            .ok_or(ImagerError::EmptyDistribution)?;

        let otsu_value = otsu(&hist);
        if let Err(e) = &otsu_value {
            debug!("cutoff: {e}");
        }
        let otsu_value = otsu_value.ok();

        let weighted = [
            (
                EstimatorKind::Median,
                percentile_cutoff(&sorted, 50.0),
                p.weights.median,
            ),
            (
                EstimatorKind::Percentile,
                percentile_cutoff(&sorted, p.percentile),
                p.weights.percentile,
            ),
            (
                EstimatorKind::HistogramValley,
                histogram_valley(&hist, p.valley_search.0, p.valley_search.1, p.valley_sigma_bins),
                p.weights.histogram_valley,
            ),
            (
                EstimatorKind::GaussianMixture,
                gaussian_mixture(&hist, p.mixture_sigma_multiplier, p.mixture_max_iterations),
                p.weights.gaussian_mixture,
            ),
        ];

        let mut estimators = vec![EstimatorValue {
            kind: EstimatorKind::Otsu,
            value: otsu_value,
            weight: 1.0,
        }];
        let mut acc = 0.0f64;
        let mut total_weight = 0.0f64;
        for (kind, value, weight) in weighted {
            let value = value.ok();
            if let Some(v) = value {
                if weight > 0.0 {
                    acc += (v * weight) as f64;
                    total_weight += weight as f64;
                }
            }
            estimators.push(EstimatorValue {
                kind,
                value,
                weight,
            });
        }
        let consensus = (total_weight > 0.0).then(|| (acc / total_weight) as f32);

        let (cutoff, confidence) = match (otsu_value, consensus) {
            (Some(o), Some(c)) => (0.5 * (o + c), Confidence::Full),
            (None, Some(c)) => {
                warn!("cutoff: otsu split unavailable, using consensus {c:.2} alone (reduced confidence)");
                (c, Confidence::Reduced)
            }
            (Some(o), None) => {
                warn!("cutoff: no weighted estimator available, using otsu {o:.2} alone (reduced confidence)");
                (o, Confidence::Reduced)
            }
            (None, None) => {
                return Err(ImagerError::DegenerateDistribution(
                    "no estimator produced a cutoff".to_string(),
                ))
            }
        };

        debug!(
            "cutoff: samples={} otsu={:?} consensus={:?} -> {:.2}",
            sorted.len(),
            otsu_value,
            consensus,
            cutoff
        );

        Ok(CutoffEstimate {
            cutoff,
            otsu: otsu_value,
            consensus,
            estimators,
            confidence,
            samples: sorted.len(),
        })
    }
}

/// Profile samples usable for cutoff selection: defined rows that are not
/// excluded.
pub fn samples_from_profile(profile: &[Option<f32>], excluded: &[bool]) -> Vec<f32> {
    profile
        .iter()
        .enumerate()
        .filter(|(i, _)| !excluded.get(*i).copied().unwrap_or(false))
        .filter_map(|(_, v)| *v)
        .collect()
}
