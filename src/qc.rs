//! Button-level quality control of a raw channel set.
//!
//! QC never fails a run. Findings are returned in a [`QcReport`] and the
//! notable ones are logged at `warn`.

use crate::stats;
use crate::tool::{ButtonId, RawChannelSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Channels below this valid percentage are flagged.
const LOW_VALID_PCT: f32 = 90.0;

/// Availability of a single button trace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelQc {
    pub id: ButtonId,
    pub valid: usize,
    pub total: usize,
    pub valid_pct: f32,
    pub mean: Option<f32>,
    pub std: Option<f32>,
}

/// Extreme readings across all channels.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutlierQc {
    /// `min(mean + 5σ, 10·P99)` over every valid sample.
    pub threshold: Option<f32>,
    pub count: usize,
    pub samples: usize,
}

impl OutlierQc {
    pub fn fraction(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.count as f32 / self.samples as f32
        }
    }
}

/// Regularity of the depth axis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DepthSpacingQc {
    pub median_step: f64,
    pub min_step: f64,
    pub max_step: f64,
    /// Depths (upper sample) of steps larger than twice the median step.
    pub irregular_at: Vec<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QcReport {
    pub channels: Vec<ChannelQc>,
    pub outliers: OutlierQc,
    pub spacing: DepthSpacingQc,
}

impl QcReport {
    /// Channels whose valid percentage is below the warning level.
    pub fn low_availability(&self) -> impl Iterator<Item = &ChannelQc> {
        self.channels.iter().filter(|c| c.valid_pct < LOW_VALID_PCT)
    }

    pub fn overall_valid_pct(&self) -> f32 {
        let (valid, total) = self
            .channels
            .iter()
            .fold((0usize, 0usize), |(v, t), c| (v + c.valid, t + c.total));
        if total == 0 {
            0.0
        } else {
            100.0 * valid as f32 / total as f32
        }
    }
}

/// Run every QC check on `raw`.
pub fn inspect(raw: &RawChannelSet) -> QcReport {
    let channels: Vec<ChannelQc> = raw
        .channels()
        .map(|(id, values)| channel_qc(id, values))
        .collect();
    let outliers = outlier_qc(raw);
    let spacing = spacing_qc(raw.depths());

    let report = QcReport {
        channels,
        outliers,
        spacing,
    };
    debug!(
        "qc: channels={} valid={:.1}% outliers={} irregular_steps={}",
        report.channels.len(),
        report.overall_valid_pct(),
        report.outliers.count,
        report.spacing.irregular_at.len()
    );
    for c in report.low_availability() {
        warn!(
            "qc: pad {} button {} has {:.1}% valid samples",
            c.id.pad, c.id.button, c.valid_pct
        );
    }
    if report.outliers.fraction() > 0.01 {
        warn!(
            "qc: {:.2}% of samples exceed {:?}",
            100.0 * report.outliers.fraction(),
            report.outliers.threshold
        );
    }
    if !report.spacing.irregular_at.is_empty() {
        warn!(
            "qc: {} depth steps exceed twice the median step {:.4} m",
            report.spacing.irregular_at.len(),
            report.spacing.median_step
        );
    }
    report
}

fn channel_qc(id: ButtonId, values: &[f32]) -> ChannelQc {
    let total = values.len();
    let valid = values.iter().filter(|v| v.is_finite()).count();
    let valid_pct = if total == 0 {
        0.0
    } else {
        100.0 * valid as f32 / total as f32
    };
    let moments = stats::mean_std(values.iter().copied());
    ChannelQc {
        id,
        valid,
        total,
        valid_pct,
        mean: moments.map(|(m, _)| m),
        std: moments.map(|(_, s)| s),
    }
}

fn outlier_qc(raw: &RawChannelSet) -> OutlierQc {
    let all: Vec<f32> = raw
        .channels()
        .flat_map(|(_, v)| v.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    let samples = all.len();
    let threshold = match (
        stats::mean_std(all.iter().copied()),
        stats::percentile(all.iter().copied(), 99.0),
    ) {
        (Some((mean, std)), Some(p99)) => Some((mean + 5.0 * std).min(10.0 * p99)),
        _ => None,
    };
    let count = threshold.map_or(0, |t| all.iter().filter(|&&v| v > t).count());
    OutlierQc {
        threshold,
        count,
        samples,
    }
}

fn spacing_qc(depths: &[f64]) -> DepthSpacingQc {
    let diffs: Vec<f64> = depths.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.is_empty() {
        return DepthSpacingQc::default();
    }
    let median_step = stats::median(diffs.iter().map(|&d| d as f32))
        .map(f64::from)
        .unwrap_or(0.0);
    let min_step = diffs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_step = diffs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let irregular_at = diffs
        .iter()
        .enumerate()
        .filter(|(_, &d)| d > 2.0 * median_step)
        .map(|(i, _)| depths[i])
        .collect();
    DepthSpacingQc {
        median_step,
        min_step,
        max_step,
        irregular_at,
    }
}
