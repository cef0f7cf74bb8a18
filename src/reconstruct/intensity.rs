use super::ReconstructedImage;
use crate::image::ImageViewMut;
use crate::stats;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Log transform and percentile stretch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityParams {
    /// Offset added before `log10`. `None` picks a tenth of the smallest
    /// positive reading.
    pub epsilon: Option<f32>,
    pub clip_low_percentile: f32,
    pub clip_high_percentile: f32,
}

impl Default for IntensityParams {
    fn default() -> Self {
        Self {
            epsilon: None,
            clip_low_percentile: 1.0,
            clip_high_percentile: 99.0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct IntensityReport {
    pub epsilon: f32,
    /// Clip bounds in log10 units.
    pub clip_low: f32,
    pub clip_high: f32,
    /// True when every non-gap cell carried the same value.
    pub constant: bool,
}

pub struct IntensityNormalizer {
    params: IntensityParams,
}

impl IntensityNormalizer {
    const FALLBACK_EPSILON: f32 = 1e-6;

    pub fn new(params: IntensityParams) -> Self {
        Self { params }
    }

    /// Map non-gap cells to [0, 255] in place. Gap cells are zeroed and keep
    /// their tag.
    pub fn apply(&self, image: &mut ReconstructedImage) -> IntensityReport {
        let epsilon = self.params.epsilon.unwrap_or_else(|| {
            image
                .non_gap_values()
                .into_iter()
                .filter(|v| *v > 0.0)
                .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |a| a.min(v))))
                .map(|m| m / 10.0)
                .unwrap_or(Self::FALLBACK_EPSILON)
        });

        let w = image.values.w;
        let tags = &image.coverage.data;
        let Some(data) = image.values.as_mut_slice() else {
            return IntensityReport::default();
        };
        for (v, tag) in data.iter_mut().zip(tags.iter()) {
            *v = if tag.is_gap() {
                0.0
            } else {
                (v.max(0.0) + epsilon).log10()
            };
        }

        let logs: Vec<f32> = data
            .iter()
            .zip(tags.iter())
            .filter(|(_, t)| !t.is_gap())
            .map(|(v, _)| *v)
            .collect();
        let lo = stats::percentile(logs.iter().copied(), self.params.clip_low_percentile);
        let hi = stats::percentile(logs, self.params.clip_high_percentile);

        let mut report = IntensityReport {
            epsilon,
            ..Default::default()
        };
        match (lo, hi) {
            (Some(lo), Some(hi)) if hi - lo > f32::EPSILON * lo.abs().max(1.0) => {
                let scale = 255.0 / (hi - lo);
                for (v, tag) in data.iter_mut().zip(tags.iter()) {
                    if !tag.is_gap() {
                        *v = ((v.clamp(lo, hi) - lo) * scale).clamp(0.0, 255.0);
                    }
                }
                report.clip_low = lo;
                report.clip_high = hi;
            }
            (Some(lo), Some(hi)) => {
                warn!("intensity: constant image (log10 value {lo:.4}), mapping all cells to 0");
                data.iter_mut().for_each(|v| *v = 0.0);
                report.clip_low = lo;
                report.clip_high = hi;
                report.constant = true;
            }
            _ => {
                warn!("intensity: image has no covered cells");
                report.constant = true;
            }
        }

        debug!(
            "intensity: eps={:.3e} clip=[{:.4}, {:.4}] cols={} constant={}",
            report.epsilon, report.clip_low, report.clip_high, w, report.constant
        );
        report
    }

    /// Consuming variant of [`apply`](Self::apply).
    pub fn normalize(&self, mut image: ReconstructedImage) -> (ReconstructedImage, IntensityReport) {
        let report = self.apply(&mut image);
        (image, report)
    }
}
