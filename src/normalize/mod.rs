//! Speed & pad normalization.
//!
//! Turns a [`RawChannelSet`] into one button × depth raster per pad, with
//! logging-speed variation divided out and every pad rescaled to the common
//! median level.
mod pad;
mod speed;

pub use pad::{pad_median, pad_scales};
pub use speed::{relative_speed_factors, SpeedFactors};

use crate::error::{ImagerError, Result};
use crate::image::{ImageF32, ImageViewMut};
use crate::tool::{ButtonId, RawChannelSet, ToolGeometry};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationParams {
    pub correct_speed: bool,
    pub equalize_pads: bool,
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self {
            correct_speed: true,
            equalize_pads: true,
        }
    }
}

/// Normalized button traces, ready for azimuthal mapping.
#[derive(Clone, Debug)]
pub struct NormalizedChannels {
    pub depths: Vec<f64>,
    pub depth_step: f64,
    /// One raster per pad: width = buttons, height = depth rows. `NaN` marks
    /// a missing reading.
    pub pads: Vec<ImageF32>,
    pub reference_azimuth: Option<Vec<f32>>,
    pub report: NormalizationReport,
}

impl NormalizedChannels {
    #[inline]
    pub fn rows(&self) -> usize {
        self.depths.len()
    }
}

/// Audit trail of the normalization stage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NormalizationReport {
    pub speed_median: Option<f32>,
    pub uncorrected_rows: usize,
    pub pad_medians: Vec<Option<f32>>,
    pub global_median: Option<f32>,
    pub pad_scales: Vec<f32>,
}

pub struct SpeedPadNormalizer {
    params: NormalizationParams,
}

impl SpeedPadNormalizer {
    pub fn new(params: NormalizationParams) -> Self {
        Self { params }
    }

    pub fn normalize(
        &self,
        raw: &RawChannelSet,
        geometry: &ToolGeometry,
    ) -> Result<NormalizedChannels> {
        check_channels_against_geometry(raw, geometry)?;
        raw.validate_lengths()?;

        let rows = raw.len();
        let mut report = NormalizationReport::default();

        let factors = if self.params.correct_speed {
            let f = relative_speed_factors(raw.speed());
            report.speed_median = f.median;
            report.uncorrected_rows = f.uncorrected_rows();
            if report.uncorrected_rows > 0 {
                warn!(
                    "speed correction skipped on {} of {} rows (missing or non-positive speed)",
                    report.uncorrected_rows, rows
                );
            }
            Some(f)
        } else {
            None
        };

        let mut pads = Vec::with_capacity(geometry.pad_count());
        for (p, pad) in geometry.pads.iter().enumerate() {
            let columns: Vec<Vec<f32>> = (0..pad.buttons)
                .map(|b| {
                    let trace = raw
                        .channel(ButtonId::new(p, b))
                        .map(<[f32]>::to_vec)
                        .unwrap_or_else(|| vec![f32::NAN; rows]);
                    match &factors {
                        Some(f) => f.apply(&trace),
                        None => trace,
                    }
                })
                .collect();
            pads.push(ImageF32::from_columns(&columns, rows));
        }

        report.pad_medians = pads.iter().map(pad_median).collect();
        if self.params.equalize_pads {
            let (global, scales) = pad_scales(&report.pad_medians);
            report.global_median = global;
            for (img, &scale) in pads.iter_mut().zip(&scales) {
                if scale != 1.0 {
                    if let Some(data) = img.as_mut_slice() {
                        for v in data.iter_mut() {
                            *v *= scale;
                        }
                    }
                }
            }
            report.pad_scales = scales;
        } else {
            report.pad_scales = vec![1.0; pads.len()];
        }

        debug!(
            "normalize: rows={} pads={} speed_median={:?} pad_scales={:?}",
            rows,
            pads.len(),
            report.speed_median,
            report.pad_scales
        );

        Ok(NormalizedChannels {
            depths: raw.depths().to_vec(),
            depth_step: raw.depth_step(),
            pads,
            reference_azimuth: raw.reference_azimuth().map(<[f32]>::to_vec),
            report,
        })
    }
}

/// Supplied buttons must match the declared per-pad counts exactly.
fn check_channels_against_geometry(raw: &RawChannelSet, geometry: &ToolGeometry) -> Result<()> {
    for (p, pad) in geometry.pads.iter().enumerate() {
        let actual = raw.buttons_on_pad(p);
        if actual != pad.buttons {
            return Err(ImagerError::GeometryMismatch {
                pad: p,
                expected: pad.buttons,
                actual,
            });
        }
    }
    for (id, _) in raw.channels() {
        let known = geometry
            .pads
            .get(id.pad)
            .map(|pad| id.button < pad.buttons)
            .unwrap_or(false);
        if !known {
            return Err(ImagerError::UnknownButton {
                pad: id.pad,
                button: id.button,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_set(buttons: &[usize], rows: usize, level: impl Fn(usize) -> f32) -> RawChannelSet {
        let depths = (0..rows).map(|i| 100.0 + i as f64 * 0.01).collect();
        let mut set = RawChannelSet::new(depths, vec![1.0; rows]);
        for (p, &n) in buttons.iter().enumerate() {
            for b in 0..n {
                set.insert(ButtonId::new(p, b), vec![level(p); rows]);
            }
        }
        set
    }

    #[test]
    fn button_count_mismatch_is_fatal() {
        let geometry = ToolGeometry::evenly_spaced(2, 4, 40.0);
        let raw = uniform_set(&[4, 3], 10, |_| 1.0);
        let err = SpeedPadNormalizer::new(NormalizationParams::default())
            .normalize(&raw, &geometry)
            .unwrap_err();
        assert_eq!(
            err,
            ImagerError::GeometryMismatch {
                pad: 1,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn extra_pad_is_unknown_button() {
        let geometry = ToolGeometry::evenly_spaced(2, 2, 40.0);
        let raw = uniform_set(&[2, 2, 1], 5, |_| 1.0);
        let err = SpeedPadNormalizer::new(NormalizationParams::default())
            .normalize(&raw, &geometry)
            .unwrap_err();
        assert_eq!(err, ImagerError::UnknownButton { pad: 2, button: 0 });
    }

    #[test]
    fn pads_are_equalized_to_global_median() {
        let geometry = ToolGeometry::evenly_spaced(3, 2, 40.0);
        let raw = uniform_set(&[2, 2, 2], 20, |p| [1.0, 2.0, 4.0][p]);
        let norm = SpeedPadNormalizer::new(NormalizationParams::default())
            .normalize(&raw, &geometry)
            .unwrap();
        assert_eq!(norm.report.global_median, Some(2.0));
        for img in &norm.pads {
            assert!(img.data.iter().all(|&v| (v - 2.0).abs() < 1e-6));
        }
        assert_eq!(norm.report.pad_scales, vec![2.0, 1.0, 0.5]);
    }
}
