use crate::reconstruct::ReconstructedImage;
use crate::signal::{smooth_masked, GaussianKernel};
use crate::tool::DensityLog;
use log::debug;
use serde::{Deserialize, Serialize};

use super::FormationTops;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalParams {
    /// Gaussian sigma of the depth smoothing, metres.
    pub smoothing_sigma_m: f64,
    pub min_thickness_m: f64,
    /// Rows with bulk density above this (g/cc) are siderite, never coal.
    pub siderite_density: f32,
}

impl Default for CoalParams {
    fn default() -> Self {
        Self {
            smoothing_sigma_m: 0.05,
            min_thickness_m: 0.10,
            siderite_density: 2.5,
        }
    }
}

/// One contiguous below-cutoff interval. `base` is the lower edge of the
/// last flagged row, so `thickness == base - top`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoalSeam {
    pub top: f64,
    pub base: f64,
    pub thickness: f64,
    pub mean_conductivity: f32,
    pub samples: usize,
    pub formation: Option<String>,
}

/// Per-row depth profile the segmenter thresholds.
#[derive(Clone, Debug, Serialize)]
pub struct CoalProfile {
    /// Azimuthal mean over non-gap cells; `None` for uncovered rows.
    pub mean: Vec<Option<f32>>,
    pub smoothed: Vec<Option<f32>>,
    /// Density-based exclusion per row.
    pub excluded: Vec<bool>,
}

pub struct CoalSegmenter {
    params: CoalParams,
}

impl CoalSegmenter {
    pub fn new(params: CoalParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CoalParams {
        &self.params
    }

    /// Average, smooth, and mark siderite rows.
    pub fn profile(&self, image: &ReconstructedImage, density: Option<&DensityLog>) -> CoalProfile {
        let mean = image.row_means();
        let kernel = GaussianKernel::from_depth(self.params.smoothing_sigma_m, image.depth_step);
        let smoothed = smooth_masked(&mean, &kernel);
        let excluded = match density {
            Some(log) => log
                .resample(&image.depths)
                .into_iter()
                .map(|rho| rho > self.params.siderite_density)
                .collect(),
            None => vec![false; image.rows()],
        };
        CoalProfile {
            mean,
            smoothed,
            excluded,
        }
    }

    /// Seams where the smoothed profile is below `cutoff`, ordered by depth.
    pub fn segment(
        &self,
        image: &ReconstructedImage,
        cutoff: f32,
        profile: &CoalProfile,
        formations: Option<&FormationTops>,
    ) -> Vec<CoalSeam> {
        let flagged: Vec<bool> = profile
            .smoothed
            .iter()
            .zip(&profile.excluded)
            .map(|(s, &ex)| matches!(s, Some(v) if *v < cutoff) && !ex)
            .collect();

        let step = image.depth_step;
        let mut seams = Vec::new();
        let mut rejected = 0usize;
        for run in runs(&flagged) {
            let thickness = run.len() as f64 * step;
            if thickness + 1e-9 < self.params.min_thickness_m {
                rejected += 1;
                continue;
            }
            let values = image.values_in_rows(run.clone());
            let mean_conductivity = if values.is_empty() {
                0.0
            } else {
                (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
            };
            let top = image.depths[run.start];
            seams.push(CoalSeam {
                top,
                base: top + thickness,
                thickness,
                mean_conductivity,
                samples: run.len(),
                formation: formations.and_then(|f| f.label_for(top)).map(str::to_string),
            });
        }

        let excluded = profile.excluded.iter().filter(|&&e| e).count();
        debug!(
            "coal: cutoff={:.2} flagged_rows={} excluded_rows={} seams={} rejected_thin={}",
            cutoff,
            flagged.iter().filter(|&&f| f).count(),
            excluded,
            seams.len(),
            rejected
        );
        seams
    }

    /// Profile then segment.
    pub fn detect(
        &self,
        image: &ReconstructedImage,
        cutoff: f32,
        density: Option<&DensityLog>,
        formations: Option<&FormationTops>,
    ) -> Vec<CoalSeam> {
        let profile = self.profile(image, density);
        self.segment(image, cutoff, &profile, formations)
    }
}

/// Maximal runs of `true`.
fn runs(mask: &[bool]) -> Vec<std::ops::Range<usize>> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &m) in mask.iter().enumerate() {
        match (m, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(s..mask.len());
    }
    out
}
