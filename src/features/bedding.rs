//! Bedding planes: depth-direction gradient peaks with wide azimuthal
//! continuity, plus an apparent dip from a sinusoid fit.
use super::GradientPass;
use crate::angle::normalize_azimuth;
use crate::edges::{GradientDirection, GradientKernel};
use crate::reconstruct::ReconstructedImage;
use crate::signal::{find_peaks, smooth, GaussianKernel};
use crate::stats;
use log::debug;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BeddingParams {
    pub percentile: f32,
    /// The longest unbroken run of thresholded cells in a row must cover at
    /// least this much azimuth. Cells without a gradient (gaps) neither break
    /// nor extend a run.
    pub min_azimuthal_coverage_deg: f32,
    pub smoothing_sigma_samples: f32,
    pub peak_height_percentile: f32,
    pub min_peak_spacing_m: f64,
    /// Half-height of the window searched for the boundary in each column.
    pub dip_window_m: f64,
    pub min_dip_columns: usize,
}

impl Default for BeddingParams {
    fn default() -> Self {
        Self {
            percentile: 80.0,
            min_azimuthal_coverage_deg: 90.0,
            smoothing_sigma_samples: 5.0,
            peak_height_percentile: 70.0,
            min_peak_spacing_m: 0.10,
            dip_window_m: 0.25,
            min_dip_columns: 12,
        }
    }
}

/// Apparent dip from `z(θ) = z0 + b·sinθ + c·cosθ`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DipEstimate {
    pub dip_deg: f32,
    pub dip_azimuth_deg: f32,
    pub amplitude_m: f64,
    pub columns: usize,
}

/// Near-horizontal boundary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bedding {
    pub depth: f64,
    pub strength: f32,
    pub mean_conductivity: Option<f32>,
    /// Non-gap share of the row, percent.
    pub azimuthal_coverage_pct: f32,
    pub dip: Option<DipEstimate>,
}

pub fn detect_beddings(image: &ReconstructedImage, params: &BeddingParams, diameter_m: f64) -> Vec<Bedding> {
    let pass = GradientPass {
        direction: GradientDirection::Depth,
        kernel: GradientKernel::Sobel,
        percentile: params.percentile,
    };
    let gradient = pass.run(image);
    let field = &gradient.field;
    let n = image.azimuth_bins();
    let bin_w = image.bin_width();

    let mut continuous_rows = 0usize;
    let profile: Vec<f32> = (0..image.rows())
        .map(|y| {
            let cells = (0..n).map(|x| field.magnitude(x, y).map(|_| gradient.mask.get(x, y)));
            let span = longest_run(cells) as f32 * bin_w;
            if span + 1e-4 < params.min_azimuthal_coverage_deg {
                return 0.0;
            }
            continuous_rows += 1;
            stats::mean((0..n).filter_map(|x| field.magnitude(x, y))).unwrap_or(0.0)
        })
        .collect();

    let smoothed = smooth(&profile, &GaussianKernel::new(params.smoothing_sigma_samples));
    let height = stats::percentile(smoothed.iter().copied(), params.peak_height_percentile);
    let distance = super::rows_for(params.min_peak_spacing_m, image.depth_step);
    let peaks = find_peaks(&smoothed, height, distance);

    let window = super::rows_for(params.dip_window_m, image.depth_step);
    let beddings: Vec<Bedding> = peaks
        .into_iter()
        .map(|y| Bedding {
            depth: image.depths[y],
            strength: smoothed[y],
            mean_conductivity: image.row_mean(y),
            azimuthal_coverage_pct: image.coverage.covered_in_row(y) as f32 / n as f32 * 100.0,
            dip: fit_dip(image, &gradient, y, window, params.min_dip_columns, diameter_m),
        })
        .collect();

    debug!(
        "bedding: threshold={:?} continuous_rows={} peaks={}",
        gradient.threshold,
        continuous_rows,
        beddings.len()
    );
    beddings
}

/// Longest circular run of `Some(true)` cells; `None` cells are skipped.
fn longest_run(cells: impl Iterator<Item = Option<bool>>) -> usize {
    let mut best = 0usize;
    let mut current = 0usize;
    let mut leading: Option<usize> = None;
    for set in cells.flatten() {
        if set {
            current += 1;
            continue;
        }
        leading.get_or_insert(current);
        best = best.max(current);
        current = 0;
    }
    match leading {
        Some(lead) => best.max(current + lead),
        None => current,
    }
}

/// Least-squares sinusoid through the strongest thresholded boundary of each
/// column within `window` rows of `row`.
fn fit_dip(
    image: &ReconstructedImage,
    gradient: &super::ThresholdedGradient,
    row: usize,
    window: usize,
    min_columns: usize,
    diameter_m: f64,
) -> Option<DipEstimate> {
    let lo = row.saturating_sub(window);
    let hi = (row + window).min(image.rows().saturating_sub(1));
    let mut ata = Matrix3::<f64>::zeros();
    let mut atz = Vector3::<f64>::zeros();
    let mut columns = 0usize;

    for x in 0..image.azimuth_bins() {
        let mut best: Option<(usize, f32)> = None;
        for y in lo..=hi {
            if !gradient.mask.get(x, y) {
                continue;
            }
            if let Some(m) = gradient.field.magnitude(x, y) {
                if best.map_or(true, |(_, b)| m > b) {
                    best = Some((y, m));
                }
            }
        }
        let Some((y, _)) = best else {
            continue;
        };
        let theta = (image.bin_azimuth(x) as f64).to_radians();
        let basis = Vector3::new(1.0, theta.sin(), theta.cos());
        let z = image.depths[y] - image.depths[row];
        ata += basis * basis.transpose();
        atz += basis * z;
        columns += 1;
    }

    if columns < min_columns.max(3) {
        return None;
    }
    let coef = ata.cholesky()?.solve(&atz);
    let (b, c) = (coef[1], coef[2]);
    let amplitude = b.hypot(c);
    Some(DipEstimate {
        dip_deg: (2.0 * amplitude / diameter_m).atan().to_degrees() as f32,
        dip_azimuth_deg: normalize_azimuth(b.atan2(c).to_degrees() as f32),
        amplitude_m: amplitude,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Coverage, CoverageGrid, ImageF32};

    #[test]
    fn sinusoid_fit_recovers_amplitude() {
        // Boundary depth follows 0.02·sin(θ) around 50.0 m on a 2 mm grid.
        let (n, rows, step) = (360usize, 200usize, 0.002f64);
        let depths: Vec<f64> = (0..rows).map(|i| 49.8 + i as f64 * step).collect();
        let mut values = ImageF32::new(n, rows);
        let mut coverage = CoverageGrid::new(n, rows);
        for x in 0..n {
            let boundary = 50.0 + 0.02 * (x as f64).to_radians().sin();
            for y in 0..rows {
                values.set(x, y, if depths[y] >= boundary { 200.0 } else { 50.0 });
                coverage.set(x, y, Coverage::Measured);
            }
        }
        let image = ReconstructedImage::new(depths, step, values, coverage);
        let pass = GradientPass {
            direction: GradientDirection::Depth,
            kernel: GradientKernel::Sobel,
            percentile: 80.0,
        };
        let gradient = pass.run(&image);
        let dip = fit_dip(&image, &gradient, 100, 125, 12, 0.216).expect("dip estimate");
        assert_eq!(dip.columns, 360);
        assert!((dip.amplitude_m - 0.02).abs() < 0.003, "amplitude={}", dip.amplitude_m);
        assert!((dip.dip_azimuth_deg - 90.0).abs() < 10.0, "azimuth={}", dip.dip_azimuth_deg);
        let expected = (2.0f64 * 0.02 / 0.216).atan().to_degrees() as f32;
        assert!((dip.dip_deg - expected).abs() < 2.0, "dip={}", dip.dip_deg);
    }

    #[test]
    fn scattered_cells_are_not_continuous() {
        let alternating = (0..360).map(|x| Some(x % 2 == 0));
        assert_eq!(longest_run(alternating), 1);

        // Run wrapping through zero with gap cells inside it.
        let wrapped = (0..360).map(|x| match x {
            0..=9 | 330..=339 => Some(true),
            340..=359 => None,
            _ => Some(false),
        });
        assert_eq!(longest_run(wrapped), 20);

        let gapped_band = (0..360).map(|x| if x % 45 < 30 { Some(true) } else { None });
        assert_eq!(longest_run(gapped_band), 240);
        assert_eq!(longest_run(std::iter::repeat(None).take(10)), 0);
    }

    #[test]
    fn too_few_columns_leave_dip_unset() {
        let (n, rows) = (36usize, 40usize);
        let mut values = ImageF32::new(n, rows);
        let mut coverage = CoverageGrid::new(n, rows);
        for y in 0..rows {
            for x in 0..3 {
                coverage.set(x, y, Coverage::Measured);
                if y >= 20 {
                    values.set(x, y, 100.0);
                }
            }
        }
        let image = ReconstructedImage::new((0..rows).map(|i| i as f64 * 0.01).collect(), 0.01, values, coverage);
        let pass = GradientPass {
            direction: GradientDirection::Depth,
            kernel: GradientKernel::Sobel,
            percentile: 80.0,
        };
        let gradient = pass.run(&image);
        assert!(fit_dip(&image, &gradient, 20, 10, 12, 0.216).is_none());
    }
}
