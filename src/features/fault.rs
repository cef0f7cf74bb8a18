use super::{extract_regions, row_interval, rows_for, GradientPass, RegionCriteria};
use crate::angle::{azimuth_difference, wrap_column};
use crate::edges::{Connectivity, GradientDirection, GradientKernel, Region};
use crate::reconstruct::ReconstructedImage;
use crate::stats;
use log::debug;
use serde::{Deserialize, Serialize};

use super::Fracture;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultParams {
    pub percentile: f32,
    pub min_height_m: f64,
    /// Half-width of the side windows used for the contrast, degrees.
    pub contrast_window_deg: f32,
    /// Keep faults whose contrast is at or above this percentile of all
    /// candidate contrasts. The comparison is inclusive: when every candidate
    /// has the same contrast (the two edges of a single lateral step), all
    /// of them are kept instead of none.
    pub contrast_percentile: f32,
    /// Also require the fracture azimuth within this tolerance when set.
    pub association_azimuth_tolerance_deg: Option<f32>,
}

impl Default for FaultParams {
    fn default() -> Self {
        Self {
            percentile: 95.0,
            min_height_m: 0.5,
            contrast_window_deg: 5.0,
            contrast_percentile: 75.0,
            association_azimuth_tolerance_deg: None,
        }
    }
}

/// Abrupt lateral discontinuity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fault {
    pub top: f64,
    pub base: f64,
    pub height_m: f64,
    pub azimuth_deg: f32,
    pub contrast: f32,
    pub fracture_association: bool,
}

struct Candidate {
    column: usize,
    rows: (usize, usize),
    contrast: f32,
}

pub fn detect_faults(image: &ReconstructedImage, params: &FaultParams) -> Vec<Fault> {
    let pass = GradientPass {
        direction: GradientDirection::Azimuthal,
        kernel: GradientKernel::CentralDifference,
        percentile: params.percentile,
    };
    let criteria = RegionCriteria {
        opening: None,
        closing: None,
        connectivity: Connectivity::Vertical,
        min_pixels: 1,
        min_rows: rows_for(params.min_height_m, image.depth_step),
    };
    let gradient = pass.run(image);
    let regions = extract_regions(&gradient, &criteria);

    let n = image.azimuth_bins();
    let offset = ((params.contrast_window_deg / image.bin_width()).round() as isize).max(1);
    let mut candidates: Vec<Candidate> = regions
        .iter()
        .filter_map(|r| side_contrast(image, r, offset).map(|contrast| (r, contrast)))
        .map(|(r, contrast)| Candidate {
            column: r.cells[0].0,
            rows: (r.row_min, r.row_max),
            contrast,
        })
        .collect();
    let found = candidates.len();
    candidates = merge_adjacent(candidates, n);

    let mut faults: Vec<Fault> = keep_strongest(candidates, params.contrast_percentile)
        .into_iter()
        .map(|c| {
            let interval = row_interval(image, c.rows.0, c.rows.1);
            Fault {
                top: interval.top,
                base: interval.base,
                height_m: interval.height(),
                azimuth_deg: image.bin_azimuth(c.column),
                contrast: c.contrast,
                fracture_association: false,
            }
        })
        .collect();
    faults.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.azimuth_deg.total_cmp(&b.azimuth_deg)));
    debug!(
        "faults: threshold={:?} candidates={} kept={}",
        gradient.threshold,
        found,
        faults.len()
    );
    faults
}

/// `|mean(left window) - mean(right window)|` over the region's rows, from
/// non-gap cells only. `None` when either side has no data.
fn side_contrast(image: &ReconstructedImage, region: &Region, offset: isize) -> Option<f32> {
    let n = image.azimuth_bins();
    let col = region.cells[0].0 as isize;
    let left = wrap_column(col - offset, n);
    let right = wrap_column(col + offset, n);
    let rows = region.row_min..=region.row_max;
    let l = stats::mean(rows.clone().filter_map(|y| image.value(left, y)))?;
    let r = stats::mean(rows.filter_map(|y| image.value(right, y)))?;
    Some((l - r).abs())
}

/// Candidates at or above the `q`-th percentile of all contrasts.
fn keep_strongest(candidates: Vec<Candidate>, q: f32) -> Vec<Candidate> {
    let Some(floor) = stats::percentile(candidates.iter().map(|c| c.contrast), q) else {
        return Vec::new();
    };
    candidates.into_iter().filter(|c| c.contrast >= floor).collect()
}

/// A single edge lights up neighbouring columns; keep the strongest of
/// candidates in adjacent columns with overlapping rows.
fn merge_adjacent(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.contrast.total_cmp(&a.contrast).then(a.column.cmp(&b.column)));
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        let shadowed = kept.iter().any(|k| {
            let d = k.column.abs_diff(c.column);
            let adjacent = d.min(n - d) <= 1;
            adjacent && k.rows.0 <= c.rows.1 && c.rows.0 <= k.rows.1
        });
        if !shadowed {
            kept.push(c);
        }
    }
    kept
}

/// Flag faults whose depth range overlaps a fracture (and, when a tolerance
/// is given, whose azimuth is close to it).
pub fn associate_fractures(faults: &mut [Fault], fractures: &[Fracture], azimuth_tolerance_deg: Option<f32>) {
    for fault in faults.iter_mut() {
        fault.fracture_association = fractures.iter().any(|fr| {
            let overlaps = fr.top <= fault.base && fault.top <= fr.base;
            let aligned = azimuth_tolerance_deg
                .map_or(true, |tol| azimuth_difference(fr.azimuth_deg, fault.azimuth_deg) <= tol);
            overlaps && aligned
        });
    }
}
