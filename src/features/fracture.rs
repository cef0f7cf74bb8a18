use super::{extract_regions, region_mean, row_interval, rows_for, GradientPass, MorphologyStep, RegionCriteria};
use crate::angle::circular_mean;
use crate::edges::morphology::StructuringShape;
use crate::edges::{Connectivity, GradientDirection, GradientKernel};
use crate::reconstruct::ReconstructedImage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FractureParams {
    pub percentile: f32,
    /// Applied to the thresholded gradient before closing. A step edge under
    /// the Sobel kernel is two columns wide, so a two-column rectangle keeps
    /// sustained edges and drops isolated noise cells.
    pub opening: Option<MorphologyStep>,
    pub closing: Option<MorphologyStep>,
    pub min_pixels: usize,
    pub min_extent_m: f64,
}

impl Default for FractureParams {
    fn default() -> Self {
        Self {
            percentile: 75.0,
            opening: Some(MorphologyStep {
                element: StructuringShape::Rectangle(2, 9),
                iterations: 1,
            }),
            closing: Some(MorphologyStep {
                element: StructuringShape::Square(3),
                iterations: 2,
            }),
            min_pixels: 10,
            min_extent_m: 0.05,
        }
    }
}

/// Near-vertical high-angle feature.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fracture {
    pub top: f64,
    pub base: f64,
    /// Diagonal extent combining depth extent and circumferential arc.
    pub length_m: f64,
    pub azimuth_deg: f32,
    pub azimuth_span_deg: f32,
    /// Principal-axis angle in physical units; 90 is vertical.
    pub orientation_deg: Option<f32>,
    pub mean_conductivity: f32,
    pub pixel_count: usize,
}

pub fn detect_fractures(image: &ReconstructedImage, params: &FractureParams, diameter_m: f64) -> Vec<Fracture> {
    let pass = GradientPass {
        direction: GradientDirection::Azimuthal,
        kernel: GradientKernel::Sobel,
        percentile: params.percentile,
    };
    let criteria = RegionCriteria {
        opening: params.opening.clone(),
        closing: params.closing.clone(),
        connectivity: Connectivity::Eight,
        min_pixels: params.min_pixels,
        min_rows: rows_for(params.min_extent_m, image.depth_step),
    };
    let gradient = pass.run(image);
    let bin_w = image.bin_width();
    let arc_per_bin = std::f64::consts::PI * diameter_m * bin_w as f64 / 360.0;

    let mut out: Vec<Fracture> = extract_regions(&gradient, &criteria)
        .iter()
        .filter_map(|region| {
            let azimuth = circular_mean(region.cells.iter().map(|&(x, _)| image.bin_azimuth(x)))?;
            let span_cols = region.distinct_columns();
            let interval = row_interval(image, region.row_min, region.row_max);
            let vertical = region.row_extent() as f64 * image.depth_step;
            let arc = span_cols as f64 * arc_per_bin;
            Some(Fracture {
                top: interval.top,
                base: interval.base,
                length_m: vertical.hypot(arc),
                azimuth_deg: azimuth,
                azimuth_span_deg: span_cols as f32 * bin_w,
                orientation_deg: region.principal_angle(arc_per_bin, image.depth_step),
                mean_conductivity: region_mean(image, region).unwrap_or(0.0),
                pixel_count: region.len(),
            })
        })
        .collect();
    out.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.azimuth_deg.total_cmp(&b.azimuth_deg)));
    out
}
