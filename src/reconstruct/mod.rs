//! Azimuthal image reconstruction.
//!
//! [`AzimuthalImageBuilder`] maps normalized button traces onto a depth ×
//! azimuth grid, interpolating inside each pad only, then median-smooths
//! each pad's bins along azimuth ([`AzimuthalMedianParams`]).
//! [`IntensityNormalizer`] then compresses the conductivity range into
//! [0, 255]. Both produce a [`ReconstructedImage`]: values plus a coverage
//! grid of the same shape.
mod builder;
mod intensity;
mod median;

pub use builder::AzimuthalImageBuilder;
pub use intensity::{IntensityNormalizer, IntensityParams, IntensityReport};
pub use median::AzimuthalMedianParams;

use crate::image::{CoverageGrid, ImageF32, ImageView};
use serde::Serialize;

/// Depth × azimuth image with per-cell provenance.
///
/// Columns are `azimuth_bins()` bins of equal width; column `j` samples
/// azimuth `j * bin_width()`. Rows map one-to-one to `depths`.
#[derive(Clone, Debug)]
pub struct ReconstructedImage {
    pub depths: Vec<f64>,
    pub depth_step: f64,
    pub values: ImageF32,
    pub coverage: CoverageGrid,
}

impl ReconstructedImage {
    pub fn new(depths: Vec<f64>, depth_step: f64, values: ImageF32, coverage: CoverageGrid) -> Self {
        assert!(
            values.same_shape(&coverage),
            "value grid {}x{} and coverage grid {}x{} differ",
            values.w,
            values.h,
            coverage.w,
            coverage.h
        );
        assert_eq!(values.h, depths.len(), "one image row per depth sample");
        Self {
            depths,
            depth_step,
            values,
            coverage,
        }
    }

    #[inline]
    pub fn azimuth_bins(&self) -> usize {
        self.values.w
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.values.h
    }

    #[inline]
    pub fn bin_width(&self) -> f32 {
        360.0 / self.values.w as f32
    }

    #[inline]
    pub fn bin_azimuth(&self, col: usize) -> f32 {
        col as f32 * self.bin_width()
    }

    /// Value of a cell, `None` for gaps.
    #[inline]
    pub fn value(&self, col: usize, row: usize) -> Option<f32> {
        (!self.coverage.is_gap(col, row)).then(|| self.values.get(col, row))
    }

    /// Measured plus interpolated cells over all cells.
    pub fn coverage_fraction(&self) -> f32 {
        self.coverage.covered_fraction()
    }

    /// Mean over the non-gap cells of `row`; `None` when the row has no
    /// coverage.
    pub fn row_mean(&self, row: usize) -> Option<f32> {
        let mut sum = 0.0f64;
        let mut n = 0usize;
        for (v, c) in self.values.row(row).iter().zip(self.coverage.row(row)) {
            if !c.is_gap() {
                sum += *v as f64;
                n += 1;
            }
        }
        (n > 0).then(|| (sum / n as f64) as f32)
    }

    /// Azimuthal average of every row.
    pub fn row_means(&self) -> Vec<Option<f32>> {
        (0..self.rows()).map(|y| self.row_mean(y)).collect()
    }

    /// All non-gap values of the rows in `rows`.
    pub fn values_in_rows(&self, rows: std::ops::Range<usize>) -> Vec<f32> {
        let mut out = Vec::new();
        for y in rows {
            for (v, c) in self.values.row(y).iter().zip(self.coverage.row(y)) {
                if !c.is_gap() {
                    out.push(*v);
                }
            }
        }
        out
    }

    /// All non-gap values.
    pub fn non_gap_values(&self) -> Vec<f32> {
        self.values_in_rows(0..self.rows())
    }

    pub fn summary(&self) -> ImageSummary {
        let (measured, interpolated, gap) = self.coverage.tally();
        ImageSummary {
            rows: self.rows(),
            azimuth_bins: self.azimuth_bins(),
            top: self.depths.first().copied().unwrap_or(0.0),
            base: self.depths.last().copied().unwrap_or(0.0),
            depth_step: self.depth_step,
            measured_cells: measured,
            interpolated_cells: interpolated,
            gap_cells: gap,
            coverage_fraction: self.coverage_fraction(),
        }
    }
}

/// Shape and coverage statistics for reports.
#[derive(Clone, Debug, Serialize)]
pub struct ImageSummary {
    pub rows: usize,
    pub azimuth_bins: usize,
    pub top: f64,
    pub base: f64,
    pub depth_step: f64,
    pub measured_cells: usize,
    pub interpolated_cells: usize,
    pub gap_cells: usize,
    pub coverage_fraction: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Coverage;

    fn tiny() -> ReconstructedImage {
        let mut values = ImageF32::new(4, 3);
        let mut coverage = CoverageGrid::new(4, 3);
        for x in 0..2 {
            values.set(x, 0, 10.0 * (x + 1) as f32);
            coverage.set(x, 0, Coverage::Measured);
        }
        values.set(3, 2, 7.0);
        coverage.set(3, 2, Coverage::Interpolated);
        ReconstructedImage::new(vec![1.0, 1.5, 2.0], 0.5, values, coverage)
    }

    #[test]
    fn row_mean_skips_gaps() {
        let img = tiny();
        assert_eq!(img.row_mean(0), Some(15.0));
        assert_eq!(img.row_mean(1), None);
        assert_eq!(img.row_mean(2), Some(7.0));
        assert_eq!(img.value(2, 0), None);
        assert_eq!(img.non_gap_values().len(), 3);
    }

    #[test]
    #[should_panic]
    fn shape_mismatch_is_asserted() {
        ReconstructedImage::new(vec![0.0], 0.1, ImageF32::new(4, 1), CoverageGrid::new(3, 1));
    }
}
