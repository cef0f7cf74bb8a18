//! Per-cell provenance of the reconstructed image.
//!
//! Every cell of the azimuthal image carries a tag. `Gap` cells have no
//! physical meaning: the value stored beside them is a placeholder and must
//! never be read as a measurement.
use super::traits::{ImageView, ImageViewMut};
use serde::{Deserialize, Serialize};

/// Provenance of one azimuth × depth cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// No pad covers the azimuth, or the pad had no usable buttons around it.
    #[default]
    Gap,
    /// The bin contains a button position.
    Measured,
    /// Value interpolated between neighbouring buttons of one pad.
    Interpolated,
}

impl Coverage {
    #[inline]
    pub fn is_gap(self) -> bool {
        matches!(self, Coverage::Gap)
    }
}

/// Row-major coverage tags, same shape as the image it describes.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageGrid {
    pub w: usize,
    pub h: usize,
    pub data: Vec<Coverage>,
}

impl CoverageGrid {
    /// All-gap grid of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![Coverage::Gap; w * h],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Coverage {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: Coverage) {
        self.data[y * self.w + x] = c;
    }

    #[inline]
    pub fn is_gap(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_gap()
    }

    /// Number of non-gap cells in row `y`.
    pub fn covered_in_row(&self, y: usize) -> usize {
        self.row(y).iter().filter(|c| !c.is_gap()).count()
    }

    /// Fraction of all cells that are not gaps.
    pub fn covered_fraction(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let covered = self.data.iter().filter(|c| !c.is_gap()).count();
        covered as f32 / self.data.len() as f32
    }

    /// Count cells per tag as `(measured, interpolated, gap)`.
    pub fn tally(&self) -> (usize, usize, usize) {
        self.data
            .iter()
            .fold((0, 0, 0), |(m, i, g), c| match c {
                Coverage::Measured => (m + 1, i, g),
                Coverage::Interpolated => (m, i + 1, g),
                Coverage::Gap => (m, i, g + 1),
            })
    }
}

impl ImageView for CoverageGrid {
    type Pixel = Coverage;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[Coverage] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[Coverage]> {
        Some(&self.data)
    }
}

impl ImageViewMut for CoverageGrid {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [Coverage] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }

    #[inline]
    fn as_mut_slice(&mut self) -> Option<&mut [Coverage]> {
        Some(&mut self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_and_fraction() {
        let mut grid = CoverageGrid::new(4, 2);
        grid.set(0, 0, Coverage::Measured);
        grid.set(1, 0, Coverage::Interpolated);
        grid.set(2, 1, Coverage::Measured);
        assert_eq!(grid.tally(), (2, 1, 5));
        assert_eq!(grid.covered_in_row(0), 2);
        assert!((grid.covered_fraction() - 3.0 / 8.0).abs() < 1e-6);
    }
}
