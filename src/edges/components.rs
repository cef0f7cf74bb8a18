//! Connected components on a circular-azimuth mask.
//!
//! BFS carries an unwrapped column coordinate alongside the wrapped one, so a
//! region crossing the 0°/360° seam accumulates contiguous moments.
use super::morphology::BinaryMask;
use crate::angle::wrap_column;
use nalgebra::{Matrix2, SymmetricEigen};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const NEIGH_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const NEIGH_4: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
const NEIGH_VERTICAL: [(isize, isize); 2] = [(0, -1), (0, 1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Eight,
    Four,
    /// Same column, adjacent rows only.
    Vertical,
}

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Eight => &NEIGH_8,
            Connectivity::Four => &NEIGH_4,
            Connectivity::Vertical => &NEIGH_VERTICAL,
        }
    }
}

/// One connected region. Moments use the unwrapped column coordinate.
#[derive(Clone, Debug)]
pub struct Region {
    /// `(column, row)` of every cell, columns wrapped into `[0, w)`.
    pub cells: Vec<(usize, usize)>,
    pub row_min: usize,
    pub row_max: usize,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
}

impl Region {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
            row_min: usize::MAX,
            row_max: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_yy: 0.0,
            sum_xy: 0.0,
        }
    }

    fn push(&mut self, x: usize, unwrapped_x: isize, y: usize) {
        self.cells.push((x, y));
        let xf = unwrapped_x as f64;
        let yf = y as f64;
        self.sum_x += xf;
        self.sum_y += yf;
        self.sum_xx += xf * xf;
        self.sum_yy += yf * yf;
        self.sum_xy += xf * yf;
        self.row_min = self.row_min.min(y);
        self.row_max = self.row_max.max(y);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of rows between the shallowest and deepest cell, inclusive.
    #[inline]
    pub fn row_extent(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.row_max - self.row_min + 1
        }
    }

    /// Distinct columns touched.
    pub fn distinct_columns(&self) -> usize {
        let mut cols: Vec<usize> = self.cells.iter().map(|c| c.0).collect();
        cols.sort_unstable();
        cols.dedup();
        cols.len()
    }

    /// Orientation of the principal axis, in degrees within `[0, 180)`, after
    /// scaling columns by `sx` and rows by `sy` (physical units). 0 is along
    /// the azimuth axis, 90 along depth. `None` for a point-like region.
    pub fn principal_angle(&self, sx: f64, sy: f64) -> Option<f32> {
        let n = self.len() as f64;
        if n < 2.0 {
            return None;
        }
        let cx = self.sum_x / n;
        let cy = self.sum_y / n;
        let cxx = (self.sum_xx / n - cx * cx) * sx * sx;
        let cyy = (self.sum_yy / n - cy * cy) * sy * sy;
        let cxy = (self.sum_xy / n - cx * cy) * sx * sy;
        let cov = Matrix2::new(cxx, cxy, cxy, cyy);
        let eig = SymmetricEigen::new(cov);
        let (vmax, lambda_max) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
            (eig.eigenvectors.column(0), eig.eigenvalues[0])
        } else {
            (eig.eigenvectors.column(1), eig.eigenvalues[1])
        };
        if !lambda_max.is_finite() || lambda_max <= 0.0 {
            return None;
        }
        let angle = vmax[1].atan2(vmax[0]).to_degrees().rem_euclid(180.0);
        Some(if angle >= 180.0 - 1e-9 { 0.0 } else { angle as f32 })
    }
}

/// Label the set cells of `mask` into regions, in raster order of their
/// first cell.
pub fn label_regions(mask: &BinaryMask, connectivity: Connectivity) -> Vec<Region> {
    let (w, h) = (mask.w, mask.h);
    let mut visited = vec![false; w * h];
    let mut queue: VecDeque<(usize, isize, usize)> = VecDeque::new();
    let mut regions = Vec::new();
    let offsets = connectivity.offsets();

    for seed in 0..w * h {
        if !mask.data[seed] || visited[seed] {
            continue;
        }
        visited[seed] = true;
        let (sx, sy) = (seed % w, seed / w);
        queue.push_back((sx, sx as isize, sy));
        let mut region = Region::with_capacity(32);

        while let Some((x, ux, y)) = queue.pop_front() {
            region.push(x, ux, y);
            for &(dx, dy) in offsets {
                let ny = y as isize + dy;
                if ny < 0 || ny >= h as isize {
                    continue;
                }
                let nx = wrap_column(x as isize + dx, w);
                let idx = ny as usize * w + nx;
                if mask.data[idx] && !visited[idx] {
                    visited[idx] = true;
                    queue.push_back((nx, ux + dx, ny as usize));
                }
            }
        }
        regions.push(region);
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_across_seam_is_one_component() {
        let mut m = BinaryMask::new(10, 6);
        for y in 0..6 {
            m.set(9, y, true);
            m.set(0, y, true);
        }
        let regions = label_regions(&m, Connectivity::Eight);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].len(), 12);
        assert_eq!(regions[0].distinct_columns(), 2);
        assert_eq!(regions[0].row_extent(), 6);
        let angle = regions[0].principal_angle(1.0, 1.0).unwrap();
        assert!((angle - 90.0).abs() < 1e-3, "angle={angle}");
    }

    #[test]
    fn vertical_connectivity_splits_columns() {
        let mut m = BinaryMask::new(5, 4);
        for y in 0..4 {
            m.set(1, y, true);
            m.set(2, y, true);
        }
        assert_eq!(label_regions(&m, Connectivity::Vertical).len(), 2);
        assert_eq!(label_regions(&m, Connectivity::Four).len(), 1);
    }

    #[test]
    fn horizontal_streak_is_flat() {
        let mut m = BinaryMask::new(20, 3);
        for x in 2..15 {
            m.set(x, 1, true);
        }
        let r = &label_regions(&m, Connectivity::Eight)[0];
        let angle = r.principal_angle(1.0, 1.0).unwrap();
        assert!(angle < 1e-3 || (180.0 - angle) < 1e-3, "angle={angle}");
    }
}
