//! Masked directional gradients with circular azimuth.
//!
//! - `Sobel` convolves the 3×3 Sobel kernel for the requested direction.
//! - `CentralDifference` is `(v[+1] - v[-1]) / 2` along the direction.
//!
//! Taps with zero weight are ignored; any weighted tap on a gap cell leaves
//! the output undefined (never zero).
//!
//! Complexity: O(W·H); memory: two float buffers + 1 byte/cell.
use crate::angle::wrap_column;
use crate::image::{CoverageGrid, ImageF32, ImageView, ImageViewMut};
use crate::stats;
use serde::{Deserialize, Serialize};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const CENTRAL_X: Kernel3 = [[0.0, 0.0, 0.0], [-0.5, 0.0, 0.5], [0.0, 0.0, 0.0]];
const CENTRAL_Y: Kernel3 = [[0.0, -0.5, 0.0], [0.0, 0.0, 0.0], [0.0, 0.5, 0.0]];

/// Axis along which intensity change is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    /// Along the circumference (responds to near-vertical features).
    Azimuthal,
    /// Along the borehole axis (responds to near-horizontal features).
    Depth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientKernel {
    Sobel,
    CentralDifference,
}

impl GradientKernel {
    fn taps(self, direction: GradientDirection) -> &'static Kernel3 {
        match (self, direction) {
            (GradientKernel::Sobel, GradientDirection::Azimuthal) => &SOBEL_KERNEL_X,
            (GradientKernel::Sobel, GradientDirection::Depth) => &SOBEL_KERNEL_Y,
            (GradientKernel::CentralDifference, GradientDirection::Azimuthal) => &CENTRAL_X,
            (GradientKernel::CentralDifference, GradientDirection::Depth) => &CENTRAL_Y,
        }
    }
}

/// Signed gradient plus definedness per cell.
#[derive(Clone, Debug)]
pub struct GradientField {
    pub value: ImageF32,
    pub defined: Vec<bool>,
}

impl GradientField {
    #[inline]
    pub fn width(&self) -> usize {
        self.value.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.value.h
    }

    /// Gradient magnitude at a defined cell.
    #[inline]
    pub fn magnitude(&self, x: usize, y: usize) -> Option<f32> {
        let idx = self.value.idx(x, y);
        self.defined[idx].then(|| self.value.data[idx].abs())
    }

    /// `q`-th percentile of the magnitudes of all defined cells.
    pub fn magnitude_percentile(&self, q: f32) -> Option<f32> {
        stats::percentile(
            self.value
                .data
                .iter()
                .zip(&self.defined)
                .filter(|(_, &d)| d)
                .map(|(v, _)| v.abs()),
            q,
        )
    }

    /// Cells whose magnitude strictly exceeds the `q`-th percentile. Returns
    /// the mask and the threshold used.
    pub fn threshold(&self, q: f32) -> (Vec<bool>, Option<f32>) {
        let Some(t) = self.magnitude_percentile(q) else {
            return (vec![false; self.defined.len()], None);
        };
        let mask = self
            .value
            .data
            .iter()
            .zip(&self.defined)
            .map(|(v, &d)| d && v.abs() > t)
            .collect();
        (mask, Some(t))
    }

    pub fn defined_count(&self) -> usize {
        self.defined.iter().filter(|&&d| d).count()
    }
}

/// Gradient of `values` along `direction`, skipping gap cells.
pub fn masked_gradient(
    values: &ImageF32,
    coverage: &CoverageGrid,
    direction: GradientDirection,
    kernel: GradientKernel,
) -> GradientField {
    assert!(
        values.same_shape(coverage),
        "coverage grid must match the image shape"
    );
    let w = values.w;
    let h = values.h;
    let mut out = ImageF32::new(w, h);
    let mut defined = vec![false; w * h];
    if w == 0 || h == 0 {
        return GradientField {
            value: out,
            defined,
        };
    }

    let taps = kernel.taps(direction);
    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [values.row(y_idx[0]), values.row(y_idx[1]), values.row(y_idx[2])];
        let gaps = [coverage.row(y_idx[0]), coverage.row(y_idx[1]), coverage.row(y_idx[2])];
        let out_row = out.row_mut(y);
        for x in 0..w {
            let x_idx = [
                wrap_column(x as isize - 1, w),
                x,
                wrap_column(x as isize + 1, w),
            ];
            let mut sum = 0.0;
            let mut ok = true;
            'taps: for (ky, k_row) in taps.iter().enumerate() {
                for (kx, &k) in k_row.iter().enumerate() {
                    if k == 0.0 {
                        continue;
                    }
                    if gaps[ky][x_idx[kx]].is_gap() {
                        ok = false;
                        break 'taps;
                    }
                    sum += k * rows[ky][x_idx[kx]];
                }
            }
            if ok {
                out_row[x] = sum;
                defined[y * w + x] = true;
            }
        }
    }

    GradientField {
        value: out,
        defined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Coverage;

    fn full(values: ImageF32) -> (ImageF32, CoverageGrid) {
        let mut cov = CoverageGrid::new(values.w, values.h);
        cov.data.iter_mut().for_each(|c| *c = Coverage::Measured);
        (values, cov)
    }

    #[test]
    fn azimuthal_gradient_wraps() {
        let mut img = ImageF32::new(8, 3);
        for y in 0..3 {
            img.set(7, y, 10.0);
        }
        let (img, cov) = full(img);
        let g = masked_gradient(&img, &cov, GradientDirection::Azimuthal, GradientKernel::CentralDifference);
        // Column 0 sees column 7 on its left.
        assert_eq!(g.value.get(0, 1), -5.0);
        assert_eq!(g.value.get(6, 1), 5.0);
        assert_eq!(g.magnitude(3, 1), Some(0.0));
    }

    #[test]
    fn gaps_make_gradient_undefined() {
        let (img, mut cov) = full(ImageF32::filled(6, 5, 1.0));
        cov.set(3, 2, Coverage::Gap);
        let g = masked_gradient(&img, &cov, GradientDirection::Azimuthal, GradientKernel::Sobel);
        assert!(g.magnitude(2, 2).is_none());
        assert!(g.magnitude(4, 1).is_none());
        // The Sobel-x centre column carries no weight.
        assert_eq!(g.magnitude(3, 2), Some(0.0));
        assert_eq!(g.magnitude(0, 0), Some(0.0));
    }

    #[test]
    fn depth_gradient_clamps_rows() {
        let mut img = ImageF32::new(4, 4);
        for x in 0..4 {
            img.set(x, 2, 4.0);
            img.set(x, 3, 4.0);
        }
        let (img, cov) = full(img);
        let g = masked_gradient(&img, &cov, GradientDirection::Depth, GradientKernel::Sobel);
        assert_eq!(g.value.get(1, 0), 0.0);
        assert_eq!(g.value.get(1, 1), 16.0);
        assert_eq!(g.value.get(1, 3), 0.0);
    }

    #[test]
    fn threshold_is_strict() {
        let mut img = ImageF32::new(10, 1);
        img.set(5, 0, 2.0);
        let (img, cov) = full(img);
        let g = masked_gradient(&img, &cov, GradientDirection::Azimuthal, GradientKernel::CentralDifference);
        let (mask, t) = g.threshold(75.0);
        assert_eq!(t, Some(0.0));
        assert_eq!(mask.iter().filter(|&&m| m).count(), 2);
    }
}
