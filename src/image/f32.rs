//! Owned single-channel f32 raster in row-major layout (stride == width).
//!
//! Holds per-pad normalized button traces (width = buttons) as well as the
//! reconstructed azimuthal image (width = azimuth bins).
#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Width in samples (buttons or azimuth bins)
    pub w: usize,
    /// Height in depth rows
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    /// Construct a buffer of size `w × h` with every sample set to `value`.
    pub fn filled(w: usize, h: usize, value: f32) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![value; w * h],
        }
    }

    /// Build from column vectors, each of length `h`. Used to stack button
    /// traces side by side.
    pub fn from_columns(columns: &[Vec<f32>], h: usize) -> Self {
        let w = columns.len();
        let mut img = Self::new(w, h);
        for (x, col) in columns.iter().enumerate() {
            for (y, &v) in col.iter().take(h).enumerate() {
                img.data[y * w + x] = v;
            }
        }
        img
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Copy column `x` out as a depth trace.
    pub fn column(&self, x: usize) -> Vec<f32> {
        (0..self.h).map(|y| self.get(x, y)).collect()
    }
}

impl crate::image::traits::ImageView for ImageF32 {
    type Pixel = f32;

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
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[f32]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}

impl crate::image::traits::ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }

    #[inline]
    fn as_mut_slice(&mut self) -> Option<&mut [f32]> {
        if self.stride == self.w {
            Some(&mut self.data[..self.w * self.h])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageView;

    #[test]
    fn from_columns_stacks_traces() {
        let img = ImageF32::from_columns(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]], 3);
        assert_eq!(img.w, 2);
        assert_eq!(img.h, 3);
        assert_eq!(img.row(1), &[2.0, 5.0]);
        assert_eq!(img.column(1), vec![4.0, 5.0, 6.0]);
    }
}
