//! Binary morphology on the azimuth × depth grid.
use crate::angle::wrap_column;
use crate::image::{ImageView, ImageViewMut};
use serde::{Deserialize, Serialize};

/// Row-major boolean raster.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryMask {
    pub w: usize,
    pub h: usize,
    pub data: Vec<bool>,
}

impl BinaryMask {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![false; w * h],
        }
    }

    pub fn from_vec(w: usize, h: usize, data: Vec<bool>) -> Self {
        assert_eq!(data.len(), w * h, "mask length must be w*h");
        Self { w, h, data }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        self.data[y * self.w + x] = v;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// `value` at the offset cell; azimuth wraps, rows outside return `None`.
    #[inline]
    fn offset_cell(&self, x: usize, y: usize, dx: isize, dy: isize) -> Option<bool> {
        let yy = y as isize + dy;
        if yy < 0 || yy >= self.h as isize {
            return None;
        }
        let xx = wrap_column(x as isize + dx, self.w);
        Some(self.data[yy as usize * self.w + xx])
    }

    /// Set where every element of `se` lands on a set cell. Cells beyond the
    /// first/last row count as unset.
    pub fn erode(&self, se: &StructuringElement) -> Self {
        let mut out = Self::new(self.w, self.h);
        for y in 0..self.h {
            for x in 0..self.w {
                let keep = se
                    .offsets
                    .iter()
                    .all(|&(dx, dy)| self.offset_cell(x, y, dx, dy).unwrap_or(false));
                out.data[y * self.w + x] = keep;
            }
        }
        out
    }

    /// Set where any element of the reflected `se` lands on a set cell.
    pub fn dilate(&self, se: &StructuringElement) -> Self {
        let mut out = Self::new(self.w, self.h);
        for y in 0..self.h {
            for x in 0..self.w {
                let hit = se
                    .offsets
                    .iter()
                    .any(|&(dx, dy)| self.offset_cell(x, y, -dx, -dy).unwrap_or(false));
                out.data[y * self.w + x] = hit;
            }
        }
        out
    }

    /// Erosion followed by dilation, `iterations` times each.
    pub fn open(&self, se: &StructuringElement, iterations: usize) -> Self {
        let mut out = self.clone();
        for _ in 0..iterations {
            out = out.erode(se);
        }
        for _ in 0..iterations {
            out = out.dilate(se);
        }
        out
    }

    /// Dilation followed by erosion, `iterations` times each.
    pub fn close(&self, se: &StructuringElement, iterations: usize) -> Self {
        let mut out = self.clone();
        for _ in 0..iterations {
            out = out.dilate(se);
        }
        for _ in 0..iterations {
            out = out.erode(se);
        }
        out
    }
}

impl ImageView for BinaryMask {
    type Pixel = bool;

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
    fn row(&self, y: usize) -> &[bool] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for BinaryMask {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [bool] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}

/// Structuring element as `(dx, dy)` offsets around the origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "shape", content = "size")]
pub enum StructuringShape {
    /// `n × n` square.
    Square(usize),
    /// Vertical line of `n` rows.
    VerticalLine(usize),
    /// Horizontal line of `n` columns.
    HorizontalLine(usize),
    /// `columns × rows` rectangle.
    Rectangle(usize, usize),
    /// Plus-shaped 4-neighbourhood of radius 1.
    Cross,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    pub offsets: Vec<(isize, isize)>,
}

impl StructuringElement {
    pub fn square(size: usize) -> Self {
        let (lo, hi) = centred(size);
        let offsets = (lo..=hi)
            .flat_map(|dy| (lo..=hi).map(move |dx| (dx, dy)))
            .collect();
        Self { offsets }
    }

    pub fn vertical_line(len: usize) -> Self {
        let (lo, hi) = centred(len);
        Self {
            offsets: (lo..=hi).map(|dy| (0, dy)).collect(),
        }
    }

    pub fn horizontal_line(len: usize) -> Self {
        let (lo, hi) = centred(len);
        Self {
            offsets: (lo..=hi).map(|dx| (dx, 0)).collect(),
        }
    }

    pub fn rectangle(columns: usize, rows: usize) -> Self {
        let (xlo, xhi) = centred(columns);
        let (ylo, yhi) = centred(rows);
        let offsets = (ylo..=yhi)
            .flat_map(|dy| (xlo..=xhi).map(move |dx| (dx, dy)))
            .collect();
        Self { offsets }
    }

    pub fn cross() -> Self {
        Self {
            offsets: vec![(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)],
        }
    }
}

impl From<&StructuringShape> for StructuringElement {
    fn from(shape: &StructuringShape) -> Self {
        match *shape {
            StructuringShape::Square(n) => Self::square(n),
            StructuringShape::VerticalLine(n) => Self::vertical_line(n),
            StructuringShape::HorizontalLine(n) => Self::horizontal_line(n),
            StructuringShape::Rectangle(c, r) => Self::rectangle(c, r),
            StructuringShape::Cross => Self::cross(),
        }
    }
}

/// Offset range of a centred run of `n` cells (origin at `n / 2`).
fn centred(n: usize) -> (isize, isize) {
    let n = n.max(1) as isize;
    let lo = -(n / 2);
    (lo, lo + n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_mask(w: usize, h: usize, x: usize, rows: std::ops::Range<usize>) -> BinaryMask {
        let mut m = BinaryMask::new(w, h);
        for y in rows {
            m.set(x, y, true);
        }
        m
    }

    #[test]
    fn vertical_opening_keeps_lines_drops_specks() {
        let mut m = column_mask(10, 20, 4, 2..15);
        m.set(8, 10, true);
        let opened = m.open(&StructuringElement::vertical_line(3), 1);
        assert!(!opened.get(8, 10));
        assert_eq!(opened.count(), 13);
    }

    #[test]
    fn narrow_rectangle_opening_keeps_double_columns_only() {
        let mut m = BinaryMask::new(12, 20);
        for y in 2..15 {
            m.set(3, y, true);
            m.set(4, y, true);
        }
        // Single-column streak and a short two-column blob.
        for y in 0..20 {
            m.set(7, y, true);
        }
        for y in 16..19 {
            m.set(9, y, true);
            m.set(10, y, true);
        }
        let opened = m.open(&StructuringElement::rectangle(2, 9), 1);
        assert_eq!(opened.count(), 26);
        assert!((2..15).all(|y| opened.get(3, y) && opened.get(4, y)));
        assert!(!opened.get(7, 10));
        assert!(!opened.get(9, 17));
    }

    #[test]
    fn rectangle_shape_deserializes() {
        let shape: StructuringShape = serde_json::from_str(r#"{ "shape": "rectangle", "size": [2, 9] }"#).unwrap();
        assert_eq!(shape, StructuringShape::Rectangle(2, 9));
        assert_eq!(StructuringElement::from(&shape).offsets.len(), 18);
    }

    #[test]
    fn closing_bridges_across_the_seam() {
        let mut m = BinaryMask::new(12, 5);
        for y in 1..4 {
            m.set(11, y, true);
            m.set(1, y, true);
        }
        let closed = m.close(&StructuringElement::square(3), 1);
        assert!(closed.get(0, 2), "gap at column 0 should be bridged");
        assert!(!closed.get(6, 2));
    }

    #[test]
    fn erosion_treats_outside_rows_as_unset() {
        let mut m = BinaryMask::new(4, 3);
        m.data.iter_mut().for_each(|v| *v = true);
        let eroded = m.erode(&StructuringElement::vertical_line(3));
        let set_in = |y: usize| (0..4).filter(|&x| eroded.get(x, y)).count();
        assert_eq!(set_in(0), 0);
        assert_eq!(set_in(1), 4);
        assert_eq!(set_in(2), 0);
    }
}
