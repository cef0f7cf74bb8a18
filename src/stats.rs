//! Small order-statistics helpers shared by the normalizers, the cutoff
//! optimizer and the feature detector.
//!
//! All helpers ignore non-finite samples. Percentiles use linear
//! interpolation between closest ranks, `q` in [0, 100].

use std::cmp::Ordering;

#[inline]
fn cmp_f32(a: &f32, b: &f32) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Percentile of `values` (finite samples only). Reorders the slice.
pub fn percentile_in_place(values: &mut Vec<f32>, q: f32) -> Option<f32> {
    values.retain(|v| v.is_finite());
    let n = values.len();
    if n == 0 {
        return None;
    }
    let rank = (q.clamp(0.0, 100.0) as f64 / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;

    let (_, lo_val, upper) = values.select_nth_unstable_by(lo, cmp_f32);
    let lo_val = *lo_val;
    if hi == lo {
        return Some(lo_val);
    }
    // The next order statistic is the minimum of the upper partition.
    let hi_val = upper.iter().copied().min_by(cmp_f32).unwrap_or(lo_val);
    Some(lo_val + (hi_val - lo_val) * frac)
}

/// Percentile of an iterator of samples.
pub fn percentile<I>(values: I, q: f32) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    let mut buf: Vec<f32> = values.into_iter().collect();
    percentile_in_place(&mut buf, q)
}

/// Median of an iterator of samples.
pub fn median<I>(values: I) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    percentile(values, 50.0)
}

/// Percentile of an already sorted slice of finite samples.
pub fn percentile_sorted(sorted: &[f32], q: f32) -> Option<f32> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = (q.clamp(0.0, 100.0) as f64 / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort finite samples ascending, dropping NaN/inf.
pub fn sorted_finite<I>(values: I) -> Vec<f32>
where
    I: IntoIterator<Item = f32>,
{
    let mut out: Vec<f32> = values.into_iter().filter(|v| v.is_finite()).collect();
    out.sort_by(cmp_f32);
    out
}

/// Arithmetic mean of finite samples.
pub fn mean<I>(values: I) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for v in values {
        if v.is_finite() {
            sum += v as f64;
            count += 1;
        }
    }
    (count > 0).then(|| (sum / count as f64) as f32)
}

/// Mean and population standard deviation of finite samples.
pub fn mean_std<I>(values: I) -> Option<(f32, f32)>
where
    I: IntoIterator<Item = f32>,
{
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0usize;
    for v in values {
        if v.is_finite() {
            let v = v as f64;
            sum += v;
            sum_sq += v * v;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let m = sum / count as f64;
    let var = (sum_sq / count as f64 - m * m).max(0.0);
    Some((m as f32, var.sqrt() as f32))
}

/// Fixed-width histogram over `[lo, hi]`.
#[derive(Clone, Debug)]
pub struct Histogram {
    pub lo: f32,
    pub hi: f32,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Build a histogram of finite `values` spanning their own range.
    ///
    /// Returns `None` when there are no samples or `bins == 0`.
    pub fn from_values(values: &[f32], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for &v in values.iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if !lo.is_finite() || !hi.is_finite() {
            return None;
        }
        let mut counts = vec![0u64; bins];
        let width = (hi - lo) / bins as f32;
        for &v in values.iter().filter(|v| v.is_finite()) {
            let idx = if width > 0.0 {
                (((v - lo) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }
        Some(Self { lo, hi, counts })
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn bin_width(&self) -> f32 {
        (self.hi - self.lo) / self.counts.len() as f32
    }

    #[inline]
    pub fn bin_center(&self, idx: usize) -> f32 {
        self.lo + (idx as f32 + 0.5) * self.bin_width()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// True when every sample fell into a single value (zero-width range).
    pub fn is_degenerate(&self) -> bool {
        self.hi <= self.lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_matches_linear_interpolation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(values.clone(), 0.0), Some(1.0));
        assert_eq!(percentile(values.clone(), 100.0), Some(5.0));
        assert_eq!(percentile(values.clone(), 50.0), Some(3.0));
        let p25 = percentile(vec![4.0, 1.0, 3.0, 2.0], 25.0).unwrap();
        assert!((p25 - 1.75).abs() < 1e-6, "p25={p25}");
    }

    #[test]
    fn percentile_ignores_nan_and_empty() {
        assert_eq!(percentile(vec![f32::NAN, 2.0], 50.0), Some(2.0));
        assert_eq!(percentile(Vec::<f32>::new(), 50.0), None);
        assert_eq!(median(vec![f32::NAN]), None);
    }

    #[test]
    fn sorted_percentile_agrees_with_select() {
        let raw: Vec<f32> = (0..97).map(|i| ((i * 37) % 97) as f32).collect();
        let sorted = sorted_finite(raw.iter().copied());
        for q in [1.0, 15.0, 50.0, 75.0, 99.0] {
            let a = percentile(raw.iter().copied(), q).unwrap();
            let b = percentile_sorted(&sorted, q).unwrap();
            assert!((a - b).abs() < 1e-5, "q={q} a={a} b={b}");
        }
    }

    #[test]
    fn histogram_counts_all_samples() {
        let values: Vec<f32> = (0..100).map(|v| v as f32).collect();
        let hist = Histogram::from_values(&values, 10).unwrap();
        assert_eq!(hist.total(), 100);
        assert!(hist.counts.iter().all(|&c| c == 10), "{:?}", hist.counts);
        assert!(!hist.is_degenerate());

        let flat = Histogram::from_values(&[3.0; 8], 4).unwrap();
        assert!(flat.is_degenerate());
        assert_eq!(flat.counts[0], 8);
    }

    #[test]
    fn mean_std_basic() {
        let (m, s) = mean_std(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((m - 5.0).abs() < 1e-6);
        assert!((s - 2.0).abs() < 1e-6);
        assert_eq!(mean(Vec::<f32>::new()), None);
    }
}
