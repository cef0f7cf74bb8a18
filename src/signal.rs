//! One-dimensional signal utilities: Gaussian smoothing along depth and
//! peak picking on depth profiles.
//!
//! Smoothing is a normalised convolution: undefined samples (`None`) carry no
//! weight and stay undefined in the output, and the kernel is renormalised
//! over the defined taps it covers. This keeps rows without azimuthal
//! coverage from dragging neighbouring rows toward zero.

/// Trait implemented by symmetric 1-D filter kernels.
pub trait SeparableFilter {
    /// Return the taps in left-to-right order. The centre tap sits at index
    /// `taps().len() / 2`.
    fn taps(&self) -> &[f32];

    #[inline]
    fn radius(&self) -> usize {
        self.taps().len() / 2
    }
}

/// Sampled Gaussian truncated at four standard deviations.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    taps: Vec<f32>,
}

impl GaussianKernel {
    /// Build a kernel for `sigma` expressed in samples. A non-positive sigma
    /// yields the identity kernel.
    pub fn new(sigma: f32) -> Self {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Self { taps: vec![1.0] };
        }
        let radius = (4.0 * sigma + 0.5).floor() as usize;
        let denom = 2.0 * sigma * sigma;
        let mut taps: Vec<f32> = (0..=2 * radius)
            .map(|i| {
                let x = i as f32 - radius as f32;
                (-x * x / denom).exp()
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { taps }
    }

    /// Kernel whose sigma is given in depth units, sampled at `step`.
    pub fn from_depth(sigma_m: f64, step_m: f64) -> Self {
        if step_m <= 0.0 {
            return Self::new(0.0);
        }
        // Whole samples only.
        Self::new((sigma_m / step_m).round() as f32)
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Smooth a profile with undefined samples using normalised convolution.
pub fn smooth_masked(signal: &[Option<f32>], filter: &dyn SeparableFilter) -> Vec<Option<f32>> {
    let taps = filter.taps();
    let radius = filter.radius() as isize;
    let n = signal.len() as isize;
    let mut out = Vec::with_capacity(signal.len());
    for i in 0..n {
        if signal[i as usize].is_none() {
            out.push(None);
            continue;
        }
        let mut acc = 0.0f64;
        let mut weight = 0.0f64;
        for (k, &tap) in taps.iter().enumerate() {
            let j = i + k as isize - radius;
            if j < 0 || j >= n {
                continue;
            }
            if let Some(v) = signal[j as usize] {
                acc += (tap * v) as f64;
                weight += tap as f64;
            }
        }
        out.push((weight > 0.0).then(|| (acc / weight) as f32));
    }
    out
}

/// Smooth a fully defined profile.
pub fn smooth(signal: &[f32], filter: &dyn SeparableFilter) -> Vec<f32> {
    let wrapped: Vec<Option<f32>> = signal.iter().map(|&v| Some(v)).collect();
    smooth_masked(&wrapped, filter)
        .into_iter()
        .zip(signal)
        .map(|(s, &raw)| s.unwrap_or(raw))
        .collect()
}

/// Find local maxima of `signal`.
///
/// Flat-topped maxima report the middle sample of the plateau (rounded
/// down). Peaks lower than `min_height` are discarded, then peaks closer than
/// `min_distance` samples to a higher kept peak are removed. Returned indices
/// are ascending.
pub fn find_peaks(signal: &[f32], min_height: Option<f32>, min_distance: usize) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let mut i = 1;
    while i < n - 1 {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    if let Some(h) = min_height {
        peaks.retain(|&p| signal[p] >= h);
    }

    if min_distance > 1 && peaks.len() > 1 {
        let mut order: Vec<usize> = (0..peaks.len()).collect();
        order.sort_by(|&a, &b| {
            signal[peaks[b]]
                .partial_cmp(&signal[peaks[a]])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        let mut keep = vec![true; peaks.len()];
        for &idx in &order {
            if !keep[idx] {
                continue;
            }
            let p = peaks[idx];
            for (other, kept) in keep.iter_mut().enumerate() {
                if other != idx && *kept && peaks[other].abs_diff(p) < min_distance {
                    *kept = false;
                }
            }
        }
        peaks = peaks
            .into_iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(p))
            .collect();
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_kernel_is_normalised_and_symmetric() {
        let k = GaussianKernel::new(2.5);
        let sum: f32 = k.taps().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        let taps = k.taps();
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-7);
        }
        assert_eq!(GaussianKernel::new(0.0).taps(), &[1.0]);
    }

    #[test]
    fn smoothing_preserves_constant_and_gaps() {
        let signal = vec![Some(3.0), Some(3.0), None, Some(3.0), Some(3.0)];
        let out = smooth_masked(&signal, &GaussianKernel::new(1.0));
        assert_eq!(out[2], None);
        for v in out.iter().flatten() {
            assert!((v - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn peaks_respect_height_and_distance() {
        let signal = [0.0, 1.0, 0.0, 5.0, 0.0, 0.0, 2.0, 2.0, 0.0, 4.0, 0.0];
        assert_eq!(find_peaks(&signal, None, 1), vec![1, 3, 6, 9]);
        assert_eq!(find_peaks(&signal, Some(3.0), 1), vec![3, 9]);
        // Peak at 1 is within 3 samples of the taller peak at 3.
        assert_eq!(find_peaks(&signal, None, 3), vec![3, 6, 9]);
    }

    #[test]
    fn flat_signal_has_no_peaks() {
        assert!(find_peaks(&[1.0; 16], None, 1).is_empty());
    }
}
