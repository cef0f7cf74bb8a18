//! Independent threshold estimators over an intensity distribution.
//!
//! Every estimator is a plain function of the samples (or their histogram)
//! so each can be tested on its own. Failure to separate the distribution is
//! reported as [`ImagerError::DegenerateDistribution`].
use crate::error::{ImagerError, Result};
use crate::signal::{smooth, GaussianKernel};
use crate::stats::{self, Histogram};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Otsu,
    Median,
    Percentile,
    HistogramValley,
    GaussianMixture,
}

/// Two-class split maximizing between-class variance. Returns the centre of
/// the last bin of the lower class.
pub fn otsu(hist: &Histogram) -> Result<f32> {
    if hist.is_degenerate() {
        return Err(ImagerError::DegenerateDistribution(
            "otsu: all samples share one value".to_string(),
        ));
    }
    let total = hist.total() as f64;
    let sum_total: f64 = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, &c)| hist.bin_center(i) as f64 * c as f64)
        .sum();

    let mut best = 0.0f64;
    let mut threshold = None;
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    for (i, &count) in hist.counts.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += hist.bin_center(i) as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_total - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if between > best {
            best = between;
            threshold = Some(hist.bin_center(i));
        }
    }
    threshold.ok_or_else(|| {
        ImagerError::DegenerateDistribution("otsu: no separating split".to_string())
    })
}

/// `q`-th percentile of the sorted samples.
pub fn percentile_cutoff(sorted: &[f32], q: f32) -> Result<f32> {
    stats::percentile_sorted(sorted, q).ok_or(ImagerError::EmptyDistribution)
}

/// Lowest point of the Gaussian-smoothed histogram within the central band
/// `[lo_frac, hi_frac)` of bins.
pub fn histogram_valley(hist: &Histogram, lo_frac: f32, hi_frac: f32, sigma_bins: f32) -> Result<f32> {
    if hist.is_degenerate() {
        return Err(ImagerError::DegenerateDistribution(
            "valley: all samples share one value".to_string(),
        ));
    }
    let n = hist.bins();
    let start = ((lo_frac.clamp(0.0, 1.0) * n as f32) as usize).min(n - 1);
    let end = ((hi_frac.clamp(0.0, 1.0) * n as f32) as usize).clamp(start + 1, n);
    let counts: Vec<f32> = hist.counts.iter().map(|&c| c as f32).collect();
    let smoothed = smooth(&counts, &GaussianKernel::new(sigma_bins));
    let mut best = start;
    for i in start..end {
        if smoothed[i] < smoothed[best] {
            best = i;
        }
    }
    Ok(hist.bin_center(best))
}

/// Two-component Gaussian mixture fitted by EM on the histogram. Returns the
/// lower component's `mean + k·σ`.
pub fn gaussian_mixture(hist: &Histogram, sigma_multiplier: f32, max_iterations: usize) -> Result<f32> {
    if hist.is_degenerate() {
        return Err(ImagerError::DegenerateDistribution(
            "mixture: all samples share one value".to_string(),
        ));
    }
    let xs: Vec<f64> = (0..hist.bins()).map(|i| hist.bin_center(i) as f64).collect();
    let ws: Vec<f64> = hist.counts.iter().map(|&c| c as f64).collect();
    let total: f64 = ws.iter().sum();
    let (lo, hi) = (hist.lo as f64, hist.hi as f64);
    let range = hi - lo;

    let overall_mean = xs.iter().zip(&ws).map(|(x, w)| x * w).sum::<f64>() / total;
    let overall_var = xs
        .iter()
        .zip(&ws)
        .map(|(x, w)| w * (x - overall_mean).powi(2))
        .sum::<f64>()
        / total;
    let var_floor = (overall_var * 1e-6).max(f64::MIN_POSITIVE);

    let mut mean = [lo + 0.25 * range, lo + 0.75 * range];
    let mut var = [overall_var.max(var_floor); 2];
    let mut weight = [0.5f64; 2];
    let mut resp = vec![[0.0f64; 2]; xs.len()];
    let mut prev_ll = f64::NEG_INFINITY;

    for _ in 0..max_iterations.max(1) {
        let mut ll = 0.0;
        for (i, &x) in xs.iter().enumerate() {
            let mut p = [0.0f64; 2];
            for k in 0..2 {
                let d = x - mean[k];
                p[k] = weight[k] * (-0.5 * d * d / var[k]).exp()
                    / (2.0 * std::f64::consts::PI * var[k]).sqrt();
            }
            let s = p[0] + p[1];
            if s > 0.0 {
                resp[i] = [p[0] / s, p[1] / s];
                ll += ws[i] * s.ln();
            } else {
                // Far from both components: assign to the nearer mean.
                let near = usize::from((x - mean[1]).abs() < (x - mean[0]).abs());
                resp[i] = [0.0; 2];
                resp[i][near] = 1.0;
            }
        }
        for k in 0..2 {
            let nk: f64 = resp.iter().zip(&ws).map(|(r, w)| r[k] * w).sum();
            if nk <= 0.0 {
                return Err(ImagerError::DegenerateDistribution(
                    "mixture: component collapsed".to_string(),
                ));
            }
            mean[k] = resp
                .iter()
                .zip(xs.iter().zip(&ws))
                .map(|(r, (x, w))| r[k] * w * x)
                .sum::<f64>()
                / nk;
            var[k] = (resp
                .iter()
                .zip(xs.iter().zip(&ws))
                .map(|(r, (x, w))| r[k] * w * (x - mean[k]).powi(2))
                .sum::<f64>()
                / nk)
                .max(var_floor);
            weight[k] = nk / total;
        }
        if (ll - prev_ll).abs() < 1e-6 * total.max(1.0) {
            break;
        }
        prev_ll = ll;
    }

    let low = if mean[0] <= mean[1] { 0 } else { 1 };
    Ok((mean[low] + sigma_multiplier as f64 * var[low].sqrt()) as f32)
}
