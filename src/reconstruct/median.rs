//! Azimuth-only median smoothing inside one pad.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AzimuthalMedianParams {
    pub enabled: bool,
    /// Window length in bins; even widths are widened to the next odd one.
    pub width: usize,
}

impl Default for AzimuthalMedianParams {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 3,
        }
    }
}

impl AzimuthalMedianParams {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Half window, zero when the filter is a no-op.
    pub(crate) fn radius(&self) -> usize {
        if self.enabled {
            self.width / 2
        } else {
            0
        }
    }
}

/// Scratch reused across rows.
#[derive(Default)]
pub(crate) struct MedianScratch {
    original: Vec<f32>,
    window: Vec<f32>,
}

/// Replace each bin of `run` with the median of the `2 * radius + 1` bins
/// centred on it. `run` lists one pad's filled bins in azimuth order. A
/// window slot that leaves the run, or lands on a bin that is not exactly
/// that many steps away on the grid, takes the centre value instead, so
/// gaps and other pads are never read.
pub(crate) fn median_run(
    run: &[usize],
    n_bins: usize,
    radius: usize,
    vals: &mut [f32],
    scratch: &mut MedianScratch,
) {
    if radius == 0 || run.len() < 2 {
        return;
    }
    scratch.original.clear();
    scratch.original.extend(run.iter().map(|&b| vals[b]));
    let r = radius as isize;
    for (k, &bin) in run.iter().enumerate() {
        let centre = scratch.original[k];
        scratch.window.clear();
        for o in -r..=r {
            let i = k as isize + o;
            let slot = if i < 0 || i as usize >= run.len() {
                centre
            } else {
                let expected = (bin as isize + o).rem_euclid(n_bins as isize) as usize;
                if run[i as usize] == expected {
                    scratch.original[i as usize]
                } else {
                    centre
                }
            };
            scratch.window.push(slot);
        }
        scratch.window.sort_by(|a, b| a.total_cmp(b));
        vals[bin] = scratch.window[radius];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bin_speck_is_removed() {
        let mut vals = vec![0.0f32; 360];
        let run: Vec<usize> = (20..25).collect();
        for (&b, v) in run.iter().zip([5.0, 5.0, 90.0, 5.0, 5.0]) {
            vals[b] = v;
        }
        median_run(&run, 360, 1, &mut vals, &mut MedianScratch::default());
        assert!(run.iter().all(|&b| vals[b] == 5.0), "{:?}", &vals[20..25]);
    }

    #[test]
    fn pad_edges_ignore_neighbouring_bins() {
        let mut vals = vec![0.0f32; 360];
        vals[4] = 1000.0;
        vals[8] = 1000.0;
        vals[5] = 10.0;
        vals[6] = 20.0;
        vals[7] = 30.0;
        median_run(&[5, 6, 7], 360, 1, &mut vals, &mut MedianScratch::default());
        assert_eq!(&vals[4..9], &[1000.0, 10.0, 20.0, 30.0, 1000.0]);
    }

    #[test]
    fn holes_in_the_run_are_not_bridged() {
        let mut vals = vec![0.0f32; 8];
        vals[0] = 1.0;
        vals[1] = 2.0;
        vals[2] = 500.0;
        vals[3] = 3.0;
        median_run(&[0, 1, 3], 8, 1, &mut vals, &mut MedianScratch::default());
        assert_eq!(vals[1], 2.0);
        assert_eq!(vals[3], 3.0);
        assert_eq!(vals[2], 500.0);
    }

    #[test]
    fn run_wraps_through_zero() {
        let mut vals = vec![0.0f32; 8];
        vals[6] = 4.0;
        vals[7] = 40.0;
        vals[0] = 4.0;
        vals[1] = 4.0;
        median_run(&[6, 7, 0, 1], 8, 1, &mut vals, &mut MedianScratch::default());
        assert_eq!(vals[7], 4.0);
    }

    #[test]
    fn disabled_filter_has_zero_radius() {
        assert_eq!(AzimuthalMedianParams::default().radius(), 1);
        assert_eq!(AzimuthalMedianParams::disabled().radius(), 0);
        let wide = AzimuthalMedianParams {
            enabled: true,
            width: 4,
        };
        assert_eq!(wide.radius(), 2);
    }
}
