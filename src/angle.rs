//! Azimuth utilities used across the imaging pipeline.
//!
//! Azimuths are expressed in degrees and are periodic with period 360. Column
//! indices of an azimuth grid are periodic with period `N` (the bin count);
//! adjacency across the 0°/360° seam is index arithmetic modulo `N`.

/// Normalizes an azimuth into the range [0, 360).
#[inline]
pub fn normalize_azimuth(azimuth_deg: f32) -> f32 {
    let norm = azimuth_deg.rem_euclid(360.0);
    if norm >= 360.0 - 1e-4 {
        0.0
    } else {
        norm
    }
}

/// Smallest unsigned circular difference between two azimuths, in [0, 180].
#[inline]
pub fn azimuth_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Wraps a signed column index onto a grid of `n` azimuth bins.
#[inline]
pub fn wrap_column(col: isize, n: usize) -> usize {
    col.rem_euclid(n as isize) as usize
}

/// Circular mean of a set of azimuths in degrees.
///
/// Returns `None` for an empty set or when the resultant vector vanishes
/// (e.g. two diametrically opposed azimuths).
pub fn circular_mean<I>(azimuths: I) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    let mut sum_sin = 0.0f64;
    let mut sum_cos = 0.0f64;
    let mut count = 0usize;
    for az in azimuths {
        let rad = (az as f64).to_radians();
        sum_sin += rad.sin();
        sum_cos += rad.cos();
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let resultant = (sum_sin * sum_sin + sum_cos * sum_cos).sqrt() / count as f64;
    if resultant < 1e-9 {
        return None;
    }
    Some(normalize_azimuth(sum_sin.atan2(sum_cos).to_degrees() as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn normalize_azimuth_basic() {
        assert!(approx_eq(normalize_azimuth(45.0), 45.0));
        assert!(approx_eq(normalize_azimuth(-10.0), 350.0));
        assert!(approx_eq(normalize_azimuth(360.0), 0.0));
        assert!(approx_eq(normalize_azimuth(725.0), 5.0));
    }

    #[test]
    fn azimuth_difference_handles_wrap() {
        assert!(approx_eq(azimuth_difference(359.0, 1.0), 2.0));
        assert!(approx_eq(azimuth_difference(1.0, 359.0), 2.0));
        assert!(approx_eq(azimuth_difference(0.0, 180.0), 180.0));
        assert!(approx_eq(azimuth_difference(90.0, 45.0), 45.0));
    }

    #[test]
    fn wrap_column_is_modular() {
        assert_eq!(wrap_column(-1, 360), 359);
        assert_eq!(wrap_column(360, 360), 0);
        assert_eq!(wrap_column(361, 360), 1);
        assert_eq!(wrap_column(17, 360), 17);
    }

    #[test]
    fn circular_mean_across_seam() {
        let mean = circular_mean([358.0, 0.0, 2.0]).unwrap();
        assert!(approx_eq(mean, 0.0), "mean={mean}");
        let mean = circular_mean([88.0, 90.0, 92.0]).unwrap();
        assert!(approx_eq(mean, 90.0), "mean={mean}");
        assert!(circular_mean([0.0, 180.0]).is_none());
        assert!(circular_mean(std::iter::empty()).is_none());
    }
}
