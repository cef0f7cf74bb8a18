use crate::image::ImageF32;
use crate::stats;

/// Median of every usable reading on one pad.
pub fn pad_median(pad: &ImageF32) -> Option<f32> {
    stats::median(pad.data.iter().copied())
}

/// Global median (median of the pad medians) and per-pad scale factors
/// `global / pad`. Pads without a positive median keep scale 1.
pub fn pad_scales(medians: &[Option<f32>]) -> (Option<f32>, Vec<f32>) {
    let global = stats::median(medians.iter().flatten().copied().filter(|m| *m > 0.0));
    let scales = medians
        .iter()
        .map(|m| match (global, m) {
            (Some(g), Some(m)) if *m > 0.0 => g / m,
            _ => 1.0,
        })
        .collect();
    (global, scales)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_pad_keeps_unit_scale() {
        let (global, scales) = pad_scales(&[Some(2.0), None, Some(0.0), Some(4.0)]);
        assert_eq!(global, Some(3.0));
        assert_eq!(scales, vec![1.5, 1.0, 1.0, 0.75]);
    }
}
