use borehole_imager::image::{Coverage, CoverageGrid, ImageF32};
use borehole_imager::tool::{ButtonId, RawChannelSet, ToolGeometry};
use borehole_imager::ReconstructedImage;

/// Uniform depth axis of `rows` samples starting at `top`.
pub fn depth_axis(top: f64, rows: usize, step: f64) -> Vec<f64> {
    (0..rows).map(|i| top + i as f64 * step).collect()
}

/// Raw channels for `geometry`, each button reading `f(depth, azimuth)` where
/// azimuth is the button's tool-relative azimuth. Logging speed is constant.
pub fn raw_from_fn(
    geometry: &ToolGeometry,
    top: f64,
    rows: usize,
    step: f64,
    f: impl Fn(f64, f32) -> f32,
) -> RawChannelSet {
    let depths = depth_axis(top, rows, step);
    let mut raw = RawChannelSet::new(depths.clone(), vec![1.0; rows]);
    for (p, pad) in geometry.pads.iter().enumerate() {
        for b in 0..pad.buttons {
            let azimuth = geometry
                .button_azimuth(p, b)
                .expect("button inside declared geometry");
            let trace = depths.iter().map(|&d| f(d, azimuth)).collect();
            raw.insert(ButtonId::new(p, b), trace);
        }
    }
    raw
}

/// Fully measured image with `value(col, row)`.
pub fn image_from_fn(
    bins: usize,
    top: f64,
    rows: usize,
    step: f64,
    value: impl Fn(usize, usize) -> f32,
) -> ReconstructedImage {
    let mut values = ImageF32::new(bins, rows);
    let mut coverage = CoverageGrid::new(bins, rows);
    for y in 0..rows {
        for x in 0..bins {
            values.set(x, y, value(x, y));
            coverage.set(x, y, Coverage::Measured);
        }
    }
    ReconstructedImage::new(depth_axis(top, rows, step), step, values, coverage)
}

/// Deterministic pseudo-random values in `[0, 1)` (LCG).
pub fn noise(seed: u64, len: usize) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 40) as f32) / (1u64 << 24) as f32
        })
        .collect()
}
