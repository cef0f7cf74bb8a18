//! Gap-aware azimuthal mapping.
//!
//! Each pad is interpolated on its own, in pad-local coordinates, from its
//! own usable buttons. Bins outside every pad, and pad bins beyond the
//! outermost usable button, stay `Gap`. Each pad's filled bins are then
//! median-smoothed along azimuth without reading gaps or other pads. Rows are
//! independent, so the row loop can be split across Rayon workers over
//! disjoint row chunks.
use super::median::{median_run, MedianScratch};
use super::{AzimuthalMedianParams, ReconstructedImage};
use crate::error::{ImagerError, Result};
use crate::image::{Coverage, CoverageGrid, ImageF32, ImageView};
use crate::normalize::NormalizedChannels;
use crate::tool::{PadLayout, ToolGeometry};
use crate::types::ParallelOptions;
use log::{debug, warn};
use std::cmp::Ordering;

/// Builds the raw-conductivity azimuthal image.
#[derive(Clone, Debug)]
pub struct AzimuthalImageBuilder {
    bins: usize,
    median: AzimuthalMedianParams,
    parallel: ParallelOptions,
}

impl AzimuthalImageBuilder {
    pub fn new(bins: usize) -> Self {
        Self {
            bins,
            median: AzimuthalMedianParams::default(),
            parallel: ParallelOptions::default(),
        }
    }

    pub fn with_median(mut self, median: AzimuthalMedianParams) -> Self {
        self.median = median;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(
        &self,
        channels: &NormalizedChannels,
        geometry: &ToolGeometry,
    ) -> Result<ReconstructedImage> {
        geometry.validate()?;
        if self.bins == 0 {
            return Err(ImagerError::InvalidGeometry(
                "azimuth grid needs at least one bin".to_string(),
            ));
        }
        if channels.pads.len() != geometry.pad_count() {
            return Err(ImagerError::InvalidGeometry(format!(
                "{} pad rasters for a {}-pad tool",
                channels.pads.len(),
                geometry.pad_count()
            )));
        }
        for (p, (img, pad)) in channels.pads.iter().zip(&geometry.pads).enumerate() {
            if img.w != pad.buttons {
                return Err(ImagerError::GeometryMismatch {
                    pad: p,
                    expected: pad.buttons,
                    actual: img.w,
                });
            }
        }

        let rows = channels.rows();
        if let Some(rot) = &channels.reference_azimuth {
            if rot.len() != rows {
                return Err(ImagerError::ChannelLength {
                    what: "reference azimuth".to_string(),
                    expected: rows,
                    actual: rot.len(),
                });
            }
        }

        let layouts = geometry.layouts();
        let ctx = RowMapper {
            layouts: &layouts,
            pads: &channels.pads,
            rotation: channels.reference_azimuth.as_deref(),
            bins: self.bins,
            median_radius: self.median.radius(),
        };

        let mut values = ImageF32::new(self.bins, rows);
        let mut coverage = CoverageGrid::new(self.bins, rows);

        if self.parallel.should_parallelize(rows) {
            #[cfg(feature = "parallel")]
            {
                ctx.fill_parallel(&mut values, &mut coverage);
                return Ok(self.finish(channels, values, coverage));
            }
        }
        ctx.fill_sequential(&mut values, &mut coverage);
        Ok(self.finish(channels, values, coverage))
    }

    fn finish(
        &self,
        channels: &NormalizedChannels,
        values: ImageF32,
        coverage: CoverageGrid,
    ) -> ReconstructedImage {
        let image = ReconstructedImage::new(
            channels.depths.clone(),
            channels.depth_step,
            values,
            coverage,
        );
        let uncovered = (0..image.rows())
            .filter(|&y| image.coverage.covered_in_row(y) == 0)
            .count();
        if uncovered > 0 {
            warn!("reconstruct: {uncovered} rows have no azimuthal coverage");
        }
        debug!(
            "reconstruct: rows={} bins={} coverage={:.3} median_width={}",
            image.rows(),
            image.azimuth_bins(),
            image.coverage_fraction(),
            if self.median.enabled { self.median.width } else { 1 }
        );
        image
    }
}

struct RowMapper<'a> {
    layouts: &'a [PadLayout],
    pads: &'a [ImageF32],
    rotation: Option<&'a [f32]>,
    bins: usize,
    median_radius: usize,
}

#[derive(Default)]
struct RowScratch {
    buttons: Vec<(f32, f32)>,
    filled: Vec<usize>,
    median: MedianScratch,
}

impl RowMapper<'_> {
    fn fill_sequential(&self, values: &mut ImageF32, coverage: &mut CoverageGrid) {
        let mut scratch = RowScratch::default();
        for (y, (vals, cov)) in values
            .data
            .chunks_mut(self.bins)
            .zip(coverage.data.chunks_mut(self.bins))
            .enumerate()
        {
            self.fill_row(y, vals, cov, &mut scratch);
        }
    }

    #[cfg(feature = "parallel")]
    fn fill_parallel(&self, values: &mut ImageF32, coverage: &mut CoverageGrid) {
        use rayon::prelude::*;

        values
            .data
            .par_chunks_mut(self.bins)
            .zip(coverage.data.par_chunks_mut(self.bins))
            .enumerate()
            .for_each_init(RowScratch::default, |scratch, (y, (vals, cov))| {
                self.fill_row(y, vals, cov, scratch);
            });
    }

    fn fill_row(
        &self,
        y: usize,
        vals: &mut [f32],
        cov: &mut [Coverage],
        scratch: &mut RowScratch,
    ) {
        let rotation = match self.rotation {
            Some(r) => r[y],
            None => 0.0,
        };
        if !rotation.is_finite() {
            return;
        }
        for (layout, pad) in self.layouts.iter().zip(self.pads) {
            let buttons = &mut scratch.buttons;
            buttons.clear();
            buttons.extend(
                layout
                    .button_local
                    .iter()
                    .zip(pad.row(y))
                    .filter(|(_, v)| v.is_finite())
                    .map(|(&pos, &v)| (pos, v)),
            );
            if buttons.is_empty() {
                continue;
            }
            buttons.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            scratch.filled.clear();
            map_pad(layout, buttons, self.bins, rotation, vals, cov, &mut scratch.filled);
            median_run(&scratch.filled, self.bins, self.median_radius, vals, &mut scratch.median);
        }
    }
}

/// Fill the bins under one pad from its usable buttons `(local, value)`,
/// sorted by local position. Bins already claimed by an earlier pad are left
/// alone. The bins filled here are appended to `filled` in azimuth order.
fn map_pad(
    layout: &PadLayout,
    buttons: &[(f32, f32)],
    n_bins: usize,
    rotation: f32,
    vals: &mut [f32],
    cov: &mut [Coverage],
    filled: &mut Vec<usize>,
) {
    let width = 360.0 / n_bins as f32;
    let lo = buttons[0].0;
    let hi = buttons[buttons.len() - 1].0;

    for (bin, local) in layout.bins(n_bins, rotation) {
        if !cov[bin].is_gap() {
            continue;
        }
        let mut sum = 0.0f32;
        let mut hits = 0usize;
        for &(pos, v) in buttons {
            if pos >= local && pos < local + width {
                sum += v;
                hits += 1;
            }
        }
        if hits > 0 {
            vals[bin] = sum / hits as f32;
            cov[bin] = Coverage::Measured;
            filled.push(bin);
            continue;
        }
        if local < lo || local > hi {
            continue;
        }
        let right = buttons.partition_point(|b| b.0 < local).min(buttons.len() - 1);
        let left = right.saturating_sub(1);
        let (p0, v0) = buttons[left];
        let (p1, v1) = buttons[right];
        vals[bin] = if p1 > p0 {
            v0 + (v1 - v0) * (local - p0) / (p1 - p0)
        } else {
            v1
        };
        cov[bin] = Coverage::Interpolated;
        filled.push(bin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizationReport;

    fn channels(geometry: &ToolGeometry, rows: usize, f: impl Fn(usize, usize) -> f32) -> NormalizedChannels {
        let pads = geometry
            .pads
            .iter()
            .enumerate()
            .map(|(p, pad)| {
                let cols: Vec<Vec<f32>> = (0..pad.buttons).map(|b| vec![f(p, b); rows]).collect();
                ImageF32::from_columns(&cols, rows)
            })
            .collect();
        NormalizedChannels {
            depths: (0..rows).map(|i| i as f64 * 0.01).collect(),
            depth_step: 0.01,
            pads,
            reference_azimuth: None,
            report: NormalizationReport::default(),
        }
    }

    #[test]
    fn values_never_cross_pad_boundaries() {
        let geometry = ToolGeometry::evenly_spaced(4, 6, 40.0);
        let norm = channels(&geometry, 3, |p, _| if p % 2 == 0 { 1.0 } else { 100.0 });
        let img = AzimuthalImageBuilder::new(360).build(&norm, &geometry).unwrap();
        for y in 0..img.rows() {
            for x in 0..360 {
                if let Some(v) = img.value(x, y) {
                    assert!(v == 1.0 || v == 100.0, "bin {x} mixes pads: {v}");
                }
            }
        }
        // Pad 1 spans 70..110; neighbours of the span are gap.
        assert!(img.value(69, 0).is_none());
        assert!(img.value(111, 0).is_none());
        assert_eq!(img.value(70, 0), Some(100.0));
    }

    #[test]
    fn coverage_matches_pad_spans() {
        let geometry = ToolGeometry::evenly_spaced(8, 12, 25.0);
        let norm = channels(&geometry, 5, |_, b| b as f32 + 1.0);
        let img = AzimuthalImageBuilder::new(360).build(&norm, &geometry).unwrap();
        let expected = geometry.expected_coverage();
        assert!(
            (img.coverage_fraction() - expected).abs() <= 8.0 / 360.0,
            "coverage {} expected {}",
            img.coverage_fraction(),
            expected
        );
    }

    #[test]
    fn dead_edge_button_shrinks_pad_coverage() {
        let geometry = ToolGeometry::evenly_spaced(1, 5, 40.0).with_button_order(crate::tool::ButtonOrder::Ascending);
        // Pad spans 340..20; button 4 sits on the high edge.
        let norm = channels(&geometry, 2, |_, b| if b == 4 { f32::NAN } else { 5.0 });
        let img = AzimuthalImageBuilder::new(360).build(&norm, &geometry).unwrap();
        assert!(img.value(5, 0).is_some());
        assert!(img.value(15, 0).is_none(), "beyond the last live button");
    }

    #[test]
    fn rotation_shifts_the_layout() {
        let geometry = ToolGeometry::evenly_spaced(1, 5, 40.0);
        let mut norm = channels(&geometry, 2, |_, _| 3.0);
        norm.reference_azimuth = Some(vec![0.0, 180.0]);
        let img = AzimuthalImageBuilder::new(360).build(&norm, &geometry).unwrap();
        assert!(img.value(0, 0).is_some());
        assert!(img.value(180, 0).is_none());
        assert!(img.value(0, 1).is_none());
        assert!(img.value(180, 1).is_some());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let geometry = ToolGeometry::evenly_spaced(6, 8, 30.0);
        let norm = channels(&geometry, 64, |p, b| (p * 8 + b) as f32 * 0.5 + 1.0);
        let seq = AzimuthalImageBuilder::new(180)
            .with_parallel(ParallelOptions::disabled())
            .build(&norm, &geometry)
            .unwrap();
        let par = AzimuthalImageBuilder::new(180)
            .with_parallel(ParallelOptions::new(true, 1))
            .build(&norm, &geometry)
            .unwrap();
        assert_eq!(seq.values, par.values);
        assert_eq!(seq.coverage, par.coverage);
    }

    #[test]
    fn median_clips_single_button_spikes_within_the_pad() {
        let geometry = ToolGeometry::evenly_spaced(1, 5, 40.0).with_button_order(crate::tool::ButtonOrder::Ascending);
        // Button 2 sits at local 20; its bin neighbours interpolate to 45.5.
        let norm = channels(&geometry, 2, |_, b| if b == 2 { 50.0 } else { 5.0 });
        let row_max = |img: &ReconstructedImage| {
            (0..360)
                .filter_map(|x| img.value(x, 0))
                .fold(f32::MIN, f32::max)
        };
        let raw = AzimuthalImageBuilder::new(360)
            .with_median(AzimuthalMedianParams::disabled())
            .build(&norm, &geometry)
            .unwrap();
        let smoothed = AzimuthalImageBuilder::new(360).build(&norm, &geometry).unwrap();
        assert_eq!(row_max(&raw), 50.0);
        assert!((row_max(&smoothed) - 45.5).abs() < 1e-4, "max={}", row_max(&smoothed));
        assert_eq!(raw.coverage, smoothed.coverage);
    }
}
