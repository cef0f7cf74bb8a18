use super::params::{CutoffSource, PipelineParams};
use crate::coal::{summarize, CoalProfile, CoalSeam, CoalSegmenter, CoalSummary, FormationTops};
use crate::cutoff::{samples_from_profile, CutoffEstimate, CutoffOptimizer};
use crate::diagnostics::{Stopwatch, TimingBreakdown};
use crate::error::Result;
use crate::features::{FeatureDetector, FeatureSet};
use crate::normalize::{NormalizationReport, SpeedPadNormalizer};
use crate::qc::{self, QcReport};
use crate::reconstruct::{
    AzimuthalImageBuilder, ImageSummary, IntensityNormalizer, IntensityReport, ReconstructedImage,
};
use crate::tool::{DensityLog, RawChannelSet, ToolGeometry};
use crate::types::DepthRange;
use log::{debug, info};
use serde::Serialize;
use std::borrow::Cow;

/// Everything a processing run produces.
///
/// The reconstructed image and the coal profile are kept for callers that
/// render or post-process them but are left out of JSON reports.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineResult {
    pub interval: Option<DepthRange>,
    pub image_summary: ImageSummary,
    pub normalization: NormalizationReport,
    pub intensity: IntensityReport,
    pub cutoff: CutoffEstimate,
    pub seams: Vec<CoalSeam>,
    pub coal_summary: CoalSummary,
    pub features: FeatureSet,
    pub qc: QcReport,
    pub timings: TimingBreakdown,
    #[serde(skip)]
    pub coal_profile: CoalProfile,
    #[serde(skip)]
    pub image: ReconstructedImage,
}

/// Drives a raw channel set through normalization, reconstruction, cutoff
/// selection, coal segmentation and feature detection.
pub struct BoreholeImager {
    geometry: ToolGeometry,
    params: PipelineParams,
}

impl BoreholeImager {
    pub fn new(geometry: ToolGeometry, params: PipelineParams) -> Self {
        Self { geometry, params }
    }

    pub fn geometry(&self) -> &ToolGeometry {
        &self.geometry
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Process `raw`, optionally cropped to `zone`.
    ///
    /// `density` enables siderite exclusion; `formations` labels seams and
    /// adds the per-formation coal summary.
    pub fn run(
        &self,
        raw: &RawChannelSet,
        zone: Option<DepthRange>,
        density: Option<&DensityLog>,
        formations: Option<&FormationTops>,
    ) -> Result<PipelineResult> {
        let total = Stopwatch::start();
        let mut timings = TimingBreakdown::default();
        self.geometry.validate()?;
        raw.validate_lengths()?;

        let raw: Cow<'_, RawChannelSet> = match zone {
            Some(z) => Cow::Owned(raw.restrict_to_zone(z.top, z.base)),
            None => Cow::Borrowed(raw),
        };
        info!(
            "processing {} depth samples, {} channels, {}-pad tool",
            raw.len(),
            raw.channel_count(),
            self.geometry.pad_count()
        );

        let qc = timings.time("qc", || qc::inspect(&raw));

        let normalizer = SpeedPadNormalizer::new(self.params.normalization.clone());
        let normalized = timings.time("normalize", || normalizer.normalize(&raw, &self.geometry))?;
        let normalization = normalized.report.clone();

        let builder = AzimuthalImageBuilder::new(self.params.azimuth_bins)
            .with_median(self.params.azimuth_median.clone())
            .with_parallel(self.params.parallel);
        let image = timings.time("reconstruct", || builder.build(&normalized, &self.geometry))?;
        drop(normalized);

        let intensity_normalizer = IntensityNormalizer::new(self.params.intensity.clone());
        let (image, intensity) = timings.time("intensity", || intensity_normalizer.normalize(image));

        let segmenter = CoalSegmenter::new(self.params.coal.clone());
        let coal_profile = segmenter.profile(&image, density);

        let optimizer = CutoffOptimizer::new(self.params.cutoff.clone());
        let cutoff = timings.time("cutoff", || {
            let samples = match self.params.cutoff_source {
                CutoffSource::ImageCells => image.non_gap_values(),
                CutoffSource::SmoothedProfile => {
                    samples_from_profile(&coal_profile.smoothed, &coal_profile.excluded)
                }
            };
            optimizer.optimize(&samples)
        })?;

        let seams = timings.time("coal", || {
            segmenter.segment(&image, cutoff.cutoff, &coal_profile, formations)
        });
        let interval = zone.or_else(|| image_interval(&image));
        let coal_summary = summarize(
            &seams,
            interval.unwrap_or(DepthRange::new(0.0, 0.0)),
            formations,
        );

        let detector = FeatureDetector::new(self.params.features.clone())
            .with_parallel(self.params.parallel);
        let features = timings.time("features", || detector.detect(&image));

        timings.total_ms = total.elapsed_ms();
        debug!(
            "pipeline: cutoff={:.2} seams={} fractures={} beddings={} faults={} in {:.1} ms",
            cutoff.cutoff,
            seams.len(),
            features.fractures.len(),
            features.beddings.len(),
            features.faults.len(),
            timings.total_ms
        );

        Ok(PipelineResult {
            interval,
            image_summary: image.summary(),
            normalization,
            intensity,
            cutoff,
            seams,
            coal_summary,
            features,
            qc,
            timings,
            coal_profile,
            image,
        })
    }
}

/// Depth extent covered by the image rows.
fn image_interval(image: &ReconstructedImage) -> Option<DepthRange> {
    let top = *image.depths.first()?;
    let last = *image.depths.last()?;
    Some(DepthRange::new(top, last + image.depth_step))
}
