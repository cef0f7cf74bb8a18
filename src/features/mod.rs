//! Fracture, bedding and fault detection.
//!
//! All three kinds share one skeleton: a [`GradientPass`] (direction, kernel,
//! percentile) yields a masked gradient field and a strict-threshold mask,
//! then [`extract_regions`] applies the same morphology, labelling and size
//! filters under a kind-specific [`RegionCriteria`]. The passes only read the
//! image and run concurrently when parallelism is enabled.
mod bedding;
mod fault;
mod fracture;

pub use bedding::{detect_beddings, Bedding, BeddingParams, DipEstimate};
pub use fault::{associate_fractures, detect_faults, Fault, FaultParams};
pub use fracture::{detect_fractures, Fracture, FractureParams};

use crate::edges::morphology::StructuringShape;
use crate::edges::{
    label_regions, masked_gradient, BinaryMask, Connectivity, GradientDirection, GradientField,
    GradientKernel, Region, StructuringElement,
};
use crate::reconstruct::ReconstructedImage;
use crate::types::{DepthRange, ParallelOptions};
use log::debug;
use serde::{Deserialize, Serialize};

/// Gradient selection of one detection pass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradientPass {
    pub direction: GradientDirection,
    pub kernel: GradientKernel,
    /// Cells must exceed this percentile of all defined magnitudes.
    pub percentile: f32,
}

/// Thresholded gradient of one pass.
#[derive(Clone, Debug)]
pub struct ThresholdedGradient {
    pub field: GradientField,
    pub mask: BinaryMask,
    pub threshold: Option<f32>,
}

impl GradientPass {
    pub fn run(&self, image: &ReconstructedImage) -> ThresholdedGradient {
        let field = masked_gradient(&image.values, &image.coverage, self.direction, self.kernel);
        let (mask, threshold) = field.threshold(self.percentile);
        ThresholdedGradient {
            mask: BinaryMask::from_vec(field.width(), field.height(), mask),
            field,
            threshold,
        }
    }
}

/// Morphological step: shape plus iteration count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MorphologyStep {
    pub element: StructuringShape,
    pub iterations: usize,
}

/// Acceptance rules applied to the thresholded mask.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionCriteria {
    pub opening: Option<MorphologyStep>,
    pub closing: Option<MorphologyStep>,
    pub connectivity: Connectivity,
    pub min_pixels: usize,
    pub min_rows: usize,
}

/// Clean the mask, label it, and keep regions meeting the size rules.
pub fn extract_regions(gradient: &ThresholdedGradient, criteria: &RegionCriteria) -> Vec<Region> {
    let mut mask = gradient.mask.clone();
    if let Some(step) = &criteria.opening {
        mask = mask.open(&StructuringElement::from(&step.element), step.iterations);
    }
    if let Some(step) = &criteria.closing {
        mask = mask.close(&StructuringElement::from(&step.element), step.iterations);
    }
    let regions = label_regions(&mask, criteria.connectivity);
    let total = regions.len();
    let kept: Vec<Region> = regions
        .into_iter()
        .filter(|r| r.len() >= criteria.min_pixels && r.row_extent() >= criteria.min_rows)
        .collect();
    debug!(
        "regions: masked={} cleaned={} components={} kept={}",
        gradient.mask.count(),
        mask.count(),
        total,
        kept.len()
    );
    kept
}

/// Rows needed to span `metres` at `step` sampling.
pub(crate) fn rows_for(metres: f64, step: f64) -> usize {
    if step <= 0.0 {
        return 1;
    }
    ((metres / step) - 1e-6).ceil().max(1.0) as usize
}

/// Depth interval covered by rows `first..=last`, base at the lower edge of
/// the last row.
pub(crate) fn row_interval(image: &ReconstructedImage, first: usize, last: usize) -> DepthRange {
    DepthRange::new(image.depths[first], image.depths[last] + image.depth_step)
}

/// Mean image value over the non-gap cells of a region.
pub(crate) fn region_mean(image: &ReconstructedImage, region: &Region) -> Option<f32> {
    crate::stats::mean(region.cells.iter().filter_map(|&(x, y)| image.value(x, y)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Fracture,
    Bedding,
    Fault,
}

/// One detected feature of any kind.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feature {
    Fracture(Fracture),
    Bedding(Bedding),
    Fault(Fault),
}

impl Feature {
    pub fn kind(&self) -> FeatureKind {
        match self {
            Feature::Fracture(_) => FeatureKind::Fracture,
            Feature::Bedding(_) => FeatureKind::Bedding,
            Feature::Fault(_) => FeatureKind::Fault,
        }
    }

    /// Depth extent; beddings are a single depth.
    pub fn depth_range(&self) -> DepthRange {
        match self {
            Feature::Fracture(f) => DepthRange::new(f.top, f.base),
            Feature::Bedding(b) => DepthRange::new(b.depth, b.depth),
            Feature::Fault(f) => DepthRange::new(f.top, f.base),
        }
    }
}

/// Output of one detector run: three independent ordered lists.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FeatureSet {
    pub fractures: Vec<Fracture>,
    pub beddings: Vec<Bedding>,
    pub faults: Vec<Fault>,
}

impl FeatureSet {
    /// All features, ordered by top depth.
    pub fn all(&self) -> Vec<Feature> {
        let mut out: Vec<Feature> = self
            .fractures
            .iter()
            .cloned()
            .map(Feature::Fracture)
            .chain(self.beddings.iter().cloned().map(Feature::Bedding))
            .chain(self.faults.iter().cloned().map(Feature::Fault))
            .collect();
        out.sort_by(|a, b| a.depth_range().top.total_cmp(&b.depth_range().top));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.fractures.is_empty() && self.beddings.is_empty() && self.faults.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Nominal borehole diameter, metres. Converts azimuth to arc length.
    pub borehole_diameter_m: f64,
    pub fracture: FractureParams,
    pub bedding: BeddingParams,
    pub fault: FaultParams,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            borehole_diameter_m: 0.216,
            fracture: FractureParams::default(),
            bedding: BeddingParams::default(),
            fault: FaultParams::default(),
        }
    }
}

pub struct FeatureDetector {
    params: FeatureParams,
    parallel: ParallelOptions,
}

impl FeatureDetector {
    pub fn new(params: FeatureParams) -> Self {
        Self {
            params,
            parallel: ParallelOptions::default(),
        }
    }

    pub fn with_parallel(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    /// Run the three passes, then cross-reference faults against fractures.
    pub fn detect(&self, image: &ReconstructedImage) -> FeatureSet {
        let p = &self.params;
        let fractures = || detect_fractures(image, &p.fracture, p.borehole_diameter_m);
        let beddings = || detect_beddings(image, &p.bedding, p.borehole_diameter_m);
        let faults = || detect_faults(image, &p.fault);

        let (fractures, (beddings, mut faults)) = if self.parallel.should_parallelize(image.rows()) {
            join(fractures, || join(beddings, faults))
        } else {
            (fractures(), (beddings(), faults()))
        };

        associate_fractures(&mut faults, &fractures, p.fault.association_azimuth_tolerance_deg);
        debug!(
            "features: fractures={} beddings={} faults={} (associated={})",
            fractures.len(),
            beddings.len(),
            faults.len(),
            faults.iter().filter(|f| f.fracture_association).count()
        );
        FeatureSet {
            fractures,
            beddings,
            faults,
        }
    }
}

#[cfg(feature = "parallel")]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    rayon::join(a, b)
}

#[cfg(not(feature = "parallel"))]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA,
    B: FnOnce() -> RB,
{
    (a(), b())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_for_rounds_up() {
        assert_eq!(rows_for(0.05, 0.002), 25);
        assert_eq!(rows_for(0.5, 0.01), 50);
        assert_eq!(rows_for(0.051, 0.01), 6);
        assert_eq!(rows_for(0.0, 0.01), 1);
    }
}
