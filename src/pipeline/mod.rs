//! End-to-end processing of one logged interval.
//!
//! [`BoreholeImager`] chains the stages in order:
//! - button QC on the raw channels (report only),
//! - speed and pad normalization,
//! - azimuthal reconstruction and intensity normalization,
//! - cutoff optimization over the zone of interest,
//! - coal segmentation with optional siderite exclusion and formation labels,
//! - fracture, bedding and fault detection.
//!
//! Stage timings are collected in a [`TimingBreakdown`](crate::diagnostics::TimingBreakdown).

mod params;
mod runner;

pub use params::{CutoffSource, PipelineParams};
pub use runner::{BoreholeImager, PipelineResult};
