//! Coal seam segmentation on the azimuthally averaged image.
mod formation;
mod segmenter;

pub use formation::{summarize, CoalSummary, FormationSummary, FormationTop, FormationTops};
pub use segmenter::{CoalParams, CoalProfile, CoalSeam, CoalSegmenter};
