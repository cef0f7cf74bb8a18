//! Gradient, morphology and connected-component building blocks for the
//! azimuth × depth grid.
//!
//! Every routine here treats the azimuth axis as periodic: column `N-1` is
//! adjacent to column `0`. The depth axis is not periodic; gradients clamp at
//! the first/last row and morphology treats cells beyond them as unset.
//!
//! - Gradients are masked: a gradient is undefined when any weighted tap
//!   falls on a gap cell.
//! - Morphology operates on [`BinaryMask`] with arbitrary structuring
//!   elements.
//! - Components are grown by BFS and track unwrapped azimuth so that
//!   statistics of a region straddling 0°/360° stay contiguous.

pub mod components;
pub mod grad;
pub mod morphology;

pub use components::{label_regions, Connectivity, Region};
pub use grad::{masked_gradient, GradientDirection, GradientField, GradientKernel};
pub use morphology::{BinaryMask, StructuringElement};
