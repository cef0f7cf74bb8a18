//! Raster containers for the azimuth × depth grid.
//!
//! Columns are azimuth bins (periodic), rows are depth samples (ordered).
pub mod coverage;
pub mod f32;
pub mod io;
pub mod traits;

pub use self::coverage::{Coverage, CoverageGrid};
pub use self::f32::ImageF32;
pub use self::traits::{ImageView, ImageViewMut};
