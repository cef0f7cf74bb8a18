//! Run diagnostics shared by the pipeline and the binaries.
//!
//! Only per-stage timings live here; stage-specific audit data (normalisation
//! factors, cutoff estimators, QC findings) travels with each stage's output.

pub mod timing;

pub use timing::{StageTiming, Stopwatch, TimingBreakdown};
