//! Runtime configuration for the `process_log` binary.
//!
//! ```json
//! {
//!   "input": "well_a/channels.json",
//!   "geometry": { "pads": [ { "buttons": 24, "span_deg": 30.0, "offset_deg": 0.0 } ] },
//!   "zone": { "top": 410.0, "base": 470.0 },
//!   "density": "well_a/density.json",
//!   "output": { "report_json": "out/report.json", "image_png": "out/image.png" },
//!   "params": { "azimuth_bins": 360 }
//! }
//! ```

use crate::coal::FormationTops;
use crate::error::{ImagerError, Result};
use crate::pipeline::PipelineParams;
use crate::tool::ToolGeometry;
use crate::types::DepthRange;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Full pipeline report (JSON).
    pub report_json: Option<PathBuf>,
    /// Coal seams only (JSON).
    pub seams_json: Option<PathBuf>,
    /// Detected features only (JSON).
    pub features_json: Option<PathBuf>,
    /// 8-bit preview of the normalized image.
    pub image_png: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Channel dump written by the channel provider.
    pub input: PathBuf,
    pub geometry: ToolGeometry,
    #[serde(default)]
    pub zone: Option<DepthRange>,
    /// Bulk-density log for siderite exclusion.
    #[serde(default)]
    pub density: Option<PathBuf>,
    #[serde(default)]
    pub formations: Option<FormationTops>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: PipelineParams,
}

impl RuntimeConfig {
    /// Resolve relative input and output paths against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.input);
        if let Some(p) = self.density.as_mut() {
            join(p);
        }
        for p in [
            &mut self.output.report_json,
            &mut self.output.seams_json,
            &mut self.output.features_json,
            &mut self.output.image_png,
        ]
        .into_iter()
        .flatten()
        {
            join(p);
        }
        self
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ImagerError::Config(format!("failed to read {}: {e}", path.display())))?;
    parse_config(&contents)
        .map_err(|e| ImagerError::Config(format!("{}: {e}", path.display())))
}

/// Parse a configuration document.
pub fn parse_config(contents: &str) -> Result<RuntimeConfig> {
    serde_json::from_str(contents).map_err(|e| ImagerError::Config(e.to_string()))
}
