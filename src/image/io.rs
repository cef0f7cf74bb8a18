//! Export helpers: JSON reports and PNG previews of the azimuthal image.
//!
//! - `write_json_file`: pretty-print a serializable value to disk.
//! - `read_json_file`: load a deserializable value from disk.
//! - `save_intensity_png`: write a [0, 255] image to a grayscale PNG, gap
//!   cells rendered white.
use super::{CoverageGrid, ImageF32, ImageView};
use crate::error::{ImagerError, Result};
use image::{GrayImage, Luma};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

const GAP_SHADE: u8 = 255;

/// Save an intensity image in [0, 255] as grayscale PNG. Columns are azimuth
/// bins, rows are depth samples (shallowest at the top).
pub fn save_intensity_png(image: &ImageF32, coverage: &CoverageGrid, path: &Path) -> Result<()> {
    assert!(
        image.same_shape(coverage),
        "coverage grid must match the image shape"
    );
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        let row = image.row(y);
        let tags = coverage.row(y);
        for (x, (&px, tag)) in row.iter().zip(tags).enumerate() {
            let shade = if tag.is_gap() {
                GAP_SHADE
            } else {
                px.clamp(0.0, 255.0) as u8
            };
            out.put_pixel(x as u32, y as u32, Luma([shade]));
        }
    }
    out.save(path)
        .map_err(|e| ImagerError::Io(format!("failed to save {}: {e}", path.display())))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        ImagerError::Io(format!(
            "failed to serialize JSON for {}: {e}",
            path.display()
        ))
    })?;
    fs::write(path, json)
        .map_err(|e| ImagerError::Io(format!("failed to write JSON {}: {e}", path.display())))
}

/// Read and deserialize a JSON document.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .map_err(|e| ImagerError::Io(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| ImagerError::Io(format!("failed to parse {}: {e}", path.display())))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                ImagerError::Io(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }
    Ok(())
}
