//! Pad/button geometry of a circumferential multi-pad imager.
//!
//! Azimuths here are tool-relative: pad centres are measured from the pad-1
//! reference direction. When a per-depth reference azimuth is logged the
//! image builder rotates the whole layout by it.
//!
//! # Button order calibration
//!
//! Whether button 0 sits at the low or the high azimuth edge of its pad is
//! not recoverable from the channel data. Getting it wrong mirrors every pad
//! about its centre without any error. To calibrate, build an image of a
//! short interval containing a dipping bed with both [`ButtonOrder`] values
//! and keep the one whose per-pad traces join into a continuous sinusoid
//! (matching a vendor-processed reference image where available).
use crate::angle::{azimuth_difference, normalize_azimuth};
use crate::error::{ImagerError, Result};
use serde::{Deserialize, Serialize};

const SPAN_EPS: f32 = 1e-3;

/// Direction in which button indices advance across a pad face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonOrder {
    /// Button 0 at the low-azimuth edge of the pad.
    Ascending,
    /// Button 0 at the high-azimuth edge of the pad.
    #[default]
    Descending,
}

/// One pad: its button count, the azimuth range it covers, and where its
/// centre sits relative to the pad-1 reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PadGeometry {
    pub buttons: usize,
    pub span_deg: f32,
    pub offset_deg: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolGeometry {
    pub pads: Vec<PadGeometry>,
    #[serde(default)]
    pub button_order: ButtonOrder,
}

impl ToolGeometry {
    /// `pads` identical pads with centres every `360 / pads` degrees.
    pub fn evenly_spaced(pads: usize, buttons: usize, span_deg: f32) -> Self {
        let spacing = if pads > 0 { 360.0 / pads as f32 } else { 0.0 };
        Self {
            pads: (0..pads)
                .map(|i| PadGeometry {
                    buttons,
                    span_deg,
                    offset_deg: i as f32 * spacing,
                })
                .collect(),
            button_order: ButtonOrder::default(),
        }
    }

    pub fn with_button_order(mut self, order: ButtonOrder) -> Self {
        self.button_order = order;
        self
    }

    #[inline]
    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    pub fn total_buttons(&self) -> usize {
        self.pads.iter().map(|p| p.buttons).sum()
    }

    /// Sum of pad spans, in degrees.
    pub fn covered_span(&self) -> f32 {
        self.pads.iter().map(|p| p.span_deg).sum()
    }

    /// Fraction of the circumference under some pad.
    pub fn expected_coverage(&self) -> f32 {
        self.covered_span() / 360.0
    }

    /// Check that the pads form a valid non-overlapping layout.
    pub fn validate(&self) -> Result<()> {
        if self.pads.is_empty() {
            return Err(ImagerError::InvalidGeometry("tool has no pads".to_string()));
        }
        for (i, pad) in self.pads.iter().enumerate() {
            if pad.buttons == 0 {
                return Err(ImagerError::InvalidGeometry(format!("pad {i} has no buttons")));
            }
            if !(pad.span_deg > 0.0 && pad.span_deg <= 360.0) {
                return Err(ImagerError::InvalidGeometry(format!(
                    "pad {i} span {} outside (0, 360]",
                    pad.span_deg
                )));
            }
        }
        if self.covered_span() > 360.0 + SPAN_EPS {
            return Err(ImagerError::InvalidGeometry(format!(
                "pad spans sum to {:.2} degrees",
                self.covered_span()
            )));
        }
        for i in 0..self.pads.len() {
            for j in (i + 1)..self.pads.len() {
                let (a, b) = (&self.pads[i], &self.pads[j]);
                let dist = azimuth_difference(a.offset_deg, b.offset_deg);
                if dist + SPAN_EPS < 0.5 * (a.span_deg + b.span_deg) {
                    return Err(ImagerError::InvalidGeometry(format!(
                        "pads {i} and {j} overlap"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Per-pad lookup tables used by the image builder.
    pub fn layouts(&self) -> Vec<PadLayout> {
        self.pads
            .iter()
            .map(|pad| PadLayout::new(pad, self.button_order))
            .collect()
    }

    /// Tool-relative azimuth of a button, in [0, 360).
    pub fn button_azimuth(&self, pad: usize, button: usize) -> Option<f32> {
        let geom = self.pads.get(pad)?;
        if button >= geom.buttons {
            return None;
        }
        let layout = PadLayout::new(geom, self.button_order);
        Some(normalize_azimuth(layout.start_deg + layout.button_local[button]))
    }
}

/// Pad-local coordinate frame: position 0 is the low-azimuth edge of the
/// pad, position `span_deg` the high edge.
#[derive(Clone, Debug, PartialEq)]
pub struct PadLayout {
    /// Tool-relative azimuth of the low edge, in [0, 360).
    pub start_deg: f32,
    pub span_deg: f32,
    /// Pad-local position of each button, indexed by button number.
    pub button_local: Vec<f32>,
}

impl PadLayout {
    pub fn new(pad: &PadGeometry, order: ButtonOrder) -> Self {
        let n = pad.buttons;
        let spacing = if n > 1 {
            pad.span_deg / (n - 1) as f32
        } else {
            0.0
        };
        let button_local = (0..n)
            .map(|k| {
                if n == 1 {
                    return 0.5 * pad.span_deg;
                }
                match order {
                    ButtonOrder::Ascending => k as f32 * spacing,
                    ButtonOrder::Descending => pad.span_deg - k as f32 * spacing,
                }
            })
            .collect();
        Self {
            start_deg: normalize_azimuth(pad.offset_deg - 0.5 * pad.span_deg),
            span_deg: pad.span_deg,
            button_local,
        }
    }

    /// Azimuth bins of an `n_bins` grid whose sampling azimuth falls under
    /// this pad once the tool is rotated by `rotation_deg`. Yields
    /// `(bin, pad-local position)` in increasing local position.
    pub fn bins(&self, n_bins: usize, rotation_deg: f32) -> impl Iterator<Item = (usize, f32)> {
        let width = 360.0 / n_bins as f32;
        let start = normalize_azimuth(self.start_deg + rotation_deg);
        let first = (start / width - SPAN_EPS).ceil() as isize;
        let span = self.span_deg;
        (0..=n_bins as isize)
            .map(move |m| {
                let j = first + m;
                (j, j as f32 * width - start)
            })
            .take_while(move |&(_, local)| local <= span + SPAN_EPS)
            .map(move |(j, local)| (j.rem_euclid(n_bins as isize) as usize, local.max(0.0)))
            .take(n_bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evenly_spaced_tool_validates() {
        let tool = ToolGeometry::evenly_spaced(8, 12, 25.0);
        assert!(tool.validate().is_ok());
        assert!((tool.expected_coverage() - 200.0 / 360.0).abs() < 1e-6);
    }

    #[test]
    fn overlapping_pads_are_rejected() {
        let tool = ToolGeometry::evenly_spaced(8, 12, 50.0);
        assert!(matches!(
            tool.validate(),
            Err(ImagerError::InvalidGeometry(_))
        ));
        let empty = ToolGeometry::evenly_spaced(0, 12, 20.0);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn button_order_mirrors_pad() {
        let asc = ToolGeometry::evenly_spaced(4, 5, 40.0).with_button_order(ButtonOrder::Ascending);
        let desc = asc.clone().with_button_order(ButtonOrder::Descending);
        // Pad 1 centred on 90 degrees spans 70..110.
        assert!((asc.button_azimuth(1, 0).unwrap() - 70.0).abs() < 1e-4);
        assert!((desc.button_azimuth(1, 0).unwrap() - 110.0).abs() < 1e-4);
        assert!((desc.button_azimuth(1, 2).unwrap() - 90.0).abs() < 1e-4);
        assert!(asc.button_azimuth(1, 5).is_none());
    }

    #[test]
    fn pad_bins_wrap_across_north() {
        let tool = ToolGeometry::evenly_spaced(8, 12, 25.0);
        let layouts = tool.layouts();
        let bins: Vec<usize> = layouts[0].bins(360, 0.0).map(|(j, _)| j).collect();
        // Pad 0 spans 347.5..12.5: bins 348..=359 and 0..=12.
        assert_eq!(bins.len(), 25);
        assert_eq!(bins[0], 348);
        assert_eq!(*bins.last().unwrap(), 12);
        assert!(bins.contains(&0));
        assert!(!bins.contains(&347) && !bins.contains(&13));

        let rotated: Vec<usize> = layouts[0].bins(360, 90.0).map(|(j, _)| j).collect();
        assert_eq!(rotated[0], 78);
        assert_eq!(*rotated.last().unwrap(), 102);
    }
}
