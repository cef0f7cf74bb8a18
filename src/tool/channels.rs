//! Raw per-button measurement sequences on a shared depth axis.
//!
//! Vendor nulls, negative conductivities and non-finite samples are folded
//! into `NaN` on ingestion; every later stage treats `NaN` as "no reading".
use crate::error::{ImagerError, Result};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Null marker used by the logging vendor.
pub const NULL_VALUE: f32 = -9999.0;

/// Identifies one sensor button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ButtonId {
    pub pad: usize,
    pub button: usize,
}

impl ButtonId {
    pub fn new(pad: usize, button: usize) -> Self {
        Self { pad, button }
    }
}

#[inline]
fn sanitize(v: f32) -> f32 {
    if !v.is_finite() || v < 0.0 || (v - NULL_VALUE).abs() < 0.5 {
        f32::NAN
    } else {
        v
    }
}

fn sanitize_all(values: impl IntoIterator<Item = f32>) -> Vec<f32> {
    values.into_iter().map(sanitize).collect()
}

/// Per-button sequences plus logging speed and optional tool rotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "ChannelDump", into = "ChannelDump")]
pub struct RawChannelSet {
    depths: Vec<f64>,
    channels: BTreeMap<ButtonId, Vec<f32>>,
    speed: Vec<f32>,
    reference_azimuth: Option<Vec<f32>>,
}

impl RawChannelSet {
    /// Empty set on `depths` (metres, increasing) with the logging speed
    /// sampled on the same axis.
    pub fn new(depths: Vec<f64>, speed: Vec<f32>) -> Self {
        Self {
            depths,
            channels: BTreeMap::new(),
            speed: sanitize_all(speed),
            reference_azimuth: None,
        }
    }

    /// Add or replace one button trace.
    pub fn insert(&mut self, id: ButtonId, values: Vec<f32>) {
        self.channels.insert(id, sanitize_all(values));
    }

    /// Attach the per-depth azimuth of the pad-1 reference (tool rotation).
    pub fn with_reference_azimuth(mut self, azimuth_deg: Vec<f32>) -> Self {
        self.reference_azimuth = Some(azimuth_deg);
        self
    }

    #[inline]
    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    #[inline]
    pub fn speed(&self) -> &[f32] {
        &self.speed
    }

    #[inline]
    pub fn reference_azimuth(&self) -> Option<&[f32]> {
        self.reference_azimuth.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn channel(&self, id: ButtonId) -> Option<&[f32]> {
        self.channels.get(&id).map(Vec::as_slice)
    }

    /// Channels in (pad, button) order.
    pub fn channels(&self) -> impl Iterator<Item = (ButtonId, &[f32])> {
        self.channels.iter().map(|(id, v)| (*id, v.as_slice()))
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of channels supplied for `pad`.
    pub fn buttons_on_pad(&self, pad: usize) -> usize {
        self.channels.keys().filter(|id| id.pad == pad).count()
    }

    /// Nominal depth sampling interval: median spacing of the depth axis.
    pub fn depth_step(&self) -> f64 {
        let diffs = self.depths.windows(2).map(|w| (w[1] - w[0]) as f32);
        stats::median(diffs).map(f64::from).unwrap_or(0.0)
    }

    /// Check every sequence against the depth axis.
    pub fn validate_lengths(&self) -> Result<()> {
        let expected = self.depths.len();
        let check = |what: String, actual: usize| -> Result<()> {
            if actual == expected {
                Ok(())
            } else {
                Err(ImagerError::ChannelLength {
                    what,
                    expected,
                    actual,
                })
            }
        };
        check("speed".to_string(), self.speed.len())?;
        if let Some(az) = &self.reference_azimuth {
            check("reference azimuth".to_string(), az.len())?;
        }
        for (id, values) in &self.channels {
            check(
                format!("pad {} button {}", id.pad, id.button),
                values.len(),
            )?;
        }
        Ok(())
    }

    /// Crop every sequence to depths within `[top, base]`.
    pub fn restrict_to_zone(&self, top: f64, base: f64) -> Self {
        let keep: Vec<usize> = self
            .depths
            .iter()
            .enumerate()
            .filter(|(_, &d)| d >= top && d <= base)
            .map(|(i, _)| i)
            .collect();
        let pick = |src: &[f32]| -> Vec<f32> {
            keep.iter()
                .map(|&i| src.get(i).copied().unwrap_or(f32::NAN))
                .collect()
        };
        Self {
            depths: keep.iter().map(|&i| self.depths[i]).collect(),
            channels: self
                .channels
                .iter()
                .map(|(id, v)| (*id, pick(v)))
                .collect(),
            speed: pick(&self.speed),
            reference_azimuth: self.reference_azimuth.as_deref().map(pick),
        }
    }
}

/// One button trace in serialized form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ButtonChannel {
    pub pad: usize,
    pub button: usize,
    pub values: Vec<f32>,
}

/// Serialized form of [`RawChannelSet`]. JSON maps need string keys, so the
/// buttons travel as a list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelDump {
    pub depths: Vec<f64>,
    pub speed: Vec<f32>,
    #[serde(default)]
    pub reference_azimuth: Option<Vec<f32>>,
    pub channels: Vec<ButtonChannel>,
}

impl From<ChannelDump> for RawChannelSet {
    fn from(dump: ChannelDump) -> Self {
        let mut set = RawChannelSet::new(dump.depths, dump.speed);
        set.reference_azimuth = dump.reference_azimuth;
        for ch in dump.channels {
            set.insert(ButtonId::new(ch.pad, ch.button), ch.values);
        }
        set
    }
}

impl From<RawChannelSet> for ChannelDump {
    fn from(set: RawChannelSet) -> Self {
        Self {
            depths: set.depths,
            speed: set.speed,
            reference_azimuth: set.reference_azimuth,
            channels: set
                .channels
                .into_iter()
                .map(|(id, values)| ButtonChannel {
                    pad: id.pad,
                    button: id.button,
                    values,
                })
                .collect(),
        }
    }
}

/// Bulk-density log used to reject siderite bands, on its own depth axis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DensityLog {
    pub depths: Vec<f64>,
    pub values: Vec<f32>,
}

impl DensityLog {
    pub fn new(depths: Vec<f64>, values: Vec<f32>) -> Self {
        Self { depths, values }
    }

    /// Linear interpolation onto `target` depths, clamping to the end values
    /// outside the logged interval. Missing density samples are skipped; the
    /// result is all `NaN` when nothing usable remains.
    pub fn resample(&self, target: &[f64]) -> Vec<f32> {
        let points: Vec<(f64, f32)> = self
            .depths
            .iter()
            .zip(&self.values)
            .filter(|(d, v)| d.is_finite() && v.is_finite())
            .map(|(&d, &v)| (d, v))
            .collect();
        if points.is_empty() {
            return vec![f32::NAN; target.len()];
        }
        let last = points.len() - 1;
        target
            .iter()
            .map(|&z| {
                if z <= points[0].0 {
                    return points[0].1;
                }
                if z >= points[last].0 {
                    return points[last].1;
                }
                let hi = points.partition_point(|p| p.0 < z);
                let (d0, v0) = points[hi - 1];
                let (d1, v1) = points[hi];
                if d1 <= d0 {
                    return v1;
                }
                let t = ((z - d0) / (d1 - d0)) as f32;
                v0 + (v1 - v0) * t
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_become_missing() {
        let mut set = RawChannelSet::new(vec![0.0, 0.1, 0.2, 0.3], vec![1.0; 4]);
        set.insert(ButtonId::new(0, 0), vec![1.0, NULL_VALUE, -2.0, f32::INFINITY]);
        let ch = set.channel(ButtonId::new(0, 0)).unwrap();
        assert_eq!(ch[0], 1.0);
        assert!(ch[1..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn restrict_to_zone_crops_all_sequences() {
        let depths: Vec<f64> = (0..10).map(|i| 100.0 + i as f64 * 0.5).collect();
        let mut set = RawChannelSet::new(depths, (0..10).map(|i| i as f32).collect())
            .with_reference_azimuth(vec![0.0; 10]);
        set.insert(ButtonId::new(0, 0), (0..10).map(|i| i as f32 * 2.0).collect());
        let zone = set.restrict_to_zone(101.0, 102.0);
        assert_eq!(zone.depths(), &[101.0, 101.5, 102.0]);
        assert_eq!(zone.speed(), &[2.0, 3.0, 4.0]);
        assert_eq!(zone.channel(ButtonId::new(0, 0)).unwrap(), &[4.0, 6.0, 8.0]);
        assert!(zone.validate_lengths().is_ok());
    }

    #[test]
    fn length_mismatch_is_reported() {
        let mut set = RawChannelSet::new(vec![0.0, 1.0, 2.0], vec![1.0; 3]);
        set.insert(ButtonId::new(1, 3), vec![1.0, 2.0]);
        match set.validate_lengths() {
            Err(ImagerError::ChannelLength {
                expected, actual, ..
            }) => {
                assert_eq!((expected, actual), (3, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn density_resample_interpolates_and_clamps() {
        let log = DensityLog::new(vec![10.0, 11.0, 12.0], vec![2.0, f32::NAN, 3.0]);
        let out = log.resample(&[9.0, 11.0, 12.5]);
        assert_eq!(out[0], 2.0);
        assert!((out[1] - 2.5).abs() < 1e-6);
        assert_eq!(out[2], 3.0);
    }

    #[test]
    fn dump_round_trip_sanitizes() {
        let json = r#"{"depths":[0.0,0.002],"speed":[1.0,1.0],
            "channels":[{"pad":0,"button":1,"values":[-9999.0,4.0]}]}"#;
        let set: RawChannelSet = serde_json::from_str(json).unwrap();
        let ch = set.channel(ButtonId::new(0, 1)).unwrap();
        assert!(ch[0].is_nan());
        assert_eq!(ch[1], 4.0);
        assert!(set.reference_azimuth().is_none());
    }
}
