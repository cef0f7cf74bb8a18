//! Formation-top lookup and net-to-gross summaries.
use super::CoalSeam;
use crate::types::DepthRange;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormationTop {
    pub name: String,
    pub top: f64,
}

/// Formation tops sorted by depth.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FormationTop>", into = "Vec<FormationTop>")]
pub struct FormationTops {
    tops: Vec<FormationTop>,
}

impl From<Vec<FormationTop>> for FormationTops {
    fn from(mut tops: Vec<FormationTop>) -> Self {
        tops.sort_by(|a, b| a.top.total_cmp(&b.top));
        Self { tops }
    }
}

impl From<FormationTops> for Vec<FormationTop> {
    fn from(tops: FormationTops) -> Self {
        tops.tops
    }
}

impl FormationTops {
    pub fn new(tops: Vec<FormationTop>) -> Self {
        tops.into()
    }

    pub fn tops(&self) -> &[FormationTop] {
        &self.tops
    }

    /// Formation containing `depth`: the deepest top not below it.
    pub fn label_for(&self, depth: f64) -> Option<&str> {
        let idx = self.tops.partition_point(|t| t.top <= depth);
        idx.checked_sub(1).map(|i| self.tops[i].name.as_str())
    }

    /// Depth interval of formation `i`, clipped to `interval`.
    fn extent(&self, i: usize, interval: &DepthRange) -> Option<DepthRange> {
        let top = self.tops[i].top.max(interval.top);
        let base = self
            .tops
            .get(i + 1)
            .map_or(interval.base, |next| next.top)
            .min(interval.base);
        (base > top).then(|| DepthRange::new(top, base))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FormationSummary {
    pub name: String,
    pub top: f64,
    pub base: f64,
    pub gross_thickness: f64,
    pub seams: usize,
    pub coal_thickness: f64,
    pub net_to_gross: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CoalSummary {
    pub seam_count: usize,
    pub total_thickness: f64,
    pub gross_interval: f64,
    pub net_to_gross: f64,
    pub formations: Vec<FormationSummary>,
}

/// Net coal over the gross `interval`, overall and per formation.
pub fn summarize(seams: &[CoalSeam], interval: DepthRange, formations: Option<&FormationTops>) -> CoalSummary {
    let total: f64 = seams.iter().map(|s| s.thickness).sum();
    let gross = interval.height();
    let ntg = |net: f64, gross: f64| if gross > 0.0 { net / gross } else { 0.0 };

    let mut per_formation = Vec::new();
    if let Some(tops) = formations {
        for (i, top) in tops.tops().iter().enumerate() {
            let Some(extent) = tops.extent(i, &interval) else {
                continue;
            };
            let mine: Vec<&CoalSeam> = seams
                .iter()
                .filter(|s| s.formation.as_deref() == Some(top.name.as_str()))
                .collect();
            let coal: f64 = mine.iter().map(|s| s.thickness).sum();
            per_formation.push(FormationSummary {
                name: top.name.clone(),
                top: extent.top,
                base: extent.base,
                gross_thickness: extent.height(),
                seams: mine.len(),
                coal_thickness: coal,
                net_to_gross: ntg(coal, extent.height()),
            });
        }
    }

    CoalSummary {
        seam_count: seams.len(),
        total_thickness: total,
        gross_interval: gross,
        net_to_gross: ntg(total, gross),
        formations: per_formation,
    }
}
