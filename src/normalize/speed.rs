use crate::stats;

/// Per-row logging speed relative to the median speed of the run.
#[derive(Clone, Debug)]
pub struct SpeedFactors {
    pub median: Option<f32>,
    /// `None` where the speed sample was missing or non-positive.
    pub factors: Vec<Option<f32>>,
}

impl SpeedFactors {
    pub fn uncorrected_rows(&self) -> usize {
        self.factors.iter().filter(|f| f.is_none()).count()
    }

    /// Divide each sample by its row's factor. Rows without a factor pass
    /// through unchanged.
    pub fn apply(&self, trace: &[f32]) -> Vec<f32> {
        trace
            .iter()
            .zip(&self.factors)
            .map(|(&v, f)| match f {
                Some(f) => v / f,
                None => v,
            })
            .collect()
    }
}

/// Speed factors `speed / median(speed)` over usable speed samples.
pub fn relative_speed_factors(speed: &[f32]) -> SpeedFactors {
    let median = stats::median(speed.iter().copied().filter(|s| *s > 0.0));
    let factors = match median {
        Some(m) if m > 0.0 => speed
            .iter()
            .map(|&s| (s.is_finite() && s > 0.0).then(|| s / m))
            .collect(),
        _ => vec![None; speed.len()],
    };
    SpeedFactors { median, factors }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faster_rows_are_scaled_down() {
        let f = relative_speed_factors(&[1.0, 2.0, 1.0, f32::NAN, 0.0]);
        assert_eq!(f.median, Some(1.0));
        assert_eq!(f.uncorrected_rows(), 2);
        let out = f.apply(&[4.0, 4.0, 4.0, 4.0, 4.0]);
        assert_eq!(out, vec![4.0, 2.0, 4.0, 4.0, 4.0]);
    }
}
