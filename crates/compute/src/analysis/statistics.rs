pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }
}

/// Positional error of one algorithm across the whole tolerance series.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ErrorSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Level index holding the largest error.
    pub worst_index: usize,
}

impl ErrorSummary {
    /// Non-finite entries are skipped; `None` when nothing finite remains.
    pub fn from_levels(errors: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = errors.iter().copied().filter(|v| v.is_finite()).collect();
        let mean = Statistics::mean(&finite)?;
        let (min, max) = Statistics::min_max(&finite)?;
        let worst_index = errors.iter().position(|&v| v == max)?;
        Some(Self {
            mean,
            min,
            max,
            worst_index,
        })
    }
}
