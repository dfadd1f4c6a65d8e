/// Smallest accepted step between two tolerance levels.
pub const MIN_STEP: f64 = 0.02;

/// The comparison UI offers at most this many levels.
pub const DEFAULT_MAX_LEVELS: usize = 11;

/// Levels are stored with two decimals.
const SCALE: f64 = 100.0;

/// Absorbs representation error in `end / step` (e.g. `0.3 / 0.1 = 2.9999999999999996`).
const RATIO_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum ToleranceError {
    NotFinite,
    NonPositiveEnd { end: f64 },
    StepTooSmall { step: f64 },
    EndBelowStep { end: f64, step: f64 },
    TooManyLevels { levels: usize, max: usize },
    Degenerate { index: usize, value: f64 },
}

impl std::fmt::Display for ToleranceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToleranceError::NotFinite => write!(f, "end and step must be finite numbers"),
            ToleranceError::NonPositiveEnd { end } => {
                write!(f, "end must be greater than 0 (got {end})")
            }
            ToleranceError::StepTooSmall { step } => {
                write!(f, "step must be at least {MIN_STEP} (got {step})")
            }
            ToleranceError::EndBelowStep { end, step } => {
                write!(f, "end ({end}) must not be smaller than step ({step})")
            }
            ToleranceError::TooManyLevels { levels, max } => {
                write!(f, "{levels} tolerance levels requested, at most {max} allowed")
            }
            ToleranceError::Degenerate { index, value } => write!(
                f,
                "tolerance level {index} rounds to {value}, which repeats the previous level"
            ),
        }
    }
}

impl std::error::Error for ToleranceError {}

/// Ordered, strictly increasing tolerance levels starting at 0.
///
/// Immutable; a new comparison request generates a new series.
#[derive(Debug, Clone, PartialEq)]
pub struct ToleranceSeries {
    end: f64,
    step: f64,
    values: Vec<f64>,
}

/// Checks `(end, step)` without building the series; a front end uses this to
/// enable or disable its confirm action.
pub fn validate(end: f64, step: f64, max_levels: usize) -> Result<usize, ToleranceError> {
    if !end.is_finite() || !step.is_finite() {
        return Err(ToleranceError::NotFinite);
    }
    if end <= 0.0 {
        return Err(ToleranceError::NonPositiveEnd { end });
    }
    if step < MIN_STEP {
        return Err(ToleranceError::StepTooSmall { step });
    }
    if end < step {
        return Err(ToleranceError::EndBelowStep { end, step });
    }

    // Compared as f64 so huge ratios never reach an integer conversion.
    let steps = (end / step + RATIO_EPSILON).floor();
    if steps + 1.0 > max_levels as f64 {
        return Err(ToleranceError::TooManyLevels {
            levels: (steps as usize).saturating_add(1),
            max: max_levels,
        });
    }
    Ok(steps as usize + 1)
}

/// `series[i] = round(i * step, 2)` for `i = 0..=floor(end / step)`.
///
/// Each level is computed from its index; values are never accumulated.
pub fn generate_series(end: f64, step: f64) -> Result<ToleranceSeries, ToleranceError> {
    generate_series_with_limit(end, step, DEFAULT_MAX_LEVELS)
}

pub fn generate_series_with_limit(
    end: f64,
    step: f64,
    max_levels: usize,
) -> Result<ToleranceSeries, ToleranceError> {
    let levels = validate(end, step, max_levels)?;

    let mut values: Vec<f64> = Vec::with_capacity(levels);
    for index in 0..levels {
        let value = round2(index as f64 * step);
        if let Some(prev) = values.last()
            && value <= *prev
        {
            return Err(ToleranceError::Degenerate { index, value });
        }
        values.push(value);
    }

    Ok(ToleranceSeries { end, step, values })
}

fn round2(x: f64) -> f64 {
    (x * SCALE).round() / SCALE
}

impl ToleranceSeries {
    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn max_index(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// Index of the level equal to `value` (after two-decimal rounding).
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        let wanted = round2(value);
        self.values
            .iter()
            .position(|v| (v - wanted).abs() < RATIO_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::{ToleranceError, generate_series, generate_series_with_limit, validate};

    #[test]
    fn half_by_tenths_has_six_levels() {
        let s = generate_series(0.5, 0.1).expect("series");
        assert_eq!(s.values(), &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn default_product_series_has_eleven_levels() {
        let s = generate_series(0.5, 0.05).expect("series");
        assert_eq!(s.len(), 11);
        assert_eq!(s.get(1), Some(0.05));
        assert_eq!(s.get(10), Some(0.5));
    }

    #[test]
    fn representation_error_does_not_drop_last_level() {
        // 0.3 / 0.1 is 2.9999999999999996 in f64.
        let s = generate_series(0.3, 0.1).expect("series");
        assert_eq!(s.values(), &[0.0, 0.1, 0.2, 0.3]);
    }

    #[test]
    fn series_properties_hold_over_a_grid() {
        for end_c in 2..=100u32 {
            for step_c in 2..=end_c {
                let end = end_c as f64 / 100.0;
                let step = step_c as f64 / 100.0;
                let Ok(s) = generate_series_with_limit(end, step, usize::MAX) else {
                    panic!("valid input rejected: end={end} step={step}");
                };
                assert_eq!(s.get(0), Some(0.0));
                assert_eq!(s.len(), (end_c / step_c) as usize + 1, "end={end} step={step}");
                assert!(s.values().windows(2).all(|w| w[0] < w[1]));
                let again = generate_series_with_limit(end, step, usize::MAX).expect("series");
                let bits: Vec<u64> = s.values().iter().map(|v| v.to_bits()).collect();
                let again_bits: Vec<u64> = again.values().iter().map(|v| v.to_bits()).collect();
                assert_eq!(bits, again_bits);
            }
        }
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(generate_series(f64::NAN, 0.1), Err(ToleranceError::NotFinite));
        assert_eq!(generate_series(0.5, f64::NAN), Err(ToleranceError::NotFinite));
        assert_eq!(
            generate_series(0.0, 0.1),
            Err(ToleranceError::NonPositiveEnd { end: 0.0 })
        );
        assert_eq!(
            generate_series(0.5, 0.01),
            Err(ToleranceError::StepTooSmall { step: 0.01 })
        );
        assert_eq!(
            generate_series(0.05, 0.1),
            Err(ToleranceError::EndBelowStep {
                end: 0.05,
                step: 0.1
            })
        );
        assert_eq!(
            generate_series(1.0, 0.05),
            Err(ToleranceError::TooManyLevels { levels: 21, max: 11 })
        );
    }

    #[test]
    fn huge_ratios_are_too_many_levels() {
        assert_eq!(
            generate_series(1e20, 0.02),
            Err(ToleranceError::TooManyLevels {
                levels: usize::MAX,
                max: 11
            })
        );
        assert_eq!(
            generate_series(f64::MAX, 0.02),
            Err(ToleranceError::TooManyLevels {
                levels: usize::MAX,
                max: 11
            })
        );
        assert!(matches!(
            validate(1.0, 0.1, 0),
            Err(ToleranceError::TooManyLevels { max: 0, .. })
        ));
    }

    #[test]
    fn validate_reports_level_count() {
        assert_eq!(validate(0.5, 0.1, 11), Ok(6));
    }

    #[test]
    fn index_of_matches_rounded_values() {
        let s = generate_series(0.5, 0.1).expect("series");
        assert_eq!(s.index_of(0.3), Some(3));
        assert_eq!(s.index_of(0.1 + 0.2), Some(3));
        assert_eq!(s.index_of(0.35), None);
        assert_eq!(s.index_of(f64::NAN), None);
        assert_eq!(s.max_index(), 5);
    }
}
