use foundation::SlotId;

/// Metrics reported for one algorithm, one entry per tolerance level.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSeries {
    pub slot: SlotId,
    pub algorithm: String,
    pub point_counts: Vec<u64>,
    pub positional_errors: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotReduction {
    pub slot: SlotId,
    pub algorithm: String,
    pub simplified: u64,
    /// `None` when the original has no vertices.
    pub percent_decrease: Option<f64>,
    pub positional_error: Option<f64>,
}

/// Point-count reduction at one tolerance level.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionSummary {
    pub tolerance_index: usize,
    pub original: u64,
    pub slots: Vec<SlotReduction>,
}

/// `(original - simplified) / original * 100`, rounded to two decimals.
pub fn percent_decrease(original: u64, simplified: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    let pct = (original as f64 - simplified as f64) / original as f64 * 100.0;
    Some((pct * 100.0).round() / 100.0)
}

impl ReductionSummary {
    /// Each slot's decrease is computed from its own count only.
    ///
    /// Returns `None` if any slot has no count at `tolerance_index`.
    pub fn at(original: u64, slots: &[SlotSeries], tolerance_index: usize) -> Option<Self> {
        let mut out = Vec::with_capacity(slots.len());
        for s in slots {
            let simplified = *s.point_counts.get(tolerance_index)?;
            out.push(SlotReduction {
                slot: s.slot,
                algorithm: s.algorithm.clone(),
                simplified,
                percent_decrease: percent_decrease(original, simplified),
                positional_error: s.positional_errors.get(tolerance_index).copied(),
            });
        }
        Some(Self {
            tolerance_index,
            original,
            slots: out,
        })
    }

    pub fn slot(&self, slot: SlotId) -> Option<&SlotReduction> {
        self.slots.iter().find(|s| s.slot == slot)
    }
}
