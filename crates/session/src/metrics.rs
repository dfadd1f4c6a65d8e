use compute::{ErrorSummary, ReductionSummary, SlotSeries};
use foundation::{Generation, SlotId};
use streaming::{MetricsRequest, MetricsResponse, ProtocolError, RequestGate, level_values};

/// Comparison metrics computed against one installed cache version.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    cache_version: u64,
    original_points: u64,
    perimeter: f64,
    slots: Vec<SlotSeries>,
}

impl MetricsSnapshot {
    pub fn from_response(
        cache_version: u64,
        slots: &[(SlotId, String)],
        levels: usize,
        response: &MetricsResponse,
    ) -> Result<Self, ProtocolError> {
        let mut series = Vec::with_capacity(slots.len());
        for (slot, algorithm) in slots {
            let counts = response
                .point_counts
                .simplified
                .get(algorithm)
                .ok_or_else(|| ProtocolError::MissingAlgorithm(algorithm.clone()))?;
            let errors = response
                .positional_errors
                .get(algorithm)
                .ok_or_else(|| ProtocolError::MissingAlgorithm(algorithm.clone()))?;
            series.push(SlotSeries {
                slot: *slot,
                algorithm: algorithm.clone(),
                point_counts: level_values(counts, levels, "pointCounts")?,
                positional_errors: level_values(errors, levels, "positionalErrors")?,
            });
        }

        Ok(Self {
            cache_version,
            original_points: response.point_counts.original,
            perimeter: response.perimeter,
            slots: series,
        })
    }

    /// The cache version this snapshot describes.
    pub fn cache_version(&self) -> u64 {
        self.cache_version
    }

    pub fn original_points(&self) -> u64 {
        self.original_points
    }

    /// Perimeter of the original geometry, in the dataset's units.
    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    pub fn slots(&self) -> &[SlotSeries] {
        &self.slots
    }

    pub fn slot(&self, slot: SlotId) -> Option<&SlotSeries> {
        self.slots.iter().find(|s| s.slot == slot)
    }

    pub fn reduction_at(&self, tolerance_index: usize) -> Option<ReductionSummary> {
        ReductionSummary::at(self.original_points, &self.slots, tolerance_index)
    }

    pub fn error_summary(&self, slot: SlotId) -> Option<ErrorSummary> {
        ErrorSummary::from_levels(&self.slot(slot)?.positional_errors)
    }
}

/// Handle for an in-flight metrics request.
#[derive(Debug, Clone)]
pub struct MetricsTicket {
    pub generation: Generation,
    pub cache_version: u64,
    pub slots: Vec<(SlotId, String)>,
    pub levels: usize,
    pub request: MetricsRequest,
}

/// What triggering metrics amounted to.
#[derive(Debug, Clone)]
pub enum MetricsStep {
    /// A snapshot for the installed comparison already exists.
    Toggled { visible: bool },
    Request(MetricsTicket),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricsOutcome {
    Toggled { visible: bool },
    Applied { generation: Generation },
    Discarded { generation: Generation },
}

#[derive(Debug, Default)]
pub(crate) struct MetricsPanel {
    pub(crate) gate: RequestGate,
    pub(crate) snapshot: Option<MetricsSnapshot>,
    pub(crate) visible: bool,
}

impl MetricsPanel {
    /// Drops the snapshot and forgets any pending request.
    pub(crate) fn invalidate(&mut self) {
        self.snapshot = None;
        self.visible = false;
        self.gate.abandon();
    }

    pub(crate) fn current(&self, cache_version: u64) -> Option<&MetricsSnapshot> {
        self.snapshot
            .as_ref()
            .filter(|s| s.cache_version == cache_version)
    }
}
