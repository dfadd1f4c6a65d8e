use std::sync::Arc;

use catalog::AlgorithmSelection;
use formats::{Dataset, FeatureCollection};
use foundation::{Generation, SlotId};

use crate::protocol::{ProtocolError, SimplifyRequest, SimplifyResponse};
use crate::request::{GateBusy, RequestGate};
use crate::tolerance::ToleranceSeries;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    Busy { pending: Generation },
    /// The dataset is not the one the cache is pinned to.
    DatasetMismatch,
    Protocol(ProtocolError),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Busy { pending } => {
                write!(f, "simplification {pending} is still in flight")
            }
            CacheError::DatasetMismatch => write!(f, "dataset is not pinned in the cache"),
            CacheError::Protocol(e) => write!(f, "malformed simplification response: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GateBusy> for CacheError {
    fn from(value: GateBusy) -> Self {
        CacheError::Busy {
            pending: value.pending,
        }
    }
}

/// Timing and memory reported by the service for one simplification run.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RunStats {
    pub elapsed_secs: f64,
    pub current_memory_bytes: u64,
    pub peak_memory_bytes: u64,
}

impl RunStats {
    /// Elapsed time rounded to two decimals for display.
    pub fn elapsed_rounded(&self) -> f64 {
        (self.elapsed_secs * 100.0).round() / 100.0
    }
}

/// One algorithm's simplified collections, one per tolerance level.
#[derive(Debug, Clone)]
pub struct AlgorithmSlot {
    pub slot: SlotId,
    pub algorithm: String,
    pub results: Vec<Arc<FeatureCollection>>,
}

/// Handle for an in-flight simplification.
///
/// Carries everything needed to validate and install the response, so the
/// cache never has to remember request parameters itself.
#[derive(Debug, Clone)]
pub struct SimplifyTicket {
    pub generation: Generation,
    pub dataset_version: String,
    pub series: ToleranceSeries,
    pub selection: AlgorithmSelection,
    pub request: SimplifyRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied {
        generation: Generation,
        version: u64,
        levels: usize,
        slots: usize,
    },
    /// Superseded, abandoned, or issued for a replaced dataset; nothing changed.
    Stale { generation: Generation },
}

/// Simplified results for the current dataset.
///
/// Contents are replaced all-or-nothing: a response either installs every
/// slot for every level, or leaves the previous contents untouched.
/// `version` increments whenever the contents change, so derived data
/// (metrics) can tell whether it still describes what is installed.
#[derive(Debug, Default)]
pub struct SimplificationCache {
    gate: RequestGate,
    pinned_dataset: Option<String>,
    series: Option<ToleranceSeries>,
    slots: Vec<AlgorithmSlot>,
    stats: Option<RunStats>,
    installed: Option<Generation>,
    version: u64,
}

impl SimplificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the cache to a dataset fingerprint.
    ///
    /// Switching to a different dataset clears the contents and abandons any
    /// pending request. Returns `true` if anything was invalidated.
    pub fn pin_dataset(&mut self, fingerprint: Option<&str>) -> bool {
        if self.pinned_dataset.as_deref() == fingerprint {
            return false;
        }
        self.pinned_dataset = fingerprint.map(str::to_string);
        let had_contents = !self.slots.is_empty();
        let abandoned = self.gate.abandon().is_some();
        self.clear_contents();
        had_contents || abandoned
    }

    pub fn pinned_dataset(&self) -> Option<&str> {
        self.pinned_dataset.as_deref()
    }

    pub fn begin(
        &mut self,
        dataset: &Dataset,
        series: ToleranceSeries,
        selection: AlgorithmSelection,
    ) -> Result<SimplifyTicket, CacheError> {
        if self.pinned_dataset.as_deref() != Some(dataset.fingerprint()) {
            return Err(CacheError::DatasetMismatch);
        }
        let generation = self.gate.try_acquire()?;

        let request = SimplifyRequest {
            geojson: Arc::clone(dataset.collection()),
            tolerances: series.values().to_vec(),
            algorithms: selection.algorithms().to_vec(),
        };

        Ok(SimplifyTicket {
            generation,
            dataset_version: dataset.fingerprint().to_string(),
            series,
            selection,
            request,
        })
    }

    pub fn is_current(&self, ticket: &SimplifyTicket) -> bool {
        self.gate.is_current(ticket.generation)
            && self.pinned_dataset.as_deref() == Some(ticket.dataset_version.as_str())
    }

    /// Installs a response if `ticket` is still the pending request.
    ///
    /// A malformed response releases the gate and returns an error; the
    /// previous contents stay installed.
    pub fn complete(
        &mut self,
        ticket: &SimplifyTicket,
        mut response: SimplifyResponse,
    ) -> Result<Completion, CacheError> {
        if !self.is_current(ticket) {
            return Ok(Completion::Stale {
                generation: ticket.generation,
            });
        }
        self.gate.release(ticket.generation);

        let tolerances = ticket.series.values();
        let mut slots = Vec::with_capacity(ticket.selection.len());
        for (slot, algorithm) in ticket.selection.slots() {
            let levels = response
                .simplified_data
                .remove(algorithm)
                .ok_or_else(|| ProtocolError::MissingAlgorithm(algorithm.to_string()))
                .map_err(CacheError::Protocol)?;
            let results = levels
                .resolve(algorithm, tolerances)
                .map_err(CacheError::Protocol)?;
            slots.push(AlgorithmSlot {
                slot,
                algorithm: algorithm.to_string(),
                results: results.into_iter().map(Arc::new).collect(),
            });
        }

        self.series = Some(ticket.series.clone());
        self.slots = slots;
        self.stats = Some(RunStats {
            elapsed_secs: response.elapsed_time,
            current_memory_bytes: response.current_memory_usage,
            peak_memory_bytes: response.peak_memory_usage,
        });
        self.installed = Some(ticket.generation);
        self.version += 1;

        Ok(Completion::Applied {
            generation: ticket.generation,
            version: self.version,
            levels: tolerances.len(),
            slots: self.slots.len(),
        })
    }

    /// Records a transport failure. Returns `false` if the ticket was stale.
    pub fn fail(&mut self, ticket: &SimplifyTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.gate.release(ticket.generation)
    }

    /// Forgets the pending request without touching installed contents.
    pub fn abandon(&mut self) -> Option<Generation> {
        self.gate.abandon()
    }

    /// Drops installed contents and abandons any pending request.
    pub fn clear(&mut self) -> Option<Generation> {
        let abandoned = self.gate.abandon();
        self.clear_contents();
        abandoned
    }

    fn clear_contents(&mut self) {
        let had = self.series.is_some() || !self.slots.is_empty();
        self.series = None;
        self.slots.clear();
        self.stats = None;
        self.installed = None;
        if had {
            self.version += 1;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn pending(&self) -> Option<Generation> {
        self.gate.pending()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn installed_generation(&self) -> Option<Generation> {
        self.installed
    }

    pub fn series(&self) -> Option<&ToleranceSeries> {
        self.series.as_ref()
    }

    pub fn slots(&self) -> &[AlgorithmSlot] {
        &self.slots
    }

    pub fn slot(&self, slot: SlotId) -> Option<&AlgorithmSlot> {
        self.slots.iter().find(|s| s.slot == slot)
    }

    pub fn stats(&self) -> Option<RunStats> {
        self.stats
    }

    /// Simplified collection for `slot` at tolerance level `index`.
    pub fn get(&self, slot: SlotId, index: usize) -> Option<&Arc<FeatureCollection>> {
        self.slot(slot)?.results.get(index)
    }

    /// Checks the structural invariants of the installed contents.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.slots.len() > SlotId::MAX_SLOTS {
            return Err(format!("{} slots installed", self.slots.len()));
        }
        match &self.series {
            None if !self.slots.is_empty() => {
                Err("slots installed without a tolerance series".to_string())
            }
            None => Ok(()),
            Some(series) => {
                for s in &self.slots {
                    if s.results.len() != series.len() {
                        return Err(format!(
                            "{} holds {} levels, series has {}",
                            s.slot,
                            s.results.len(),
                            series.len()
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}
