use std::sync::Arc;

use catalog::{AlgorithmRegistry, AlgorithmSelection};
use formats::{Dataset, DatasetSource, FeatureCollection};
use foundation::{Generation, SlotId};
use layers::{ActiveLayerSet, LayerSelector, ViewOptions};
use runtime::Operation;
use streaming::{
    CacheError, Completion, MetricsRequest, MetricsResponse, RequestGate, SimplificationCache,
    SimplifyResponse, SimplifyTicket, ToleranceSeries, generate_series_with_limit,
};

use crate::error::{TransportError, ValidationError, WorkbenchError};
use crate::export::{ExportArtifact, ExportOutcome, ExportTicket};
use crate::metrics::{MetricsOutcome, MetricsPanel, MetricsSnapshot, MetricsStep, MetricsTicket};

/// Where the workflow stands. Derived from the session contents, never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    NoDataset,
    DatasetLoaded,
    ComparisonActive,
    MetricsVisible,
}

/// Requests currently in flight.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Activity {
    pub loading_dataset: bool,
    pub simplifying: bool,
    pub computing_metrics: bool,
    pub exporting: bool,
}

impl Activity {
    pub fn is_idle(&self) -> bool {
        *self == Activity::default()
    }
}

/// Comparison parameters as entered, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRequest {
    pub end: f64,
    pub step: f64,
    pub algorithms: Vec<String>,
}

impl ComparisonRequest {
    pub fn new<I, S>(end: f64, step: f64, algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            end,
            step,
            algorithms: algorithms.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(
        &self,
        registry: &AlgorithmRegistry,
        max_levels: usize,
    ) -> Result<(ToleranceSeries, AlgorithmSelection), ValidationError> {
        let series = generate_series_with_limit(self.end, self.step, max_levels)?;
        let selection = registry.select(self.algorithms.as_slice())?;
        Ok((series, selection))
    }
}

#[derive(Debug, Clone)]
pub struct DatasetTicket {
    pub generation: Generation,
    pub source: DatasetSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOutcome {
    Loaded {
        generation: Generation,
        vertex_count: u64,
        attributes_missing: bool,
    },
    Discarded {
        generation: Generation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimplifyOutcome {
    Applied {
        generation: Generation,
        levels: usize,
        slots: usize,
    },
    Discarded {
        generation: Generation,
    },
}

/// The comparison state machine.
///
/// Every async operation is split into a `begin_*` step that validates and
/// takes the operation's gate, and a `finish_*` step that applies the
/// response only if its generation is still current. State is committed in
/// `finish_*` on success only; a failure leaves the previous state as it was.
#[derive(Debug, Default)]
pub struct Session {
    dataset: Option<Dataset>,
    dataset_gate: RequestGate,
    cache: SimplificationCache,
    tolerance_index: usize,
    view: ViewOptions,
    metrics: MetricsPanel,
    export_gate: RequestGate,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.dataset.is_none() {
            Phase::NoDataset
        } else if self.cache.is_empty() {
            Phase::DatasetLoaded
        } else if self.metrics.visible && self.metrics_snapshot().is_some() {
            Phase::MetricsVisible
        } else {
            Phase::ComparisonActive
        }
    }

    pub fn activity(&self) -> Activity {
        Activity {
            loading_dataset: self.dataset_gate.is_pending(),
            simplifying: self.cache.is_pending(),
            computing_metrics: self.metrics.gate.is_pending(),
            exporting: self.export_gate.is_pending(),
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn cache(&self) -> &SimplificationCache {
        &self.cache
    }

    pub fn series(&self) -> Option<&ToleranceSeries> {
        self.cache.series()
    }

    pub fn tolerance_index(&self) -> usize {
        self.tolerance_index
    }

    pub fn current_tolerance(&self) -> Option<f64> {
        self.cache.series()?.get(self.tolerance_index)
    }

    pub fn view(&self) -> ViewOptions {
        self.view
    }

    /// Snapshot for the installed comparison, whether shown or hidden.
    pub fn metrics_snapshot(&self) -> Option<&MetricsSnapshot> {
        self.metrics.current(self.cache.version())
    }

    pub fn metrics_visible(&self) -> bool {
        self.metrics.visible && self.metrics_snapshot().is_some()
    }

    pub fn begin_dataset_load(
        &mut self,
        source: DatasetSource,
    ) -> Result<DatasetTicket, WorkbenchError> {
        let generation = self
            .dataset_gate
            .try_acquire()
            .map_err(|_| WorkbenchError::Busy(Operation::LoadDataset))?;
        Ok(DatasetTicket { generation, source })
    }

    /// Installs a loaded collection; `attributes_missing` comes from the upload warning.
    pub fn finish_dataset_load(
        &mut self,
        ticket: &DatasetTicket,
        result: Result<(FeatureCollection, bool), TransportError>,
    ) -> Result<DatasetOutcome, WorkbenchError> {
        if !self.dataset_gate.release(ticket.generation) {
            return Ok(DatasetOutcome::Discarded {
                generation: ticket.generation,
            });
        }
        let (collection, attributes_missing) = result?;

        let dataset = Dataset::new(collection, ticket.source.clone())
            .with_attributes_missing(attributes_missing);
        let outcome = DatasetOutcome::Loaded {
            generation: ticket.generation,
            vertex_count: dataset.vertex_count(),
            attributes_missing,
        };
        self.install_dataset(dataset);
        Ok(outcome)
    }

    fn install_dataset(&mut self, dataset: Dataset) {
        self.cache.clear();
        self.cache.pin_dataset(Some(dataset.fingerprint()));
        self.metrics.invalidate();
        self.tolerance_index = 0;
        self.view = ViewOptions::default();
        self.dataset = Some(dataset);
    }

    /// Clears everything at once. Returns the operations whose pending
    /// requests were abandoned.
    pub fn reset(&mut self) -> Vec<Operation> {
        let mut abandoned = Vec::new();
        if self.dataset_gate.abandon().is_some() {
            abandoned.push(Operation::LoadDataset);
        }
        if self.cache.clear().is_some() {
            abandoned.push(Operation::Simplify);
        }
        self.cache.pin_dataset(None);
        if self.metrics.gate.is_pending() {
            abandoned.push(Operation::Metrics);
        }
        self.metrics.invalidate();
        if self.export_gate.abandon().is_some() {
            abandoned.push(Operation::Export);
        }
        self.dataset = None;
        self.tolerance_index = 0;
        self.view = ViewOptions::default();
        abandoned
    }

    /// Fails with `Busy` while a comparison is pending; call
    /// [`Session::disable_simplification`] first to start over.
    pub fn begin_simplify(
        &mut self,
        series: ToleranceSeries,
        selection: AlgorithmSelection,
    ) -> Result<SimplifyTicket, WorkbenchError> {
        let dataset = self.dataset.as_ref().ok_or(WorkbenchError::NoDataset)?;
        self.cache
            .begin(dataset, series, selection)
            .map_err(|e| match e {
                CacheError::Busy { .. } => WorkbenchError::Busy(Operation::Simplify),
                CacheError::DatasetMismatch => WorkbenchError::NoDataset,
                CacheError::Protocol(p) => {
                    TransportError::new(Operation::Simplify, p.to_string()).into()
                }
            })
    }

    pub fn finish_simplify(
        &mut self,
        ticket: &SimplifyTicket,
        result: Result<SimplifyResponse, TransportError>,
    ) -> Result<SimplifyOutcome, WorkbenchError> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if self.cache.fail(ticket) {
                    return Err(e.into());
                }
                return Ok(SimplifyOutcome::Discarded {
                    generation: ticket.generation,
                });
            }
        };

        match self.cache.complete(ticket, response) {
            Ok(Completion::Applied {
                generation,
                levels,
                slots,
                ..
            }) => {
                self.tolerance_index = 0;
                self.metrics.invalidate();
                Ok(SimplifyOutcome::Applied {
                    generation,
                    levels,
                    slots,
                })
            }
            Ok(Completion::Stale { generation }) => Ok(SimplifyOutcome::Discarded { generation }),
            Err(e) => Err(TransportError::new(Operation::Simplify, e.to_string()).into()),
        }
    }

    /// Drops the comparison and metrics; the dataset stays loaded.
    pub fn disable_simplification(&mut self) -> Option<Generation> {
        let abandoned = self.cache.clear();
        self.metrics.invalidate();
        self.tolerance_index = 0;
        abandoned
    }

    pub fn set_tolerance_index(&mut self, index: usize) -> Result<(), WorkbenchError> {
        let series = self.cache.series().ok_or(WorkbenchError::NoComparison)?;
        if index >= series.len() {
            return Err(ValidationError::ToleranceIndexOutOfRange {
                index,
                len: series.len(),
            }
            .into());
        }
        self.tolerance_index = index;
        Ok(())
    }

    /// Moves to the level whose tolerance equals `value`.
    pub fn select_tolerance_value(&mut self, value: f64) -> Result<usize, WorkbenchError> {
        let series = self.cache.series().ok_or(WorkbenchError::NoComparison)?;
        let index = series
            .index_of(value)
            .ok_or(ValidationError::UnknownTolerance { value })?;
        self.tolerance_index = index;
        Ok(index)
    }

    pub fn toggle_basemap(&mut self) -> Result<bool, WorkbenchError> {
        if self.dataset.is_none() {
            return Err(WorkbenchError::NoDataset);
        }
        self.view.basemap = !self.view.basemap;
        Ok(self.view.basemap)
    }

    pub fn toggle_attribute_panel(&mut self) -> Result<bool, WorkbenchError> {
        if self.dataset.is_none() {
            return Err(WorkbenchError::NoDataset);
        }
        self.view.attribute_panel = !self.view.attribute_panel;
        Ok(self.view.attribute_panel)
    }

    pub fn active_layers(&self) -> Result<ActiveLayerSet, WorkbenchError> {
        let dataset = self.dataset.as_ref().ok_or(WorkbenchError::NoDataset)?;
        Ok(ActiveLayerSet::project(
            dataset,
            &self.cache,
            self.tolerance_index,
            self.view,
        ))
    }

    /// Shows or hides an existing snapshot, or prepares a request for one.
    pub fn begin_metrics(&mut self) -> Result<MetricsStep, WorkbenchError> {
        let dataset = self.dataset.as_ref().ok_or(WorkbenchError::NoDataset)?;
        let series = self.cache.series().ok_or(WorkbenchError::NoComparison)?;
        let version = self.cache.version();

        if self.metrics.current(version).is_some() {
            self.metrics.visible = !self.metrics.visible;
            return Ok(MetricsStep::Toggled {
                visible: self.metrics.visible,
            });
        }

        let generation = self
            .metrics
            .gate
            .try_acquire()
            .map_err(|_| WorkbenchError::Busy(Operation::Metrics))?;

        let results = |slot: SlotId| {
            self.cache
                .slot(slot)
                .map(|s| s.results.clone())
                .unwrap_or_default()
        };
        let slots: Vec<(SlotId, String)> = self
            .cache
            .slots()
            .iter()
            .map(|s| (s.slot, s.algorithm.clone()))
            .collect();
        let request = MetricsRequest {
            geojson: Arc::clone(dataset.collection()),
            simplified_data1: results(SlotId::FIRST),
            simplified_data2: results(SlotId::SECOND),
            tolerances: series.values().to_vec(),
            algorithms: slots.iter().map(|(_, id)| id.clone()).collect(),
        };

        Ok(MetricsStep::Request(MetricsTicket {
            generation,
            cache_version: version,
            slots,
            levels: series.len(),
            request,
        }))
    }

    pub fn finish_metrics(
        &mut self,
        ticket: &MetricsTicket,
        result: Result<MetricsResponse, TransportError>,
    ) -> Result<MetricsOutcome, WorkbenchError> {
        let discarded = MetricsOutcome::Discarded {
            generation: ticket.generation,
        };
        if !self.metrics.gate.release(ticket.generation) {
            return Ok(discarded);
        }
        if self.cache.version() != ticket.cache_version {
            return Ok(discarded);
        }

        let response = result?;
        let snapshot = MetricsSnapshot::from_response(
            ticket.cache_version,
            &ticket.slots,
            ticket.levels,
            &response,
        )
        .map_err(|e| TransportError::new(Operation::Metrics, e.to_string()))?;

        self.metrics.snapshot = Some(snapshot);
        self.metrics.visible = true;
        Ok(MetricsOutcome::Applied {
            generation: ticket.generation,
        })
    }

    /// Resolves `selector` to the collection on screen and takes the export gate.
    pub fn begin_export(&mut self, selector: LayerSelector) -> Result<ExportTicket, WorkbenchError> {
        let layers = self.active_layers()?;
        let layer = layers
            .get(selector)
            .ok_or(WorkbenchError::NoSuchLayer(selector))?;
        let generation = self
            .export_gate
            .try_acquire()
            .map_err(|_| WorkbenchError::Busy(Operation::Export))?;
        Ok(ExportTicket {
            generation,
            selector,
            tolerance: layer.tolerance,
            collection: Arc::clone(&layer.collection),
        })
    }

    pub fn finish_export(
        &mut self,
        ticket: &ExportTicket,
        result: Result<Vec<u8>, TransportError>,
    ) -> Result<ExportOutcome, WorkbenchError> {
        if !self.export_gate.release(ticket.generation) {
            return Ok(ExportOutcome::Discarded {
                generation: ticket.generation,
            });
        }
        let bytes = result?;
        Ok(ExportOutcome::Ready(ExportArtifact::new(ticket.selector, bytes)))
    }

    /// Checks the structural invariants that must hold between any two operations.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.cache.check_invariants()?;

        match self.cache.series() {
            Some(series) if !self.cache.is_empty() => {
                if self.tolerance_index >= series.len() {
                    return Err(format!(
                        "tolerance index {} out of range for {} levels",
                        self.tolerance_index,
                        series.len()
                    ));
                }
            }
            _ => {
                if self.tolerance_index != 0 {
                    return Err(format!(
                        "tolerance index {} without a comparison",
                        self.tolerance_index
                    ));
                }
            }
        }

        if let Some(snapshot) = &self.metrics.snapshot
            && snapshot.cache_version() != self.cache.version()
        {
            return Err("metrics snapshot describes a replaced comparison".to_string());
        }

        if self.dataset.is_none()
            && (!self.cache.is_empty() || self.cache.pinned_dataset().is_some())
        {
            return Err("comparison present without a dataset".to_string());
        }
        Ok(())
    }
}
