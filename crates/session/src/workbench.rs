use std::cell::{Ref, RefCell};
use std::time::Instant;

use catalog::{AlgorithmRegistry, SampleCatalog};
use formats::{DatasetSource, UploadArchive};
use foundation::Generation;
use layers::{ActiveLayerSet, LayerSelector};
use runtime::{
    Event, EventBus, Operation, Outcome, RequestMetrics, RequestMetricsSnapshot, Severity,
};
use streaming::DEFAULT_MAX_LEVELS;
use tracing::{debug, info, warn};

use crate::error::{ValidationError, WorkbenchError};
use crate::export::ExportOutcome;
use crate::metrics::{MetricsOutcome, MetricsStep};
use crate::service::ComparisonService;
use crate::state::{Activity, ComparisonRequest, DatasetOutcome, Phase, Session, SimplifyOutcome};

/// Drives a [`Session`] against a [`ComparisonService`].
///
/// All methods take `&self` so several operations can be awaited
/// concurrently on one event loop. The session is only borrowed between
/// awaits, never across one.
pub struct Workbench<S> {
    service: S,
    registry: AlgorithmRegistry,
    samples: SampleCatalog,
    max_levels: usize,
    session: RefCell<Session>,
    events: RefCell<EventBus>,
    requests: RefCell<RequestMetrics>,
}

impl<S: ComparisonService> Workbench<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            registry: AlgorithmRegistry::builtin(),
            samples: SampleCatalog::builtin(),
            max_levels: DEFAULT_MAX_LEVELS,
            session: RefCell::new(Session::new()),
            events: RefCell::new(EventBus::new()),
            requests: RefCell::new(RequestMetrics::new()),
        }
    }

    pub fn with_registry(mut self, registry: AlgorithmRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_samples(mut self, samples: SampleCatalog) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    pub fn samples(&self) -> &SampleCatalog {
        &self.samples
    }

    pub fn session(&self) -> Ref<'_, Session> {
        self.session.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.session.borrow().phase()
    }

    pub fn activity(&self) -> Activity {
        self.session.borrow().activity()
    }

    pub fn active_layers(&self) -> Result<ActiveLayerSet, WorkbenchError> {
        self.session.borrow().active_layers()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().events().to_vec()
    }

    /// Takes the pending user-visible notifications, dropping internal events.
    pub fn drain_notifications(&self) -> Vec<Event> {
        self.events
            .borrow_mut()
            .drain()
            .into_iter()
            .filter(|e| e.severity.is_user_visible())
            .collect()
    }

    pub fn request_count(&self, op: Operation, outcome: Outcome) -> u64 {
        self.requests.borrow().count(op, outcome)
    }

    pub fn request_metrics(&self) -> RequestMetricsSnapshot {
        self.requests.borrow().snapshot()
    }

    /// Uploads a shapefile archive. Non-zip files are rejected locally.
    pub async fn upload(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<DatasetOutcome, WorkbenchError> {
        let archive = UploadArchive::new(file_name, bytes)
            .map_err(|e| self.rejected(ValidationError::from(e).into()))?;
        let ticket = self
            .session
            .borrow_mut()
            .begin_dataset_load(DatasetSource::Upload {
                file_name: archive.file_name().to_string(),
            })
            .map_err(|e| self.rejected(e))?;
        self.issued(Operation::LoadDataset);
        info!("uploading {} ({} bytes)", archive.file_name(), archive.bytes().len());

        let started = Instant::now();
        let result = self
            .service
            .upload(&archive)
            .await
            .map(|r| (r.geojson, r.warning));
        self.latency(Operation::LoadDataset, started);

        let outcome = self.session.borrow_mut().finish_dataset_load(&ticket, result);
        self.dataset_settled(outcome)
    }

    /// Loads one of the catalog's sample datasets.
    pub async fn load_sample(&self, country_id: &str) -> Result<DatasetOutcome, WorkbenchError> {
        let country = self
            .samples
            .get(country_id)
            .map_err(|e| self.rejected(ValidationError::from(e).into()))?;
        let ticket = self
            .session
            .borrow_mut()
            .begin_dataset_load(DatasetSource::Sample {
                country_id: country.id.clone(),
            })
            .map_err(|e| self.rejected(e))?;
        self.issued(Operation::LoadDataset);
        info!("loading sample dataset {} ({})", country.id, country.name);

        let started = Instant::now();
        let result = self
            .service
            .load_sample(&country.id)
            .await
            .map(|fc| (fc, false));
        self.latency(Operation::LoadDataset, started);

        let outcome = self.session.borrow_mut().finish_dataset_load(&ticket, result);
        self.dataset_settled(outcome)
    }

    fn dataset_settled(
        &self,
        outcome: Result<DatasetOutcome, WorkbenchError>,
    ) -> Result<DatasetOutcome, WorkbenchError> {
        match &outcome {
            Ok(DatasetOutcome::Loaded {
                generation,
                vertex_count,
                attributes_missing,
            }) => {
                self.applied(Operation::LoadDataset);
                info!("dataset {generation} loaded: {vertex_count} vertices");
                self.emit(
                    Severity::Info,
                    "dataset_loaded",
                    format!("Dataset loaded ({vertex_count} vertices)"),
                );
                if *attributes_missing {
                    warn!("uploaded archive has no attribute table");
                    self.emit(
                        Severity::Warning,
                        "attributes_missing",
                        "The archive has no attribute table; attributes are unavailable",
                    );
                }
            }
            Ok(DatasetOutcome::Discarded { generation }) => {
                self.discarded(Operation::LoadDataset, *generation);
            }
            Err(e) => self.failed(Operation::LoadDataset, e),
        }
        outcome
    }

    /// Requests every level for every selected algorithm in one call.
    pub async fn simplify(
        &self,
        request: &ComparisonRequest,
    ) -> Result<SimplifyOutcome, WorkbenchError> {
        let (series, selection) = request
            .validate(&self.registry, self.max_levels)
            .map_err(|e| self.rejected(e.into()))?;
        let ticket = self
            .session
            .borrow_mut()
            .begin_simplify(series, selection)
            .map_err(|e| self.rejected(e))?;
        self.issued(Operation::Simplify);
        info!(
            "simplification {} issued: algorithms={:?} levels={}",
            ticket.generation,
            ticket.request.algorithms,
            ticket.series.len()
        );

        let started = Instant::now();
        let result = self.service.simplify(&ticket.request).await;
        self.latency(Operation::Simplify, started);

        let outcome = self.session.borrow_mut().finish_simplify(&ticket, result);
        match &outcome {
            Ok(SimplifyOutcome::Applied {
                generation,
                levels,
                slots,
            }) => {
                self.applied(Operation::Simplify);
                let elapsed = self
                    .session
                    .borrow()
                    .cache()
                    .stats()
                    .map(|s| s.elapsed_rounded())
                    .unwrap_or_default();
                info!("simplification {generation} applied: {slots} slots x {levels} levels in {elapsed}s");
                self.emit(
                    Severity::Info,
                    "comparison_ready",
                    format!("Simplified {slots} algorithm(s) at {levels} tolerance levels in {elapsed} s"),
                );
            }
            Ok(SimplifyOutcome::Discarded { generation }) => {
                self.discarded(Operation::Simplify, *generation);
            }
            Err(e) => self.failed(Operation::Simplify, e),
        }
        outcome
    }

    pub fn disable_simplification(&self) {
        if let Some(generation) = self.session.borrow_mut().disable_simplification() {
            debug!("simplification {generation} abandoned");
        }
        info!("simplification disabled");
    }

    pub fn reset(&self) {
        let abandoned = self.session.borrow_mut().reset();
        for op in &abandoned {
            debug!("pending {op} request abandoned by reset");
        }
        info!("session reset");
        self.emit(Severity::Info, "reset", "Workspace cleared");
    }

    pub fn set_tolerance_index(&self, index: usize) -> Result<(), WorkbenchError> {
        self.session
            .borrow_mut()
            .set_tolerance_index(index)
            .map_err(|e| self.rejected(e))
    }

    pub fn select_tolerance_value(&self, value: f64) -> Result<usize, WorkbenchError> {
        self.session
            .borrow_mut()
            .select_tolerance_value(value)
            .map_err(|e| self.rejected(e))
    }

    pub fn toggle_basemap(&self) -> Result<bool, WorkbenchError> {
        self.session
            .borrow_mut()
            .toggle_basemap()
            .map_err(|e| self.rejected(e))
    }

    pub fn toggle_attribute_panel(&self) -> Result<bool, WorkbenchError> {
        self.session
            .borrow_mut()
            .toggle_attribute_panel()
            .map_err(|e| self.rejected(e))
    }

    /// Shows, hides, or computes the metrics for the installed comparison.
    pub async fn show_metrics(&self) -> Result<MetricsOutcome, WorkbenchError> {
        let step = self
            .session
            .borrow_mut()
            .begin_metrics()
            .map_err(|e| self.rejected(e))?;
        let ticket = match step {
            MetricsStep::Toggled { visible } => {
                debug!("metrics panel visible={visible}");
                return Ok(MetricsOutcome::Toggled { visible });
            }
            MetricsStep::Request(ticket) => ticket,
        };
        self.issued(Operation::Metrics);
        info!("metrics {} issued", ticket.generation);

        let started = Instant::now();
        let result = self.service.metrics(&ticket.request).await;
        self.latency(Operation::Metrics, started);

        let outcome = self.session.borrow_mut().finish_metrics(&ticket, result);
        match &outcome {
            Ok(MetricsOutcome::Applied { generation }) => {
                self.applied(Operation::Metrics);
                info!("metrics {generation} applied");
                self.emit(Severity::Info, "metrics_ready", "Metrics computed");
            }
            Ok(MetricsOutcome::Discarded { generation }) => {
                self.discarded(Operation::Metrics, *generation);
            }
            Ok(MetricsOutcome::Toggled { .. }) => {}
            Err(e) => self.failed(Operation::Metrics, e),
        }
        outcome
    }

    /// Encodes the layer currently shown for `selector`.
    pub async fn export(&self, selector: LayerSelector) -> Result<ExportOutcome, WorkbenchError> {
        let ticket = self
            .session
            .borrow_mut()
            .begin_export(selector)
            .map_err(|e| self.rejected(e))?;
        self.issued(Operation::Export);
        info!("export {} of {selector} issued", ticket.generation);

        let started = Instant::now();
        let result = self.service.download_artifact(&ticket.collection).await;
        self.latency(Operation::Export, started);

        let outcome = self.session.borrow_mut().finish_export(&ticket, result);
        match &outcome {
            Ok(ExportOutcome::Ready(artifact)) => {
                self.applied(Operation::Export);
                info!("export of {selector} ready: {} bytes", artifact.bytes.len());
                self.emit(
                    Severity::Info,
                    "export_ready",
                    format!("{} is ready", artifact.file_name),
                );
            }
            Ok(ExportOutcome::Discarded { generation }) => {
                self.discarded(Operation::Export, *generation);
            }
            Err(e) => self.failed(Operation::Export, e),
        }
        outcome
    }

    fn emit(&self, severity: Severity, kind: &'static str, message: impl Into<String>) {
        self.events.borrow_mut().emit(severity, kind, message);
    }

    fn rejected(&self, e: WorkbenchError) -> WorkbenchError {
        warn!("rejected: {e}");
        self.emit(Severity::Warning, e.kind(), e.to_string());
        e
    }

    fn issued(&self, op: Operation) {
        self.requests.borrow_mut().record(op, Outcome::Issued);
    }

    fn applied(&self, op: Operation) {
        self.requests.borrow_mut().record(op, Outcome::Applied);
    }

    fn discarded(&self, op: Operation, generation: Generation) {
        self.requests.borrow_mut().record(op, Outcome::Discarded);
        debug!("stale {op} response {generation} discarded");
        self.emit(
            Severity::Debug,
            "stale_response_discarded",
            format!("{op} response {generation} discarded"),
        );
    }

    fn failed(&self, op: Operation, e: &WorkbenchError) {
        self.requests.borrow_mut().record(op, Outcome::Failed);
        warn!("{op} failed: {e}");
        self.emit(Severity::Error, "request_failed", e.to_string());
    }

    fn latency(&self, op: Operation, started: Instant) {
        let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.requests.borrow_mut().record_latency(op, elapsed_ms);
    }
}
