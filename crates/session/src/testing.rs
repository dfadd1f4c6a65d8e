//! Fixtures shared by the session and workbench tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use catalog::{AlgorithmInfo, AlgorithmRegistry};
use formats::{Feature, FeatureCollection, GeoPoint, Geometry, UploadArchive};
use runtime::Operation;
use serde_json::{Map, Value};
use streaming::{
    LevelResults, MetricsRequest, MetricsResponse, PointCounts, SimplifyRequest, SimplifyResponse,
    UploadResponse,
};
use tokio::sync::oneshot;

use crate::error::TransportError;
use crate::service::{ComparisonService, LocalBoxFuture};

/// Short identifiers so tests read like the comparison UI.
pub(crate) fn registry() -> AlgorithmRegistry {
    AlgorithmRegistry::new(vec![
        AlgorithmInfo::new("RDP", "Ramer-Douglas-Peucker"),
        AlgorithmInfo::new("VW", "Visvalingam-Whyatt"),
        AlgorithmInfo::new("DP", "Douglas-Peucker"),
        AlgorithmInfo::new("OPH", "Opheim").unavailable(),
    ])
}

pub(crate) fn coastline() -> FeatureCollection {
    let coords: Vec<GeoPoint> = (0..8)
        .map(|i| GeoPoint::new(i as f64, if i % 2 == 0 { 0.0 } else { 0.5 }))
        .collect();
    FeatureCollection::new(vec![Feature {
        id: None,
        properties: Map::new(),
        geometry: Some(Geometry::LineString(coords)),
    }])
}

/// A result tagged with the algorithm and level that produced it.
pub(crate) fn tagged(algorithm: &str, tolerance: f64) -> FeatureCollection {
    let mut properties = Map::new();
    properties.insert("algorithm".into(), Value::String(algorithm.into()));
    properties.insert("tolerance".into(), Value::from(tolerance));
    FeatureCollection::new(vec![Feature {
        id: None,
        properties,
        geometry: Some(Geometry::LineString(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(7.0, 0.5),
        ])),
    }])
}

pub(crate) fn tag_of(fc: &FeatureCollection) -> Option<&str> {
    fc.features.first()?.properties.get("algorithm")?.as_str()
}

pub(crate) fn simplify_response_for(request: &SimplifyRequest) -> SimplifyResponse {
    let ids: Vec<&str> = request.algorithms.iter().map(String::as_str).collect();
    simplify_response(&ids, &request.tolerances)
}

pub(crate) fn simplify_response(algorithms: &[&str], tolerances: &[f64]) -> SimplifyResponse {
    let mut simplified_data = BTreeMap::new();
    for id in algorithms {
        let levels = tolerances.iter().map(|t| tagged(id, *t)).collect();
        simplified_data.insert(id.to_string(), LevelResults::Indexed(levels));
    }
    SimplifyResponse {
        simplified_data,
        elapsed_time: 0.123,
        current_memory_usage: 2048,
        peak_memory_usage: 8192,
    }
}

pub(crate) fn metrics_response_for(request: &MetricsRequest) -> MetricsResponse {
    let original = request.geojson.vertex_count();
    let mut simplified = BTreeMap::new();
    let mut positional_errors = BTreeMap::new();
    for (slot, id) in request.algorithms.iter().enumerate() {
        let results = if slot == 0 {
            &request.simplified_data1
        } else {
            &request.simplified_data2
        };
        let counts: BTreeMap<String, u64> = results
            .iter()
            .enumerate()
            .map(|(i, fc)| (i.to_string(), fc.vertex_count()))
            .collect();
        let errors: BTreeMap<String, f64> = (0..results.len())
            .map(|i| (i.to_string(), i as f64 * 0.001))
            .collect();
        simplified.insert(id.clone(), counts);
        positional_errors.insert(id.clone(), errors);
    }
    MetricsResponse {
        point_counts: PointCounts {
            original,
            simplified,
        },
        positional_errors,
        perimeter: 7.5,
    }
}

type Scripted<T> = RefCell<VecDeque<oneshot::Receiver<Result<T, TransportError>>>>;

/// In-memory service. Answers immediately unless a reply has been scripted,
/// in which case the call waits for the scripted channel.
#[derive(Default)]
pub(crate) struct FakeService {
    calls: RefCell<Vec<Operation>>,
    pub(crate) upload_warning: bool,
    samples: Scripted<FeatureCollection>,
    simplify: Scripted<SimplifyResponse>,
    metrics: Scripted<MetricsResponse>,
}

pub(crate) type Reply<T> = oneshot::Sender<Result<T, TransportError>>;

impl FakeService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self, op: Operation) -> usize {
        self.calls.borrow().iter().filter(|c| **c == op).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub(crate) fn script_sample(&self) -> Reply<FeatureCollection> {
        let (tx, rx) = oneshot::channel();
        self.samples.borrow_mut().push_back(rx);
        tx
    }

    pub(crate) fn script_simplify(&self) -> Reply<SimplifyResponse> {
        let (tx, rx) = oneshot::channel();
        self.simplify.borrow_mut().push_back(rx);
        tx
    }

    pub(crate) fn script_metrics(&self) -> Reply<MetricsResponse> {
        let (tx, rx) = oneshot::channel();
        self.metrics.borrow_mut().push_back(rx);
        tx
    }

    pub(crate) fn fail_next_simplify(&self, message: &str) {
        let tx = self.script_simplify();
        let _ = tx.send(Err(TransportError::new(Operation::Simplify, message).with_status(400)));
    }

    fn record(&self, op: Operation) {
        self.calls.borrow_mut().push(op);
    }
}

async fn wait<T>(
    op: Operation,
    rx: oneshot::Receiver<Result<T, TransportError>>,
) -> Result<T, TransportError> {
    rx.await
        .unwrap_or_else(|_| Err(TransportError::new(op, "scripted reply dropped")))
}

impl ComparisonService for FakeService {
    fn upload<'a>(
        &'a self,
        _archive: &'a UploadArchive,
    ) -> LocalBoxFuture<'a, Result<UploadResponse, TransportError>> {
        self.record(Operation::LoadDataset);
        let warning = self.upload_warning;
        Box::pin(async move {
            Ok(UploadResponse {
                geojson: coastline(),
                warning,
            })
        })
    }

    fn load_sample<'a>(
        &'a self,
        _country_id: &'a str,
    ) -> LocalBoxFuture<'a, Result<FeatureCollection, TransportError>> {
        self.record(Operation::LoadDataset);
        let scripted = self.samples.borrow_mut().pop_front();
        Box::pin(async move {
            match scripted {
                Some(rx) => wait(Operation::LoadDataset, rx).await,
                None => Ok(coastline()),
            }
        })
    }

    fn simplify<'a>(
        &'a self,
        request: &'a SimplifyRequest,
    ) -> LocalBoxFuture<'a, Result<SimplifyResponse, TransportError>> {
        self.record(Operation::Simplify);
        let scripted = self.simplify.borrow_mut().pop_front();
        Box::pin(async move {
            match scripted {
                Some(rx) => wait(Operation::Simplify, rx).await,
                None => Ok(simplify_response_for(request)),
            }
        })
    }

    fn metrics<'a>(
        &'a self,
        request: &'a MetricsRequest,
    ) -> LocalBoxFuture<'a, Result<MetricsResponse, TransportError>> {
        self.record(Operation::Metrics);
        let scripted = self.metrics.borrow_mut().pop_front();
        Box::pin(async move {
            match scripted {
                Some(rx) => wait(Operation::Metrics, rx).await,
                None => Ok(metrics_response_for(request)),
            }
        })
    }

    fn download_artifact<'a>(
        &'a self,
        collection: &'a FeatureCollection,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, TransportError>> {
        self.record(Operation::Export);
        Box::pin(async move {
            let mut bytes = b"PK\x03\x04".to_vec();
            bytes.extend_from_slice(&(collection.len() as u32).to_le_bytes());
            Ok(bytes)
        })
    }
}
