//! HTTP client for the simplification service.
//!
//! Endpoints (relative to the configured API root):
//! - `POST upload` (multipart, field `file`)
//! - `GET load_country/{id}`
//! - `POST simplify`
//! - `POST metrics`
//! - `POST download_shapefile` (body: the FeatureCollection, response: zip)
//!
//! Failures carry the service's `{"hiba": "..."}` message when it sends one.

use formats::{FeatureCollection, UploadArchive};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use runtime::Operation;
use serde::de::DeserializeOwned;
use session::{ComparisonService, LocalBoxFuture, TransportError};
use streaming::{
    ErrorBody, MetricsRequest, MetricsResponse, SimplifyRequest, SimplifyResponse, UploadResponse,
    UPLOAD_FIELD,
};

use crate::config::ClientConfig;

pub struct HttpComparisonService {
    client: Client,
    base_url: String,
}

impl HttpComparisonService {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.api_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn send_failed(op: Operation, e: reqwest::Error) -> TransportError {
    let err = TransportError::new(op, e.to_string());
    match e.status() {
        Some(status) => err.with_status(status.as_u16()),
        None => err,
    }
}

fn error_from_body(op: Operation, status: StatusCode, body: &[u8]) -> TransportError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));
    TransportError::new(op, message).with_status(status.as_u16())
}

async fn read_bytes(op: Operation, resp: Response) -> Result<Vec<u8>, TransportError> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(|e| send_failed(op, e))?;
    if !status.is_success() {
        return Err(error_from_body(op, status, &body));
    }
    Ok(body.to_vec())
}

async fn read_json<T: DeserializeOwned>(op: Operation, resp: Response) -> Result<T, TransportError> {
    let status = resp.status();
    let body = read_bytes(op, resp).await?;
    serde_json::from_slice(&body).map_err(|e| {
        TransportError::new(op, format!("malformed response: {e}")).with_status(status.as_u16())
    })
}

impl ComparisonService for HttpComparisonService {
    fn upload<'a>(
        &'a self,
        archive: &'a UploadArchive,
    ) -> LocalBoxFuture<'a, Result<UploadResponse, TransportError>> {
        let op = Operation::LoadDataset;
        Box::pin(async move {
            let part = Part::bytes(archive.bytes().to_vec())
                .file_name(archive.file_name().to_string())
                .mime_str("application/zip")
                .map_err(|e| send_failed(op, e))?;
            let form = Form::new().part(UPLOAD_FIELD, part);
            let resp = self
                .client
                .post(self.url("upload"))
                .multipart(form)
                .send()
                .await
                .map_err(|e| send_failed(op, e))?;
            read_json(op, resp).await
        })
    }

    fn load_sample<'a>(
        &'a self,
        country_id: &'a str,
    ) -> LocalBoxFuture<'a, Result<FeatureCollection, TransportError>> {
        let op = Operation::LoadDataset;
        Box::pin(async move {
            let resp = self
                .client
                .get(self.url(&format!("load_country/{country_id}")))
                .send()
                .await
                .map_err(|e| send_failed(op, e))?;
            read_json(op, resp).await
        })
    }

    fn simplify<'a>(
        &'a self,
        request: &'a SimplifyRequest,
    ) -> LocalBoxFuture<'a, Result<SimplifyResponse, TransportError>> {
        let op = Operation::Simplify;
        Box::pin(async move {
            let resp = self
                .client
                .post(self.url("simplify"))
                .json(request)
                .send()
                .await
                .map_err(|e| send_failed(op, e))?;
            read_json(op, resp).await
        })
    }

    fn metrics<'a>(
        &'a self,
        request: &'a MetricsRequest,
    ) -> LocalBoxFuture<'a, Result<MetricsResponse, TransportError>> {
        let op = Operation::Metrics;
        Box::pin(async move {
            let resp = self
                .client
                .post(self.url("metrics"))
                .json(request)
                .send()
                .await
                .map_err(|e| send_failed(op, e))?;
            read_json(op, resp).await
        })
    }

    fn download_artifact<'a>(
        &'a self,
        collection: &'a FeatureCollection,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, TransportError>> {
        let op = Operation::Export;
        Box::pin(async move {
            let resp = self
                .client
                .post(self.url("download_shapefile"))
                .json(collection)
                .send()
                .await
                .map_err(|e| send_failed(op, e))?;
            read_bytes(op, resp).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::HttpComparisonService;
    use axum::extract::{Multipart, Path};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use layers::LayerSelector;
    use runtime::Operation;
    use serde_json::{json, Map, Value};
    use session::{
        ComparisonRequest, ComparisonService, DatasetOutcome, ExportOutcome, MetricsOutcome,
        SimplifyOutcome, Workbench,
    };

    fn collection_json(points: usize) -> Value {
        let coords: Vec<Value> = (0..points).map(|i| json!([i as f64, 0.0])).collect();
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "NAME": "coast" },
                "geometry": { "type": "LineString", "coordinates": coords }
            }]
        })
    }

    async fn upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        while let Ok(Some(field)) = multipart.next_field().await {
            let is_zip = field.file_name().is_some_and(|n| n.ends_with(".zip"));
            if field.name() == Some("file") && is_zip {
                return (
                    StatusCode::OK,
                    Json(json!({ "geojson": collection_json(10), "warning": true })),
                );
            }
        }
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "hiba": "A feltöltött fájl nem .zip fájl." })),
        )
    }

    async fn load_country(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        if id == "hungary" {
            (StatusCode::OK, Json(collection_json(10)))
        } else {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "hiba": "Fájl nem található" })),
            )
        }
    }

    /// Answers in the keyed-by-tolerance shape.
    async fn simplify(Json(body): Json<Value>) -> Json<Value> {
        let tolerances: Vec<f64> = body["tolerances"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();
        let mut data = Map::new();
        for id in body["algorithms"].as_array().into_iter().flatten() {
            let Some(id) = id.as_str() else { continue };
            let levels: Map<String, Value> = tolerances
                .iter()
                .enumerate()
                .map(|(i, t)| (format!("{t:?}"), collection_json(10 - i)))
                .collect();
            data.insert(id.to_string(), Value::Object(levels));
        }
        Json(json!({
            "simplifiedData": data,
            "elapsedTime": 0.4242,
            "currentMemoryUsage": 1_048_576,
            "peakMemoryUsage": 4_194_304
        }))
    }

    async fn metrics(Json(body): Json<Value>) -> Json<Value> {
        let mut counts = Map::new();
        let mut errors = Map::new();
        let algorithms = body["algorithms"].as_array().cloned().unwrap_or_default();
        for (slot, id) in algorithms.iter().enumerate() {
            let key = if slot == 0 {
                "simplifiedData1"
            } else {
                "simplifiedData2"
            };
            let levels = body[key].as_array().map(Vec::len).unwrap_or(0);
            let per_level: Map<String, Value> = (0..levels)
                .map(|i| (i.to_string(), json!(10 - i)))
                .collect();
            let err: Map<String, Value> = (0..levels)
                .map(|i| (i.to_string(), json!(i as f64 * 0.01)))
                .collect();
            let id = id.as_str().unwrap_or_default().to_string();
            counts.insert(id.clone(), Value::Object(per_level));
            errors.insert(id, Value::Object(err));
        }
        Json(json!({
            "pointCounts": { "original": 10, "simplified": counts },
            "positionalErrors": errors,
            "perimeter": 9.0
        }))
    }

    async fn download(Json(body): Json<Value>) -> Result<Vec<u8>, (StatusCode, Json<Value>)> {
        if body["features"].is_array() {
            Ok(b"PK\x03\x04shapefile".to_vec())
        } else {
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "hiba": "missing features" })),
            ))
        }
    }

    async fn spawn_service() -> HttpComparisonService {
        let app = Router::new()
            .route("/api/upload", post(upload))
            .route("/api/load_country/:id", get(load_country))
            .route("/api/simplify", post(simplify))
            .route("/api/metrics", post(metrics))
            .route("/api/download_shapefile", post(download));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        HttpComparisonService::with_client(reqwest::Client::new(), &format!("http://{addr}/api/"))
    }

    #[tokio::test]
    async fn full_comparison_over_http() {
        let wb = Workbench::new(spawn_service().await);
        wb.load_sample("hungary").await.expect("sample");

        let request = ComparisonRequest::new(0.5, 0.1, ["Lang", "Visvaligam-Whyatt"]);
        let outcome = wb.simplify(&request).await.expect("simplify");
        assert!(matches!(
            outcome,
            SimplifyOutcome::Applied {
                levels: 6,
                slots: 2,
                ..
            }
        ));
        let elapsed = wb.session().cache().stats().map(|s| s.elapsed_rounded());
        assert_eq!(elapsed, Some(0.42));

        wb.set_tolerance_index(5).expect("index");
        let layers = wb.active_layers().expect("layers");
        let slot2 = layers.get(LayerSelector::SLOT2).expect("slot2");
        assert_eq!(slot2.collection.vertex_count(), 5);

        assert!(matches!(
            wb.show_metrics().await,
            Ok(MetricsOutcome::Applied { .. })
        ));
        let reduction = wb
            .session()
            .metrics_snapshot()
            .and_then(|m| m.reduction_at(5))
            .expect("reduction");
        assert_eq!(reduction.slots[0].percent_decrease, Some(50.0));

        let ExportOutcome::Ready(artifact) = wb.export(LayerSelector::SLOT2).await.expect("export")
        else {
            panic!("expected an artifact");
        };
        assert!(artifact.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn upload_sends_the_archive_as_multipart() {
        let wb = Workbench::new(spawn_service().await);
        let outcome = wb
            .upload("coast.zip", b"PK\x03\x04".to_vec())
            .await
            .expect("upload");
        assert!(matches!(
            outcome,
            DatasetOutcome::Loaded {
                vertex_count: 10,
                attributes_missing: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn service_error_body_becomes_the_message() {
        let service = spawn_service().await;
        let err = service
            .load_sample("atlantis")
            .await
            .expect_err("not found");
        assert_eq!(err.operation, Operation::LoadDataset);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.message, "Fájl nem található");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let service =
            HttpComparisonService::with_client(reqwest::Client::new(), &format!("http://{addr}/api"));
        let err = service.load_sample("hungary").await.expect_err("refused");
        assert_eq!(err.status, None);
    }
}
