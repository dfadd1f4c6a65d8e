use std::future::Future;
use std::pin::Pin;

use formats::{FeatureCollection, UploadArchive};
use streaming::{MetricsRequest, MetricsResponse, SimplifyRequest, SimplifyResponse, UploadResponse};

use crate::error::TransportError;

/// Boxed future that may borrow its arguments; not required to be `Send`
/// because the workbench runs on a single-threaded event loop.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The external collaborators the workbench talks to: dataset loader,
/// simplification service, metrics service and export encoder.
pub trait ComparisonService {
    fn upload<'a>(
        &'a self,
        archive: &'a UploadArchive,
    ) -> LocalBoxFuture<'a, Result<UploadResponse, TransportError>>;

    fn load_sample<'a>(
        &'a self,
        country_id: &'a str,
    ) -> LocalBoxFuture<'a, Result<FeatureCollection, TransportError>>;

    fn simplify<'a>(
        &'a self,
        request: &'a SimplifyRequest,
    ) -> LocalBoxFuture<'a, Result<SimplifyResponse, TransportError>>;

    fn metrics<'a>(
        &'a self,
        request: &'a MetricsRequest,
    ) -> LocalBoxFuture<'a, Result<MetricsResponse, TransportError>>;

    /// Encodes a collection as a downloadable archive.
    fn download_artifact<'a>(
        &'a self,
        collection: &'a FeatureCollection,
    ) -> LocalBoxFuture<'a, Result<Vec<u8>, TransportError>>;
}
