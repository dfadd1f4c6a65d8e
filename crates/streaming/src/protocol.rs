//! Wire types for the simplification service.
//!
//! Request bodies use the service's camelCase field names. Responses are
//! parsed leniently where the service has more than one shape in the wild:
//! per-algorithm results arrive either as an array ordered like the request's
//! tolerances, or as an object keyed by the tolerance value.

use std::collections::BTreeMap;
use std::sync::Arc;

use formats::FeatureCollection;
use serde::{Deserialize, Serialize};

/// File name offered for a downloaded shapefile archive.
pub const EXPORT_FILE_NAME: &str = "shapeshifter-export.zip";

/// Multipart field carrying an uploaded archive.
pub const UPLOAD_FIELD: &str = "file";

/// Tolerance keys sent by the service are compared with this slack.
const KEY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    MissingAlgorithm(String),
    LevelCountMismatch {
        algorithm: String,
        expected: usize,
        got: usize,
    },
    MissingLevel {
        algorithm: String,
        tolerance: f64,
    },
    InvalidLevelKey(String),
    MissingMetricsLevel {
        series: &'static str,
        index: usize,
    },
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MissingAlgorithm(id) => {
                write!(f, "response has no results for algorithm '{id}'")
            }
            ProtocolError::LevelCountMismatch {
                algorithm,
                expected,
                got,
            } => write!(
                f,
                "algorithm '{algorithm}' returned {got} levels, expected {expected}"
            ),
            ProtocolError::MissingLevel {
                algorithm,
                tolerance,
            } => write!(
                f,
                "algorithm '{algorithm}' has no result for tolerance {tolerance}"
            ),
            ProtocolError::InvalidLevelKey(key) => write!(f, "invalid level key '{key}'"),
            ProtocolError::MissingMetricsLevel { series, index } => {
                write!(f, "metrics '{series}' missing level {index}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Body of a successful upload or sample load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub geojson: FeatureCollection,
    /// Set when the archive lacked an attribute table.
    #[serde(default)]
    pub warning: bool,
}

/// Error body returned by the service alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "hiba", alias = "error")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifyRequest {
    pub geojson: Arc<FeatureCollection>,
    pub tolerances: Vec<f64>,
    pub algorithms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifyResponse {
    pub simplified_data: BTreeMap<String, LevelResults>,
    #[serde(default)]
    pub elapsed_time: f64,
    #[serde(default)]
    pub current_memory_usage: u64,
    #[serde(default)]
    pub peak_memory_usage: u64,
}

/// One algorithm's results across all tolerance levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelResults {
    Indexed(Vec<FeatureCollection>),
    Keyed(BTreeMap<String, FeatureCollection>),
}

impl LevelResults {
    /// Orders the results like `tolerances`; every level must be present.
    pub fn resolve(
        self,
        algorithm: &str,
        tolerances: &[f64],
    ) -> Result<Vec<FeatureCollection>, ProtocolError> {
        match self {
            LevelResults::Indexed(levels) => {
                if levels.len() != tolerances.len() {
                    return Err(ProtocolError::LevelCountMismatch {
                        algorithm: algorithm.to_string(),
                        expected: tolerances.len(),
                        got: levels.len(),
                    });
                }
                Ok(levels)
            }
            LevelResults::Keyed(map) => {
                let mut parsed: Vec<(f64, FeatureCollection)> = Vec::with_capacity(map.len());
                for (key, fc) in map {
                    let value: f64 = key
                        .trim()
                        .parse()
                        .map_err(|_| ProtocolError::InvalidLevelKey(key.clone()))?;
                    parsed.push((value, fc));
                }

                let mut out = Vec::with_capacity(tolerances.len());
                for &tolerance in tolerances {
                    let Some(pos) = parsed
                        .iter()
                        .position(|(v, _)| (v - tolerance).abs() < KEY_EPSILON)
                    else {
                        return Err(ProtocolError::MissingLevel {
                            algorithm: algorithm.to_string(),
                            tolerance,
                        });
                    };
                    out.push(parsed.swap_remove(pos).1);
                }
                Ok(out)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    pub geojson: Arc<FeatureCollection>,
    pub simplified_data1: Vec<Arc<FeatureCollection>>,
    /// Empty when only one algorithm is compared.
    pub simplified_data2: Vec<Arc<FeatureCollection>>,
    pub tolerances: Vec<f64>,
    pub algorithms: Vec<String>,
}

/// Per-level values keyed by tolerance index (`"0"`, `"1"`, ...).
pub type LevelMap<T> = BTreeMap<String, T>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCounts {
    pub original: u64,
    /// algorithm id -> level index -> vertex count
    #[serde(default)]
    pub simplified: BTreeMap<String, LevelMap<u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub point_counts: PointCounts,
    /// algorithm id -> level index -> mean positional error
    #[serde(default)]
    pub positional_errors: BTreeMap<String, LevelMap<f64>>,
    #[serde(default)]
    pub perimeter: f64,
}

/// Flattens a level map into a vector of `levels` entries, ordered by index.
pub fn level_values<T: Copy>(
    map: &LevelMap<T>,
    levels: usize,
    series: &'static str,
) -> Result<Vec<T>, ProtocolError> {
    let mut by_index: BTreeMap<usize, T> = BTreeMap::new();
    for (key, value) in map {
        let index: usize = key
            .trim()
            .parse()
            .map_err(|_| ProtocolError::InvalidLevelKey(key.clone()))?;
        by_index.insert(index, *value);
    }

    (0..levels)
        .map(|index| {
            by_index
                .get(&index)
                .copied()
                .ok_or(ProtocolError::MissingMetricsLevel { series, index })
        })
        .collect()
}
