use std::sync::Arc;

use foundation::Aabb2;

use crate::feature_collection::FeatureCollection;

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Upload { file_name: String },
    Sample { country_id: String },
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSource::Upload { file_name } => write!(f, "upload '{file_name}'"),
            DatasetSource::Sample { country_id } => write!(f, "sample '{country_id}'"),
        }
    }
}

/// The original geometry every comparison is made against.
///
/// Immutable once built; a re-upload replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Dataset {
    collection: Arc<FeatureCollection>,
    bounds: Option<Aabb2>,
    vertex_count: u64,
    fingerprint: String,
    source: DatasetSource,
    attributes_missing: bool,
}

impl Dataset {
    pub fn new(collection: FeatureCollection, source: DatasetSource) -> Self {
        let bounds = collection.bounds();
        let vertex_count = collection.vertex_count();
        let fingerprint = fingerprint_collection(&collection);
        Self {
            collection: Arc::new(collection),
            bounds,
            vertex_count,
            fingerprint,
            source,
            attributes_missing: false,
        }
    }

    /// Marks that the archive carried no attribute table (`.dbf`).
    pub fn with_attributes_missing(mut self, missing: bool) -> Self {
        self.attributes_missing = missing;
        self
    }

    pub fn collection(&self) -> &Arc<FeatureCollection> {
        &self.collection
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        self.bounds
    }

    pub fn vertex_count(&self) -> u64 {
        self.vertex_count
    }

    /// Content hash of the canonical GeoJSON encoding.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn attributes_missing(&self) -> bool {
        self.attributes_missing
    }
}

pub fn fingerprint_collection(collection: &FeatureCollection) -> String {
    // serde_json maps are sorted, so the encoding is canonical for equal collections.
    let bytes = serde_json::to_vec(&collection.to_geojson_value()).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::{Dataset, DatasetSource};
    use crate::feature_collection::FeatureCollection;

    fn line(coords: &str) -> FeatureCollection {
        FeatureCollection::from_geojson_str(&format!(
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{}},
            "geometry":{{"type":"LineString","coordinates":{coords}}}}}]}}"#
        ))
        .expect("parse")
    }

    #[test]
    fn derives_bounds_and_vertex_count() {
        let ds = Dataset::new(
            line("[[0,0],[2,3],[5,1]]"),
            DatasetSource::Upload {
                file_name: "roads.zip".into(),
            },
        );
        assert_eq!(ds.vertex_count(), 3);
        let b = ds.bounds().expect("bounds");
        assert_eq!(b.min, [0.0, 0.0]);
        assert_eq!(b.max, [5.0, 3.0]);
        assert!(!ds.attributes_missing());
    }

    #[test]
    fn fingerprint_is_content_addressed() {
        let src = DatasetSource::Sample {
            country_id: "hungary".into(),
        };
        let a = Dataset::new(line("[[0,0],[1,1]]"), src.clone());
        let b = Dataset::new(line("[[0,0],[1,1]]"), src.clone());
        let c = Dataset::new(line("[[0,0],[1,2]]"), src);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
