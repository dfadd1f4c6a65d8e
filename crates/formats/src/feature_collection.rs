use foundation::{Aabb2, BoundsBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One GeoJSON position. Elevation and measure ordinates are carried through
/// untouched so re-emitted geometry matches what was loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            z: None,
            m: None,
        }
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    fn as_array(self) -> [f64; 2] {
        [self.lon_deg, self.lat_deg]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Number of stored coordinates, closing ring positions included.
    pub fn vertex_count(&self) -> u64 {
        match self {
            Geometry::Point(_) => 1,
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.len() as u64,
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().map(|l| l.len() as u64).sum()
            }
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(|rings| rings.iter())
                .map(|r| r.len() as u64)
                .sum(),
            Geometry::GeometryCollection(parts) => parts.iter().map(Geometry::vertex_count).sum(),
        }
    }

    fn visit_points(&self, f: &mut impl FnMut(GeoPoint)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().for_each(|p| f(*p)),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().for_each(|p| f(*p))
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(|p| f(*p)),
            Geometry::GeometryCollection(parts) => {
                for part in parts {
                    part.visit_points(f);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// String or number, kept as given.
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    /// GeoJSON allows `"geometry": null`; shapefile exports produce it for empty shapes.
    pub geometry: Option<Geometry>,
}

/// A GeoJSON FeatureCollection: the unit exchanged with every external service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureCollectionError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for FeatureCollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureCollectionError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            FeatureCollectionError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FeatureCollectionError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for FeatureCollectionError {}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of coordinates across all features.
    pub fn vertex_count(&self) -> u64 {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(Geometry::vertex_count)
            .sum()
    }

    /// Lon/lat extent of every coordinate, `None` for an empty collection.
    pub fn bounds(&self) -> Option<Aabb2> {
        let mut builder = BoundsBuilder::new();
        for geom in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            geom.visit_points(&mut |p| builder.add(p.as_array()));
        }
        builder.finish()
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, FeatureCollectionError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| FeatureCollectionError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, FeatureCollectionError> {
        let obj = value
            .as_object()
            .ok_or(FeatureCollectionError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(FeatureCollectionError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(FeatureCollectionError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(FeatureCollectionError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let invalid = |reason: String| FeatureCollectionError::InvalidFeature { index, reason };

            let feat_obj = feat_val
                .as_object()
                .ok_or_else(|| invalid("feature must be an object".to_string()))?;

            let feat_type = feat_obj
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid("feature missing type".to_string()))?;
            if feat_type != "Feature" {
                return Err(invalid(format!("unexpected feature type: {feat_type}")));
            }

            let id = match feat_obj.get("id") {
                Some(v @ (Value::String(_) | Value::Number(_))) => Some(v.clone()),
                _ => None,
            };

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let geometry = match feat_obj.get("geometry") {
                None => return Err(invalid("feature missing geometry".to_string())),
                Some(Value::Null) => None,
                Some(g) => Some(parse_geometry(g).map_err(invalid)?),
            };

            features.push(Feature {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }

    /// Emits a GeoJSON FeatureCollection.
    /// (Property ordering may differ from the original input.)
    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );

        let mut features: Vec<Value> = Vec::with_capacity(self.features.len());
        for feat in &self.features {
            let mut fobj = Map::new();
            fobj.insert("type".to_string(), Value::String("Feature".to_string()));
            if let Some(id) = &feat.id {
                fobj.insert("id".to_string(), id.clone());
            }
            fobj.insert(
                "properties".to_string(),
                Value::Object(feat.properties.clone()),
            );
            fobj.insert(
                "geometry".to_string(),
                feat.geometry
                    .as_ref()
                    .map(geometry_to_geojson_value)
                    .unwrap_or(Value::Null),
            );
            features.push(Value::Object(fobj));
        }

        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson_value())
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_geojson_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FeatureCollection::from_geojson_value(&value).map_err(serde::de::Error::custom)
    }
}

fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let (ty, body_key, body) = match geom {
        Geometry::Point(p) => ("Point", "coordinates", point_coords(p)),
        Geometry::MultiPoint(ps) => ("MultiPoint", "coordinates", points_coords(ps)),
        Geometry::LineString(ps) => ("LineString", "coordinates", points_coords(ps)),
        Geometry::MultiLineString(lines) => {
            ("MultiLineString", "coordinates", rings_coords(lines))
        }
        Geometry::Polygon(rings) => ("Polygon", "coordinates", rings_coords(rings)),
        Geometry::MultiPolygon(polys) => (
            "MultiPolygon",
            "coordinates",
            Value::Array(polys.iter().map(|rings| rings_coords(rings)).collect()),
        ),
        Geometry::GeometryCollection(parts) => (
            "GeometryCollection",
            "geometries",
            Value::Array(parts.iter().map(geometry_to_geojson_value).collect()),
        ),
    };

    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(ty.to_string()));
    obj.insert(body_key.to_string(), body);
    Value::Object(obj)
}

fn point_coords(p: &GeoPoint) -> Value {
    let mut coords = vec![Value::from(p.lon_deg), Value::from(p.lat_deg)];
    match (p.z, p.m) {
        (Some(z), Some(m)) => coords.extend([Value::from(z), Value::from(m)]),
        (Some(z), None) => coords.push(Value::from(z)),
        // A measure needs a placeholder elevation to keep its position.
        (None, Some(m)) => coords.extend([Value::Null, Value::from(m)]),
        (None, None) => {}
    }
    Value::Array(coords)
}

fn points_coords(ps: &[GeoPoint]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}

fn rings_coords(rings: &[Vec<GeoPoint>]) -> Value {
    Value::Array(rings.iter().map(|r| points_coords(r)).collect())
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    if ty == "GeometryCollection" {
        let parts = obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .ok_or("GeometryCollection missing geometries".to_string())?;
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            out.push(parse_geometry(part)?);
        }
        return Ok(Geometry::GeometryCollection(out));
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_rings(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(parse_multi_polygon(coords)?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("Point coordinates must be an array".to_string())?;
    if !(2..=4).contains(&arr.len()) {
        return Err("Point coordinates must be [lon, lat, z?, m?]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("Point lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("Point lat must be a number".to_string())?;
    let ordinate = |i: usize, name: &str| match arr.get(i) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("Point {name} must be a number")),
    };
    Ok(GeoPoint {
        lon_deg: lon,
        lat_deg: lat,
        z: ordinate(2, "z")?,
        m: ordinate(3, "m")?,
    })
}

fn parse_points(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_rings(coords: &Value) -> Result<Vec<Vec<GeoPoint>>, String> {
    let rings = coords
        .as_array()
        .ok_or("coordinates must be an array of point lists".to_string())?;
    rings.iter().map(parse_points).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Vec<GeoPoint>>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_rings).collect()
}
