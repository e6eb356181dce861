use crate::data::listing::{ListingBatch, RawListing};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl GeoJsonFeature {
    pub fn point(lng: f64, lat: f64, properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            geometry: Some(GeoJsonGeometry::Point {
                coordinates: [lng, lat],
            }),
            properties: Some(properties),
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

impl GeoJson {
    pub fn features(&self) -> Vec<&GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features } => features.iter().collect(),
        }
    }
}

/// Reads listings out of a GeoJSON document of Point features.
///
/// Listing attributes come from the feature properties; the id is taken from
/// the feature `id` or, failing that, an `id` property. Features without a
/// point geometry or an id are counted as rejected.
pub fn parse_feature_collection(json: &str) -> Result<ListingBatch> {
    let data: GeoJson = serde_json::from_str(json)
        .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))?;

    let mut batch = ListingBatch::default();
    for feature in data.features() {
        match feature_to_raw(feature) {
            Some(raw) => batch.push_raw(raw),
            None => batch.rejected += 1,
        }
    }
    Ok(batch)
}

fn feature_to_raw(feature: &GeoJsonFeature) -> Option<RawListing> {
    let [lng, lat] = match &feature.geometry {
        Some(GeoJsonGeometry::Point { coordinates }) => *coordinates,
        _ => {
            log::warn!("skipping GeoJSON feature without a point geometry");
            return None;
        }
    };

    let mut record = feature.properties.clone().unwrap_or_default();
    let id = feature
        .id
        .as_ref()
        .or_else(|| record.get("id"))
        .and_then(id_string);
    let Some(id) = id else {
        log::warn!("skipping GeoJSON point feature without an id");
        return None;
    };

    record.insert("id".to_string(), Value::String(id.clone()));
    record.insert("lat".to_string(), Value::from(lat));
    record.insert("lng".to_string(), Value::from(lng));

    match serde_json::from_value(Value::Object(record)) {
        Ok(raw) => Some(raw),
        Err(e) => {
            log::warn!("skipping GeoJSON feature '{}': {}", id, e);
            None
        }
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
