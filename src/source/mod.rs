//! Boundary source: GeoJSON feature collections on disk.
//!
//! Geometry is kept loosely typed here. Deciding which geometry kinds are
//! acceptable happens when the index is built, so a stray LineString shows up
//! as a build error instead of a parse error.

mod geometry;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::SourceError;

pub use geometry::to_boundary;

/// GeoJSON geometry object, `{"type": ..., "coordinates": ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct RawGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

/// A single GeoJSON feature
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    pub geometry: Option<RawGeometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<RawFeature>,
}

impl RawFeature {
    /// Property value, with JSON `null` treated as absent
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .as_ref()
            .and_then(|props| props.get(key))
            .filter(|v| !v.is_null())
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// String view of a property. Numbers are formatted, whole floats
    /// without a fractional part. Blank strings count as absent.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(i.to_string())
                } else {
                    n.as_f64().map(|f| {
                        if f.fract() == 0.0 {
                            format!("{:.0}", f)
                        } else {
                            f.to_string()
                        }
                    })
                }
            }
            _ => None,
        }
    }

    /// Numeric view of a property. Numeric strings are parsed.
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        match self.property(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short description for log lines and errors
    pub fn describe(&self, position: usize) -> String {
        match self.property_str("NAME") {
            Some(name) => format!("#{} ({})", position, name),
            None => format!("#{}", position),
        }
    }
}

/// Load every feature from a GeoJSON FeatureCollection file.
///
/// Files with a `.gz` extension are decompressed on the fly.
pub fn load_features(path: &Path) -> Result<Vec<RawFeature>, SourceError> {
    info!("Loading boundary features from {}", path.display());

    let unavailable = |reason: String| SourceError::SourceUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let features = parse_features(BufReader::new(reader)).map_err(unavailable)?;
    info!("Loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

/// Parse a FeatureCollection from any reader
pub fn parse_features<R: Read>(reader: R) -> Result<Vec<RawFeature>, String> {
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|e| e.to_string())?;
    if collection.kind != "FeatureCollection" {
        return Err(format!(
            "expected a FeatureCollection, found '{}'",
            collection.kind
        ));
    }
    Ok(collection.features)
}
