//! GeoJSON coordinates to `geo` geometry.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;

use super::RawFeature;
use crate::error::BuildError;
use crate::models::GeoBoundary;

type RawRing = Vec<Vec<f64>>;

/// Convert a feature's geometry into a boundary.
///
/// Anything other than Polygon or MultiPolygon is rejected, including a
/// missing geometry.
pub fn to_boundary(feature: &RawFeature, position: usize) -> Result<GeoBoundary, BuildError> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Err(BuildError::UnsupportedGeometryKind {
            kind: "null".to_string(),
            feature: feature.describe(position),
        });
    };

    let invalid = |reason: String| BuildError::InvalidCoordinates {
        feature: feature.describe(position),
        reason,
    };

    match geometry.kind.as_str() {
        "Polygon" => {
            let rings = Vec::<RawRing>::deserialize(&geometry.coordinates)
                .map_err(|e| invalid(e.to_string()))?;
            build_polygon(rings)
                .map(GeoBoundary::Polygon)
                .map_err(invalid)
        }
        "MultiPolygon" => {
            let polygons = Vec::<Vec<RawRing>>::deserialize(&geometry.coordinates)
                .map_err(|e| invalid(e.to_string()))?;
            let polygons = polygons
                .into_iter()
                .map(build_polygon)
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            if polygons.is_empty() {
                return Err(invalid("multipolygon has no polygons".to_string()));
            }
            Ok(GeoBoundary::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(BuildError::UnsupportedGeometryKind {
            kind: other.to_string(),
            feature: feature.describe(position),
        }),
    }
}

/// First ring is the exterior, the rest are holes
fn build_polygon(rings: Vec<RawRing>) -> Result<Polygon<f64>, String> {
    let mut rings = rings.into_iter().map(build_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| "polygon has no rings".to_string())??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn build_ring(positions: RawRing) -> Result<LineString<f64>, String> {
    let mut ring = positions
        .into_iter()
        .map(|pos| match pos.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(format!("position needs two values, got {}", pos.len())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Close the ring if needed
    if ring.len() >= 3 && ring.first() != ring.last() {
        ring.push(ring[0]);
    }

    if ring.len() < 4 {
        return Err(format!("ring has {} positions, need at least 4", ring.len()));
    }

    Ok(LineString::new(ring))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundaryKind;
    use crate::source::parse_features;

    fn feature(geometry: &str) -> RawFeature {
        let json = format!(
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{"NAME":"Test"}},"geometry":{}}}]}}"#,
            geometry
        );
        parse_features(json.as_bytes()).unwrap().remove(0)
    }

    #[test]
    fn test_polygon_with_hole() {
        let f = feature(
            r#"{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4],[0,0]],[[1,1],[2,1],[2,2],[1,2],[1,1]]]}"#,
        );
        let boundary = to_boundary(&f, 0).unwrap();
        assert_eq!(boundary.kind(), BoundaryKind::Polygon);
        assert!(boundary.contains(&geo::Point::new(3.0, 3.0)));
        assert!(!boundary.contains(&geo::Point::new(1.5, 1.5)));
    }

    #[test]
    fn test_multipolygon() {
        let f = feature(
            r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,1],[0,0]]],[[[5,5],[6,5],[6,6],[5,6],[5,5]]]]}"#,
        );
        let boundary = to_boundary(&f, 0).unwrap();
        assert_eq!(boundary.kind(), BoundaryKind::MultiPolygon);
    }

    #[test]
    fn test_unclosed_ring_is_closed() {
        let f = feature(r#"{"type":"Polygon","coordinates":[[[0,0,12.5],[1,0],[1,1],[0,1]]]}"#);
        assert!(to_boundary(&f, 0).is_ok());
    }

    #[test]
    fn test_line_is_unsupported() {
        let f = feature(r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#);
        match to_boundary(&f, 3) {
            Err(BuildError::UnsupportedGeometryKind { kind, feature }) => {
                assert_eq!(kind, "LineString");
                assert_eq!(feature, "#3 (Test)");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_ring_is_invalid() {
        let f = feature(r#"{"type":"Polygon","coordinates":[[[0,0],[1,0]]]}"#);
        assert!(matches!(
            to_boundary(&f, 0),
            Err(BuildError::InvalidCoordinates { .. })
        ));
    }
}
