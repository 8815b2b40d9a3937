//! State catalog for the coarse lookup.

use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use tracing::{info, warn};

use super::normalize::NAME_KEY;
use crate::error::BuildError;
use crate::models::GeoBoundary;
use crate::source::{to_boundary, RawFeature};

/// A named state boundary
#[derive(Debug, Clone)]
pub struct StateBoundary {
    pub name: String,
    pub boundary: GeoBoundary,
}

/// R-tree entry pointing back at a catalog position
#[derive(Debug, Clone)]
struct IndexedState {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedState {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Ordered state boundaries.
///
/// Lookups answer with the first state in catalog order that contains the
/// point. The R-tree only narrows down which states get the exact test.
pub struct StateCatalog {
    states: Vec<StateBoundary>,
    tree: RTree<IndexedState>,
}

impl StateCatalog {
    pub fn new(states: Vec<StateBoundary>) -> Self {
        let indexed: Vec<IndexedState> = states
            .iter()
            .enumerate()
            .filter_map(|(position, state)| {
                let rect = state.boundary.bbox()?;
                Some(IndexedState {
                    position,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            states,
            tree: RTree::bulk_load(indexed),
        }
    }

    /// Build from state features. The state name comes from `NAME`.
    pub fn from_features(features: &[RawFeature]) -> Result<Self, BuildError> {
        let mut states = Vec::with_capacity(features.len());
        for (position, feature) in features.iter().enumerate() {
            let boundary = to_boundary(feature, position)?;
            match feature.property_str(NAME_KEY) {
                Some(name) => states.push(StateBoundary { name, boundary }),
                None => warn!("Skipping state feature {}: no {} property", position, NAME_KEY),
            }
        }

        info!("State catalog built with {} states", states.len());
        Ok(Self::new(states))
    }

    /// First state, in catalog order, whose boundary contains the point
    pub fn find_state(&self, point: &Point<f64>) -> Option<&StateBoundary> {
        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.x(), point.y()]))
            .map(|entry| entry.position)
            .collect();
        candidates.sort_unstable();

        candidates
            .into_iter()
            .map(|position| &self.states[position])
            .find(|state| state.boundary.contains(point))
    }

    pub fn states(&self) -> &[StateBoundary] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::region::test_support::square;
    use crate::models::make_point;
    use crate::source::parse_features;

    fn state(name: &str, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> StateBoundary {
        StateBoundary {
            name: name.to_string(),
            boundary: GeoBoundary::Polygon(square(min_lon, min_lat, max_lon, max_lat)),
        }
    }

    #[test]
    fn test_find_state() {
        let catalog = StateCatalog::new(vec![
            state("North Carolina", -84.3, 33.8, -75.4, 36.6),
            state("California", -124.5, 32.5, -114.1, 42.0),
        ]);
        assert_eq!(catalog.len(), 2);
        let nc = catalog.find_state(&make_point(35.9, -78.9)).unwrap();
        assert_eq!(nc.name, "North Carolina");
        let ca = catalog.find_state(&make_point(33.64, -117.92)).unwrap();
        assert_eq!(ca.name, "California");
        assert!(catalog.find_state(&make_point(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_overlap_prefers_catalog_order() {
        let catalog = StateCatalog::new(vec![
            state("Outer", 0.0, 0.0, 10.0, 10.0),
            state("Inner", 4.0, 4.0, 6.0, 6.0),
        ]);
        let hit = catalog.find_state(&Point::new(5.0, 5.0)).unwrap();
        assert_eq!(hit.name, "Outer");

        let reversed = StateCatalog::new(vec![
            state("Inner", 4.0, 4.0, 6.0, 6.0),
            state("Outer", 0.0, 0.0, 10.0, 10.0),
        ]);
        assert_eq!(reversed.find_state(&Point::new(5.0, 5.0)).unwrap().name, "Inner");
    }

    #[test]
    fn test_bbox_hit_but_outside_polygon() {
        let l_shape = GeoBoundary::MultiPolygon(geo::MultiPolygon::new(vec![
            square(0.0, 0.0, 1.0, 3.0),
            square(1.0, 0.0, 3.0, 1.0),
        ]));
        let catalog = StateCatalog::new(vec![StateBoundary {
            name: "L".to_string(),
            boundary: l_shape,
        }]);
        assert!(catalog.find_state(&Point::new(2.0, 2.0)).is_none());
        assert!(catalog.find_state(&Point::new(0.5, 2.5)).is_some());
    }

    #[test]
    fn test_from_features_skips_unnamed() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"NAME":"Ohio"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[2,2],[3,2],[3,3],[2,3],[2,2]]]}}
        ]}"#;
        let catalog = StateCatalog::from_features(&parse_features(json.as_bytes()).unwrap()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.states()[0].name, "Ohio");
    }

    #[test]
    fn test_from_features_rejects_points() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"NAME":"Dot"},"geometry":{"type":"Point","coordinates":[0,0]}}
        ]}"#;
        let result = StateCatalog::from_features(&parse_features(json.as_bytes()).unwrap());
        assert!(matches!(result, Err(BuildError::UnsupportedGeometryKind { .. })));
    }
}
