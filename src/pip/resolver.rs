//! Two-tier point resolution: state first, then the state's regions.

use geo::Point;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::{normalize_all, NormalizeReport, RegionIndex, StateCatalog};
use crate::config::SourcesConfig;
use crate::error::BuildError;
use crate::models::{make_point, Resolution};
use crate::source::load_features;

/// Resolves points against a state catalog and a region index.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct GeocodeResolver {
    states: StateCatalog,
    regions: RegionIndex,
    report: NormalizeReport,
}

impl GeocodeResolver {
    pub fn new(states: StateCatalog, regions: RegionIndex) -> Self {
        let report = NormalizeReport {
            kept: regions.len(),
            ..Default::default()
        };
        Self {
            states,
            regions,
            report,
        }
    }

    /// Attach the counts from the normalization run the index was built from
    pub fn with_report(mut self, report: NormalizeReport) -> Self {
        self.report = report;
        self
    }

    /// Load both boundary datasets and build the resolver.
    ///
    /// Any failure aborts the whole build.
    pub fn load(sources: &SourcesConfig) -> Result<Self, BuildError> {
        let started = Instant::now();

        let state_features = load_features(&sources.states)?;
        let states = StateCatalog::from_features(&state_features)?;
        drop(state_features);

        let region_features = load_features(&sources.regions)?;
        let (regions, report) = normalize_all(&region_features)?;
        drop(region_features);
        let regions = RegionIndex::build(regions);

        info!(
            "Resolver ready in {:.1}s: {} states, {} regions",
            started.elapsed().as_secs_f64(),
            states.len(),
            regions.len()
        );

        Ok(Self::new(states, regions).with_report(report))
    }

    pub fn resolve(&self, lat: f64, lon: f64) -> Resolution {
        self.resolve_point(&make_point(lat, lon))
    }

    pub fn resolve_point(&self, point: &Point<f64>) -> Resolution {
        let Some(state) = self.states.find_state(point) else {
            debug!("({}, {}) is outside every state", point.x(), point.y());
            return Resolution::NotFoundState;
        };

        // Heavier regions come first, so on overlapping borders the more
        // populous region wins.
        let candidates = self.regions.regions_in(&state.name);
        match candidates.iter().find(|region| region.contains(point)) {
            Some(region) => {
                debug!(
                    "({}, {}) resolved to {}, {} (weight {})",
                    point.x(),
                    point.y(),
                    region.name,
                    region.state,
                    region.weight
                );
                Resolution::Resolved(Arc::clone(region))
            }
            None => {
                debug!(
                    "({}, {}) is in {} but none of its {} regions",
                    point.x(),
                    point.y(),
                    state.name,
                    candidates.len()
                );
                Resolution::NotFoundRegion {
                    state: state.name.clone(),
                }
            }
        }
    }

    pub fn states(&self) -> &StateCatalog {
        &self.states
    }

    pub fn regions(&self) -> &RegionIndex {
        &self.regions
    }

    /// Records kept and skipped while building the region index
    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_resolver;
    use super::*;

    fn resolved_name(resolution: &Resolution) -> Option<(&str, &str)> {
        resolution
            .region()
            .map(|r| (r.name.as_str(), r.state.as_str()))
    }

    #[test]
    fn test_durham_resolves_in_north_carolina() {
        let resolver = sample_resolver();
        let result = resolver.resolve(35.9, -78.9);
        assert_eq!(
            resolved_name(&result),
            Some(("Durham County", "North Carolina"))
        );
    }

    #[test]
    fn test_costa_mesa_resolves_in_california() {
        let resolver = sample_resolver();
        let result = resolver.resolve(33.64, -117.92);
        assert_eq!(resolved_name(&result), Some(("Orange County", "California")));
    }

    #[test]
    fn test_heavier_region_wins_overlap() {
        // Inside Durham County, Durham and Chapel Hill at once
        let resolver = sample_resolver();
        let result = resolver.resolve(35.9, -78.97);
        assert_eq!(resolved_name(&result).map(|r| r.0), Some("Durham County"));
    }

    #[test]
    fn test_null_island_is_not_found_state() {
        let resolver = sample_resolver();
        assert!(matches!(resolver.resolve(0.0, 0.0), Resolution::NotFoundState));
    }

    #[test]
    fn test_swapped_coordinates_do_not_resolve() {
        let resolver = sample_resolver();
        assert!(matches!(resolver.resolve(-78.9, 35.9), Resolution::NotFoundState));
    }

    #[test]
    fn test_state_without_covering_region() {
        let resolver = sample_resolver();
        match resolver.resolve(35.5, -76.0) {
            Resolution::NotFoundRegion { state } => assert_eq!(state, "North Carolina"),
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn test_state_with_no_regions_at_all() {
        let resolver = GeocodeResolver::new(
            sample_resolver().states,
            RegionIndex::build(vec![]),
        );
        assert!(matches!(
            resolver.resolve(35.9, -78.9),
            Resolution::NotFoundRegion { .. }
        ));
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeocodeResolver>();
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let states = dir.path().join("states.geojson");
        let regions = dir.path().join("regions.geojson");
        std::fs::write(
            &states,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"NAME":"North Carolina"},
                 "geometry":{"type":"Polygon","coordinates":[[[-84.3,33.8],[-75.4,33.8],[-75.4,36.6],[-84.3,36.6],[-84.3,33.8]]]}}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            &regions,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"NAME":"Durham","ST":"NC","HOUSEUNITS":120000,"Community_ID":"NC-DUR"},
                 "geometry":{"type":"MultiPolygon","coordinates":[[[[-79.0,35.85],[-78.8,35.85],[-78.8,36.1],[-79.0,36.1],[-79.0,35.85]]]]}},
                {"type":"Feature","properties":{"NAME":"Nowhere"},
                 "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}
            ]}"#,
        )
        .unwrap();

        let resolver = GeocodeResolver::load(&SourcesConfig { states, regions }).unwrap();
        assert_eq!(resolver.regions().len(), 1);
        assert_eq!(resolver.report().kept, 1);
        assert_eq!(resolver.report().unresolvable_state, 1);
        assert_eq!(resolver.report().skipped(), 1);
        let region = resolver.resolve(35.9, -78.9);
        let region = region.region().unwrap();
        assert_eq!(region.name, "Durham");
        assert_eq!(region.community_id.as_deref(), Some("NC-DUR"));
    }

    #[test]
    fn test_load_with_line_geometry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let states = dir.path().join("states.geojson");
        let regions = dir.path().join("regions.geojson");
        std::fs::write(
            &states,
            r#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();
        std::fs::write(
            &regions,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"NAME":"Road","ST":"NC"},
                 "geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}
            ]}"#,
        )
        .unwrap();

        assert!(matches!(
            GeocodeResolver::load(&SourcesConfig { states, regions }),
            Err(BuildError::UnsupportedGeometryKind { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let sources = SourcesConfig {
            states: "/nonexistent/states.geojson".into(),
            regions: "/nonexistent/regions.geojson".into(),
        };
        assert!(matches!(
            GeocodeResolver::load(&sources),
            Err(BuildError::Source(_))
        ));
    }
}
