//! Normalized administrative regions and their boundaries.

use geo::{BoundingRect, Contains, MultiPolygon, Point, Polygon, Rect};

/// Weight assigned to a region whose source record carries no housing-unit count
pub const DEFAULT_WEIGHT: i64 = 10;

/// Build a point from a lat/lon pair.
///
/// Geometry is stored as (x = longitude, y = latitude), so the point must be
/// built in that order. Swapping the arguments does not fail, it silently
/// resolves the wrong place.
pub fn make_point(lat: f64, lon: f64) -> Point<f64> {
    Point::new(lon, lat)
}

/// Which containment test a boundary needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    Polygon,
    MultiPolygon,
}

/// Immutable region or state geometry
#[derive(Debug, Clone)]
pub enum GeoBoundary {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl GeoBoundary {
    pub fn kind(&self) -> BoundaryKind {
        match self {
            GeoBoundary::Polygon(_) => BoundaryKind::Polygon,
            GeoBoundary::MultiPolygon(_) => BoundaryKind::MultiPolygon,
        }
    }

    /// Point-in-boundary test.
    ///
    /// Points lying exactly on a ring are not contained. The same rule
    /// applies to every boundary, state or region.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match self {
            GeoBoundary::Polygon(polygon) => polygon.contains(point),
            GeoBoundary::MultiPolygon(multi) => multi.contains(point),
        }
    }

    /// Bounding box, `None` for empty geometry
    pub fn bbox(&self) -> Option<Rect<f64>> {
        match self {
            GeoBoundary::Polygon(polygon) => polygon.bounding_rect(),
            GeoBoundary::MultiPolygon(multi) => multi.bounding_rect(),
        }
    }
}

/// A county, sub-county, city or community belonging to one state
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// Full name of the owning state
    pub state: String,
    pub boundary: GeoBoundary,
    /// Population proxy (housing units), only used to order the search
    pub weight: i64,
    pub community_id: Option<String>,
    bbox: Option<Rect<f64>>,
}

impl Region {
    pub fn new(
        name: impl Into<String>,
        state: impl Into<String>,
        boundary: GeoBoundary,
        weight: i64,
        community_id: Option<String>,
    ) -> Self {
        let bbox = boundary.bbox();
        Self {
            name: name.into(),
            state: state.into(),
            boundary,
            weight,
            community_id,
            bbox,
        }
    }

    pub fn kind(&self) -> BoundaryKind {
        self.boundary.kind()
    }

    /// Exact containment, with a bounding box rejection first
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match &self.bbox {
            Some(rect) if !rect_covers(rect, point) => false,
            Some(_) => self.boundary.contains(point),
            None => false,
        }
    }
}

/// Inclusive bounding box check
pub(crate) fn rect_covers(rect: &Rect<f64>, point: &Point<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    point.x() >= min.x && point.x() <= max.x && point.y() >= min.y && point.y() <= max.y
}
