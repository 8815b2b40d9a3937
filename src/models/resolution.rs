//! Outcome of resolving a single point.

use std::sync::Arc;

use super::Region;

/// Result of a two-tier lookup.
///
/// Both negative outcomes are normal answers, not errors.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The point lies inside this region
    Resolved(Arc<Region>),
    /// The point is outside every known state
    NotFoundState,
    /// The point is inside `state` but outside all of its indexed regions
    NotFoundRegion { state: String },
}

impl Resolution {
    pub fn region(&self) -> Option<&Arc<Region>> {
        match self {
            Resolution::Resolved(region) => Some(region),
            _ => None,
        }
    }

    /// Short status tag used in logs and batch output
    pub fn status(&self) -> &'static str {
        match self {
            Resolution::Resolved(_) => "resolved",
            Resolution::NotFoundState => "not_found_state",
            Resolution::NotFoundRegion { .. } => "not_found_region",
        }
    }
}
