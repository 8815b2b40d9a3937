//! Core data models for the reverse geocoding service.

pub mod region;
pub mod resolution;
pub mod states;

pub use region::{make_point, BoundaryKind, GeoBoundary, Region, DEFAULT_WEIGHT};
pub use resolution::Resolution;
