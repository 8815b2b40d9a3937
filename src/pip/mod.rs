//! Point-in-Polygon (PIP) region lookup.
//!
//! A coarse scan over state boundaries picks the state, then the state's
//! regions are tested in descending weight order.

mod catalog;
mod index;
pub mod normalize;
mod resolver;

pub use catalog::{StateBoundary, StateCatalog};
pub use index::RegionIndex;
pub use normalize::{normalize_all, normalize_feature, NormalizeReport, Normalized, SkipReason};
pub use resolver::GeocodeResolver;

#[cfg(test)]
pub(crate) use resolver::test_support;
