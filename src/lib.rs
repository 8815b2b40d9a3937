//! Geoservice - reverse geocoding of US coordinates to state and region
//!
//! This library provides the boundary loading, index and resolver shared by
//! the HTTP server and the batch resolve binaries.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pip;
pub mod source;

pub use error::{BuildError, SourceError};
pub use models::{Region, Resolution};
pub use pip::GeocodeResolver;
