//! Error types for loading boundary data and building the index.

use std::path::PathBuf;

/// Boundary data could not be read or parsed
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("boundary source {path} unavailable: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
}

/// Fatal index build failure. No partial index is ever served.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("feature {feature} has unsupported geometry kind '{kind}' (expected Polygon or MultiPolygon)")]
    UnsupportedGeometryKind { kind: String, feature: String },

    #[error("feature {feature} has invalid coordinates: {reason}")]
    InvalidCoordinates { feature: String, reason: String },
}
