//! Engine error taxonomy
//!
//! Every variant is recoverable at the request boundary: the serving layer
//! maps each to a user-visible message. Nothing here should abort the process.

use thiserror::Error;

/// Errors surfaced by the fertility engine pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Latitude or longitude outside the valid range.
    #[error("invalid coordinate: lat={lat}, lon={lon} (lat must be in [-90,90], lon in [-180,180])")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// No reference data close enough to resolve the location.
    #[error("unresolvable location ({lat}, {lon}): fewer than {needed} reference points within {max_radius_km} km")]
    UnresolvableLocation {
        lat: f64,
        lon: f64,
        needed: usize,
        max_radius_km: f64,
    },

    /// Region identifier not present in the reference catalog.
    #[error("unknown region: {0:?}")]
    UnknownRegion(String),

    /// Sample is missing a property the feature schema declares non-imputable,
    /// or the schema versions disagree.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Fewer models voted than the configured quorum.
    #[error("insufficient quorum: {got} of {needed} required model votes")]
    InsufficientQuorum { got: usize, needed: usize },

    /// Every candidate crop scored below the suitability floor.
    #[error("no compatible crop: all candidates below suitability floor {floor}")]
    NoCompatibleCrop { floor: f64 },

    /// Report inputs do not all reference the same request.
    #[error("correlation mismatch: {0}")]
    CorrelationMismatch(String),

    /// Failure while loading reference data or model artifacts at startup.
    #[error(transparent)]
    Data(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
