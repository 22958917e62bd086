//! Report assembly
//!
//! Composes the resolver, ensemble, and recommender outputs into one
//! immutable report. Purely structural: the only check performed is that
//! all three inputs reference the same request correlation id. Errors from
//! earlier stages are forwarded by the engine, never swallowed here.

use serde::{Deserialize, Serialize};

use crate::advisory::{advisory_for, Advisory};
use crate::ensemble::FertilityVerdict;
use crate::error::{EngineError, EngineResult};
use crate::recommender::CropRecommendation;
use crate::sample::SoilSample;
use crate::texture::TextureClass;

/// Where to assess: a coordinate pair or a catalog region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationQuery {
    Coordinates { lat: f64, lon: f64 },
    Region(String),
}

/// A request from the serving layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub correlation_id: String,
    pub query: LocationQuery,
}

impl AssessmentRequest {
    pub fn coordinates(correlation_id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            query: LocationQuery::Coordinates { lat, lon },
        }
    }

    pub fn region(correlation_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            query: LocationQuery::Region(region.into()),
        }
    }
}

/// A stage output tagged with the request it belongs to.
#[derive(Debug, Clone)]
pub struct Tagged<T> {
    pub correlation_id: String,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(correlation_id: impl Into<String>, value: T) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            value,
        }
    }
}

/// The assembled per-request report. Owns its constituents exclusively for
/// the request lifetime; nothing here is persisted by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub correlation_id: String,
    pub sample: SoilSample,
    pub verdict: FertilityVerdict,
    pub recommendations: CropRecommendation,
    /// USDA texture class, when the sand/silt/clay fractions allow it.
    pub texture: Option<TextureClass>,
    pub advisory: Advisory,
}

/// Assemble a report from tagged stage outputs.
///
/// All three must carry the same correlation id; a mismatch aborts
/// assembly rather than producing a report stitched from different
/// requests.
pub fn assemble(
    sample: Tagged<SoilSample>,
    verdict: Tagged<FertilityVerdict>,
    recommendations: Tagged<CropRecommendation>,
) -> EngineResult<Report> {
    if sample.correlation_id != verdict.correlation_id
        || verdict.correlation_id != recommendations.correlation_id
    {
        return Err(EngineError::CorrelationMismatch(format!(
            "sample={}, verdict={}, recommendations={}",
            sample.correlation_id, verdict.correlation_id, recommendations.correlation_id
        )));
    }

    let texture = sample.value.texture_class();
    let advisory = advisory_for(verdict.value.class());

    Ok(Report {
        correlation_id: sample.correlation_id,
        sample: sample.value,
        verdict: verdict.value,
        recommendations: recommendations.value,
        texture,
        advisory,
    })
}
