//! Fertility ensemble predictor
//!
//! Runs the independently trained models over a normalized feature vector
//! and aggregates their votes into a single `FertilityVerdict`. Models are
//! polymorphic over one capability (`FertilityModel::score`), so model
//! kinds can be mixed or swapped without touching the aggregator.

pub mod aggregate;
pub mod models;

pub use aggregate::{aggregate_votes, EnsembleConfig};
pub use models::{ClassMap, FertilityModel, ModelArtifact};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use crate::normalizer::FeatureVector;

/// Soil fertility classes, ordered from least to most fertile.
///
/// The ordering is load-bearing: vote ties resolve to the lesser class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FertilityClass {
    Low,
    Moderate,
    High,
}

impl FertilityClass {
    pub const ALL: [FertilityClass; 3] = [
        FertilityClass::Low,
        FertilityClass::Moderate,
        FertilityClass::High,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            FertilityClass::Low => "Low fertility",
            FertilityClass::Moderate => "Moderate fertility",
            FertilityClass::High => "High fertility",
        }
    }
}

/// One model's vote on a feature vector.
#[derive(Debug, Clone, Serialize)]
pub struct ModelVote {
    pub model_id: String,
    pub class: FertilityClass,
    /// Model confidence in [0, 1].
    pub confidence: f64,
    /// The model's declared ensemble weight.
    pub weight: f64,
}

/// The aggregated fertility verdict. Immutable once produced; the
/// contributing votes are retained for audit.
#[derive(Debug, Clone, Serialize)]
pub struct FertilityVerdict {
    class: FertilityClass,
    confidence: f64,
    votes: Vec<ModelVote>,
}

impl FertilityVerdict {
    pub(crate) fn new(class: FertilityClass, confidence: f64, votes: Vec<ModelVote>) -> Self {
        Self {
            class,
            confidence,
            votes,
        }
    }

    pub fn class(&self) -> FertilityClass {
        self.class
    }

    /// Aggregated confidence in [0, 1].
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn votes(&self) -> &[ModelVote] {
        &self.votes
    }
}

/// Scores a feature vector with every model and aggregates the votes.
pub struct EnsemblePredictor {
    models: Vec<Box<dyn FertilityModel + Send + Sync>>,
    config: EnsembleConfig,
}

impl EnsemblePredictor {
    pub fn new(models: Vec<Box<dyn FertilityModel + Send + Sync>>, config: EnsembleConfig) -> Self {
        Self { models, config }
    }

    /// Build the predictor from serialized model artifacts.
    pub fn from_artifacts(artifacts: Vec<ModelArtifact>, config: EnsembleConfig) -> Self {
        let models = artifacts
            .into_iter()
            .map(|a| Box::new(a) as Box<dyn FertilityModel + Send + Sync>)
            .collect();
        Self::new(models, config)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Predict a fertility verdict for the feature vector.
    ///
    /// A model declaring a different schema than the vector is a hard
    /// `SchemaMismatch`. A model that abstains is recorded as absent and
    /// never retried; too few votes is `InsufficientQuorum`.
    pub fn predict(&self, features: &FeatureVector) -> EngineResult<FertilityVerdict> {
        let mut votes: SmallVec<[ModelVote; 8]> = SmallVec::new();

        for model in &self.models {
            if model.schema_version() != features.schema_version {
                return Err(EngineError::SchemaMismatch(format!(
                    "model '{}' expects schema '{}' but vector carries '{}'",
                    model.id(),
                    model.schema_version(),
                    features.schema_version
                )));
            }

            match model.score(features) {
                Some((class, confidence)) => votes.push(ModelVote {
                    model_id: model.id().to_string(),
                    class,
                    confidence: confidence.clamp(0.0, 1.0),
                    weight: model.weight(),
                }),
                None => {
                    tracing::debug!(model = model.id(), "model abstained from voting");
                }
            }
        }

        aggregate_votes(votes.into_vec(), &self.config)
    }
}
