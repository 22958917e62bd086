//! Feature normalizer
//!
//! Converts a `SoilSample` into the fixed-length `FeatureVector` the
//! ensemble was trained against. Scaler parameters and imputation
//! strategies are fixed at model-build time and loaded once from a JSON
//! artifact, so identical samples always normalize identically.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::sample::{SoilProperty, SoilSample};

/// Per-property scaling recorded at model-build time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Scaling {
    /// (value - min) / (max - min), clamped to [0, 1].
    MinMax { min: f64, max: f64 },
    /// (value - mean) / std.
    ZScore { mean: f64, std: f64 },
}

impl Scaling {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Scaling::MinMax { min, max } => {
                let span = max - min;
                if span <= 0.0 {
                    0.0
                } else {
                    ((value - min) / span).clamp(0.0, 1.0)
                }
            }
            Scaling::ZScore { mean, std } => {
                if *std <= 0.0 {
                    0.0
                } else {
                    (value - mean) / std
                }
            }
        }
    }
}

/// What to do when a property is missing from the sample.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Imputation {
    /// Substitute a fixed raw value recorded in the artifact (typically the
    /// training-set median). Applied before scaling.
    Constant { value: f64 },
    /// The property may not be imputed; a gap is a `SchemaMismatch`.
    Required,
}

/// One feature slot: which property feeds it and how it is transformed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureSpec {
    pub property: SoilProperty,
    pub scaling: Scaling,
    pub impute: Imputation,
}

/// The normalization artifact: feature order, scalers, and imputation
/// strategies, versioned so the ensemble can verify compatibility.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NormalizationParams {
    pub schema_version: String,
    pub features: Vec<FeatureSpec>,
}

impl NormalizationParams {
    /// Load the artifact from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read normalization params: {:?}", path))?;
        let params: NormalizationParams = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse normalization params JSON")?;
        params.validate()?;
        Ok(params)
    }

    /// Reject artifacts with duplicate feature slots.
    pub fn validate(&self) -> Result<()> {
        let mut seen = [false; SoilProperty::COUNT];
        for spec in &self.features {
            let idx = spec.property.index();
            if seen[idx] {
                anyhow::bail!("duplicate feature for property '{}'", spec.property.name());
            }
            seen[idx] = true;
        }
        if self.features.is_empty() {
            anyhow::bail!("normalization params declare no features");
        }
        Ok(())
    }
}

/// A normalized feature vector in the schema the ensemble expects.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureVector {
    pub schema_version: String,
    /// Properties feeding each slot, in artifact order.
    pub properties: Vec<SoilProperty>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the feature fed by `property`, if it is part of the schema.
    pub fn get(&self, property: SoilProperty) -> Option<f64> {
        self.properties
            .iter()
            .position(|p| *p == property)
            .map(|i| self.values[i])
    }
}

/// Applies the normalization artifact to samples. Pure: no per-request
/// state, no recomputation of parameters.
pub struct FeatureNormalizer {
    params: NormalizationParams,
}

impl FeatureNormalizer {
    pub fn new(params: NormalizationParams) -> Self {
        Self { params }
    }

    pub fn schema_version(&self) -> &str {
        &self.params.schema_version
    }

    pub fn feature_count(&self) -> usize {
        self.params.features.len()
    }

    /// Normalize a sample into the ensemble's feature space.
    ///
    /// A missing property is imputed per its declared strategy; a missing
    /// `Required` property is a hard `SchemaMismatch`, never a default.
    pub fn normalize(&self, sample: &SoilSample) -> EngineResult<FeatureVector> {
        let mut properties = Vec::with_capacity(self.params.features.len());
        let mut values = Vec::with_capacity(self.params.features.len());

        for spec in &self.params.features {
            let raw = match (sample.get(spec.property), &spec.impute) {
                (Some(value), _) => value,
                (None, Imputation::Constant { value }) => *value,
                (None, Imputation::Required) => {
                    return Err(EngineError::SchemaMismatch(format!(
                        "sample '{}' is missing required property '{}'",
                        sample.id,
                        spec.property.name()
                    )));
                }
            };
            properties.push(spec.property);
            values.push(spec.scaling.apply(raw));
        }

        Ok(FeatureVector {
            schema_version: self.params.schema_version.clone(),
            properties,
            values,
        })
    }
}
