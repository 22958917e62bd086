//! Model artifacts and the scoring capability
//!
//! Each trained model ships as an opaque artifact deserialized at startup.
//! All kinds expose the same capability: score a feature vector into a
//! (class, confidence) pair, or abstain with `None`.

use serde::{Deserialize, Serialize};

use super::FertilityClass;
use crate::normalizer::FeatureVector;
use crate::sample::SoilProperty;

/// The single capability the aggregator knows about.
pub trait FertilityModel {
    fn id(&self) -> &str;

    /// Declared ensemble weight.
    fn weight(&self) -> f64;

    /// Feature schema the model was trained against.
    fn schema_version(&self) -> &str;

    /// Score a feature vector; `None` means the model abstains.
    fn score(&self, features: &FeatureVector) -> Option<(FertilityClass, f64)>;
}

/// A value per fertility class; the serialized form of per-class model
/// parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassMap<T> {
    pub low: T,
    pub moderate: T,
    pub high: T,
}

impl<T> ClassMap<T> {
    pub fn get(&self, class: FertilityClass) -> &T {
        match class {
            FertilityClass::Low => &self.low,
            FertilityClass::Moderate => &self.moderate,
            FertilityClass::High => &self.high,
        }
    }
}

/// Comparison operator for threshold rules.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cmp {
    Ge,
    Lt,
}

/// One decision rule: if the named feature satisfies the comparison, the
/// rule casts a point for its class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThresholdRule {
    pub property: SoilProperty,
    pub op: Cmp,
    /// Threshold in normalized feature space.
    pub threshold: f64,
    pub class: FertilityClass,
}

impl ThresholdRule {
    fn fires(&self, value: f64) -> bool {
        match self.op {
            Cmp::Ge => value >= self.threshold,
            Cmp::Lt => value < self.threshold,
        }
    }
}

/// Serialized model artifact. Adding a kind means adding a variant here;
/// the aggregator never changes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Per-class linear scores mapped through softmax.
    Linear {
        id: String,
        weight: f64,
        schema_version: String,
        coefficients: ClassMap<Vec<f64>>,
        intercepts: ClassMap<f64>,
    },
    /// Nearest class centroid in feature space, confidence by relative
    /// inverse distance.
    Centroid {
        id: String,
        weight: f64,
        schema_version: String,
        centroids: ClassMap<Vec<f64>>,
    },
    /// Decision-rule list; each satisfied rule votes for its class.
    Thresholds {
        id: String,
        weight: f64,
        schema_version: String,
        rules: Vec<ThresholdRule>,
    },
}

impl FertilityModel for ModelArtifact {
    fn id(&self) -> &str {
        match self {
            ModelArtifact::Linear { id, .. }
            | ModelArtifact::Centroid { id, .. }
            | ModelArtifact::Thresholds { id, .. } => id,
        }
    }

    fn weight(&self) -> f64 {
        match self {
            ModelArtifact::Linear { weight, .. }
            | ModelArtifact::Centroid { weight, .. }
            | ModelArtifact::Thresholds { weight, .. } => *weight,
        }
    }

    fn schema_version(&self) -> &str {
        match self {
            ModelArtifact::Linear { schema_version, .. }
            | ModelArtifact::Centroid { schema_version, .. }
            | ModelArtifact::Thresholds { schema_version, .. } => schema_version,
        }
    }

    fn score(&self, features: &FeatureVector) -> Option<(FertilityClass, f64)> {
        match self {
            ModelArtifact::Linear {
                coefficients,
                intercepts,
                ..
            } => score_linear(features, coefficients, intercepts),
            ModelArtifact::Centroid { centroids, .. } => score_centroid(features, centroids),
            ModelArtifact::Thresholds { rules, .. } => score_thresholds(features, rules),
        }
    }
}

fn score_linear(
    features: &FeatureVector,
    coefficients: &ClassMap<Vec<f64>>,
    intercepts: &ClassMap<f64>,
) -> Option<(FertilityClass, f64)> {
    let mut raw = [0.0_f64; FertilityClass::COUNT];
    for class in FertilityClass::ALL {
        let coefs = coefficients.get(class);
        if coefs.len() != features.len() {
            return None;
        }
        raw[class.index()] = coefs
            .iter()
            .zip(&features.values)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + intercepts.get(class);
    }

    let probs = softmax(&raw);
    // Highest probability wins; on an exact tie the earlier (lower) class
    // is retained.
    let mut best = FertilityClass::Low;
    for class in FertilityClass::ALL {
        if probs[class.index()] > probs[best.index()] {
            best = class;
        }
    }
    Some((best, probs[best.index()]))
}

fn score_centroid(
    features: &FeatureVector,
    centroids: &ClassMap<Vec<f64>>,
) -> Option<(FertilityClass, f64)> {
    const EPS: f64 = 1e-9;

    let mut inv_distances = [0.0_f64; FertilityClass::COUNT];
    for class in FertilityClass::ALL {
        let centroid = centroids.get(class);
        if centroid.len() != features.len() {
            return None;
        }
        let dist_sq: f64 = centroid
            .iter()
            .zip(&features.values)
            .map(|(c, v)| (c - v) * (c - v))
            .sum();
        inv_distances[class.index()] = 1.0 / (libm::sqrt(dist_sq) + EPS);
    }

    let total: f64 = inv_distances.iter().sum();
    let mut best = FertilityClass::Low;
    for class in FertilityClass::ALL {
        if inv_distances[class.index()] > inv_distances[best.index()] {
            best = class;
        }
    }
    Some((best, inv_distances[best.index()] / total))
}

fn score_thresholds(
    features: &FeatureVector,
    rules: &[ThresholdRule],
) -> Option<(FertilityClass, f64)> {
    let mut points = [0_u32; FertilityClass::COUNT];
    let mut fired_total = 0_u32;

    for rule in rules {
        // A rule over a feature outside the schema cannot fire.
        let Some(value) = features.get(rule.property) else {
            continue;
        };
        if rule.fires(value) {
            points[rule.class.index()] += 1;
            fired_total += 1;
        }
    }

    if fired_total == 0 {
        return None; // No evidence either way: abstain.
    }

    let mut best = FertilityClass::Low;
    for class in FertilityClass::ALL {
        if points[class.index()] > points[best.index()] {
            best = class;
        }
    }
    Some((best, points[best.index()] as f64 / fired_total as f64))
}

/// Numerically stable softmax.
fn softmax(raw: &[f64; FertilityClass::COUNT]) -> [f64; FertilityClass::COUNT] {
    let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut out = [0.0; FertilityClass::COUNT];
    let mut total = 0.0;
    for (i, r) in raw.iter().enumerate() {
        out[i] = libm::exp(r - max);
        total += out[i];
    }
    for v in &mut out {
        *v /= total;
    }
    out
}
