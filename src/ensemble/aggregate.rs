//! Weighted-vote aggregation
//!
//! Combines per-model votes into one verdict. Policy, stated explicitly:
//! per class the vote mass is `sum(weight_i * confidence_i)`; the class
//! with the highest mass wins; an exact tie resolves to the
//! lower-fertility class, because under-predicting fertility is less
//! agronomically harmful than over-predicting it.

use super::{FertilityClass, FertilityVerdict, ModelVote};
use crate::error::{EngineError, EngineResult};

/// Aggregation policy knobs.
#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    /// Minimum number of successful votes for a verdict to be valid.
    pub min_quorum: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self { min_quorum: 2 }
    }
}

/// Aggregate votes into a verdict.
///
/// Pure function of the votes and config; identical inputs always produce
/// the identical verdict.
pub fn aggregate_votes(
    votes: Vec<ModelVote>,
    config: &EnsembleConfig,
) -> EngineResult<FertilityVerdict> {
    if votes.len() < config.min_quorum {
        return Err(EngineError::InsufficientQuorum {
            got: votes.len(),
            needed: config.min_quorum,
        });
    }

    let mut mass = [0.0_f64; FertilityClass::COUNT];
    for vote in &votes {
        mass[vote.class.index()] += vote.weight * vote.confidence;
    }

    // Strict comparison keeps the earlier (lower-fertility) class on ties.
    let mut winner = FertilityClass::Low;
    for class in FertilityClass::ALL {
        if mass[class.index()] > mass[winner.index()] {
            winner = class;
        }
    }

    let total: f64 = mass.iter().sum();
    let confidence = if total > 0.0 {
        mass[winner.index()] / total
    } else {
        0.0
    };

    Ok(FertilityVerdict::new(winner, confidence, votes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vote(model_id: &str, class: FertilityClass, confidence: f64, weight: f64) -> ModelVote {
        ModelVote {
            model_id: model_id.to_string(),
            class,
            confidence,
            weight,
        }
    }

    #[test]
    fn test_weighted_vote_scenario() {
        // Three equal-weight models: High 0.9, Moderate 0.6, High 0.8
        // -> High with confidence (0.9 + 0.8) / (0.9 + 0.6 + 0.8)
        let votes = vec![
            vote("m1", FertilityClass::High, 0.9, 1.0),
            vote("m2", FertilityClass::Moderate, 0.6, 1.0),
            vote("m3", FertilityClass::High, 0.8, 1.0),
        ];

        let verdict = aggregate_votes(votes, &EnsembleConfig::default()).unwrap();
        assert_eq!(verdict.class(), FertilityClass::High);
        assert_relative_eq!(verdict.confidence(), 1.7 / 2.3, epsilon = 1e-9);
        assert_eq!(verdict.votes().len(), 3);
    }

    #[test]
    fn test_tie_resolves_to_lower_class() {
        let votes = vec![
            vote("m1", FertilityClass::High, 0.7, 1.0),
            vote("m2", FertilityClass::Low, 0.7, 1.0),
        ];

        let verdict = aggregate_votes(votes, &EnsembleConfig::default()).unwrap();
        assert_eq!(verdict.class(), FertilityClass::Low);
    }

    #[test]
    fn test_three_way_tie_resolves_to_low() {
        let votes = vec![
            vote("m1", FertilityClass::Low, 0.5, 1.0),
            vote("m2", FertilityClass::Moderate, 0.5, 1.0),
            vote("m3", FertilityClass::High, 0.5, 1.0),
        ];

        let verdict = aggregate_votes(votes, &EnsembleConfig::default()).unwrap();
        assert_eq!(verdict.class(), FertilityClass::Low);
        assert_relative_eq!(verdict.confidence(), 1.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_declared_weights_shift_the_outcome() {
        let votes = vec![
            vote("heavy", FertilityClass::Low, 0.6, 3.0),
            vote("light_a", FertilityClass::High, 0.8, 1.0),
            vote("light_b", FertilityClass::High, 0.7, 1.0),
        ];

        // Low mass: 1.8, High mass: 1.5
        let verdict = aggregate_votes(votes, &EnsembleConfig::default()).unwrap();
        assert_eq!(verdict.class(), FertilityClass::Low);
    }

    #[test]
    fn test_quorum_enforced() {
        let votes = vec![vote("m1", FertilityClass::High, 0.9, 1.0)];
        let err = aggregate_votes(votes, &EnsembleConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientQuorum { got: 1, needed: 2 }
        ));
    }

    #[test]
    fn test_determinism() {
        let make = || {
            vec![
                vote("m1", FertilityClass::Moderate, 0.55, 1.5),
                vote("m2", FertilityClass::High, 0.9, 0.5),
                vote("m3", FertilityClass::Moderate, 0.4, 1.0),
            ]
        };
        let a = aggregate_votes(make(), &EnsembleConfig::default()).unwrap();
        let b = aggregate_votes(make(), &EnsembleConfig::default()).unwrap();
        assert_eq!(a.class(), b.class());
        assert_relative_eq!(a.confidence(), b.confidence(), epsilon = 0.0);
    }
}
