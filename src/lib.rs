//! Soil Fertility Inference Engine
//!
//! Turns a location into a fertility assessment report through a fixed
//! pipeline:
//! - `resolver`: coordinates or region name to a soil property sample
//! - `normalizer`: raw sample to a versioned feature vector
//! - `ensemble`: weighted-vote fertility classification
//! - `recommender`: ranked crop suitability for the verdict
//! - `report`: correlation-checked assembly of the final report
//!
//! All reference data is loaded once through `data::EngineData`; the
//! `engine::FertilityEngine` coordinator owns it immutably and serves
//! requests sequentially or in parallel.

pub mod advisory;
pub mod data;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod normalizer;
pub mod recommender;
pub mod report;
pub mod resolver;
pub mod sample;
pub mod texture;

// Re-export commonly used types
pub use data::EngineData;
pub use engine::{EngineConfig, FertilityEngine};
pub use ensemble::{EnsembleConfig, FertilityClass, FertilityVerdict};
pub use error::{EngineError, EngineResult};
pub use report::{AssessmentRequest, LocationQuery, Report};
pub use sample::{Provenance, SoilProperty, SoilSample};
