//! Engine coordinator
//!
//! Wires the pipeline together: resolve a location to a soil sample,
//! normalize it to a feature vector, run the ensemble, rank crops, and
//! assemble the report. Includes both a single-request path and a parallel
//! (Rayon) batch path. The engine owns only read-only artifacts, so one
//! instance serves any number of concurrent requests.

use anyhow::Result;
use rayon::prelude::*;

use crate::data::EngineData;
use crate::ensemble::{EnsembleConfig, EnsemblePredictor};
use crate::error::EngineResult;
use crate::normalizer::FeatureNormalizer;
use crate::recommender::{CropRecommender, CropTable, RecommenderConfig};
use crate::report::{assemble, AssessmentRequest, LocationQuery, Report, Tagged};
use crate::resolver::{ResolverConfig, SoilCatalog, SoilResolver};
use crate::sample::SoilSample;

/// Tunable policy for one engine instance.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    pub ensemble: EnsembleConfig,
    pub recommender: RecommenderConfig,
}

/// The fertility assessment engine.
pub struct FertilityEngine {
    catalog: SoilCatalog,
    normalizer: FeatureNormalizer,
    predictor: EnsemblePredictor,
    crops: CropTable,
    config: EngineConfig,
}

impl FertilityEngine {
    /// Build an engine from loaded artifacts.
    ///
    /// Validates the normalization parameters up front so a malformed
    /// artifact fails at startup, not per request.
    pub fn new(data: EngineData, config: EngineConfig) -> Result<Self> {
        data.normalization.validate()?;

        let predictor =
            EnsemblePredictor::from_artifacts(data.models, config.ensemble.clone());

        tracing::info!(
            reference_points = data.catalog.len(),
            models = predictor.model_count(),
            crops = data.crops.len(),
            "fertility engine ready"
        );

        Ok(Self {
            catalog: data.catalog,
            normalizer: FeatureNormalizer::new(data.normalization),
            predictor,
            crops: data.crops,
            config,
        })
    }

    /// Run the full pipeline for one request.
    ///
    /// Every stage error carries the failing stage's context and aborts the
    /// request; no partial report is ever produced.
    pub fn assess(&self, request: &AssessmentRequest) -> EngineResult<Report> {
        let span = tracing::info_span!("assess", correlation_id = %request.correlation_id);
        let _guard = span.enter();

        let sample = self.resolve(&request.query)?;
        tracing::debug!(
            sample_id = %sample.id,
            provenance = ?sample.provenance,
            properties = sample.present_count(),
            "location resolved"
        );

        let features = self.normalizer.normalize(&sample)?;
        let verdict = self.predictor.predict(&features)?;
        tracing::debug!(
            class = verdict.class().display_text(),
            confidence = verdict.confidence(),
            votes = verdict.votes().len(),
            "ensemble verdict"
        );

        let recommender = CropRecommender::new(&self.crops, self.config.recommender.clone());
        let recommendations = recommender.recommend(verdict.class(), &sample)?;

        let id = &request.correlation_id;
        assemble(
            Tagged::new(id.clone(), sample),
            Tagged::new(id.clone(), verdict),
            Tagged::new(id.clone(), recommendations),
        )
    }

    /// Assess many requests in parallel.
    ///
    /// Results come back in request order; each slot carries its own
    /// outcome so one bad location cannot sink the batch.
    pub fn assess_batch(&self, requests: &[AssessmentRequest]) -> Vec<EngineResult<Report>> {
        requests.par_iter().map(|req| self.assess(req)).collect()
    }

    fn resolve(&self, query: &LocationQuery) -> EngineResult<SoilSample> {
        let resolver = SoilResolver::new(&self.catalog, self.config.resolver.clone());
        match query {
            LocationQuery::Coordinates { lat, lon } => resolver.resolve_coordinates(*lat, *lon),
            LocationQuery::Region(region) => resolver.resolve_region(region),
        }
    }
}
