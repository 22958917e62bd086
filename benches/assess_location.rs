//! Pipeline benchmarks over a synthetic reference catalog.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use soil_fertility_engine::ensemble::models::{Cmp, ThresholdRule};
use soil_fertility_engine::ensemble::{ClassMap, ModelArtifact};
use soil_fertility_engine::normalizer::{FeatureSpec, Imputation, NormalizationParams, Scaling};
use soil_fertility_engine::recommender::CropTable;
use soil_fertility_engine::resolver::{ReferencePoint, SoilCatalog};
use soil_fertility_engine::sample::SoilProperty;
use soil_fertility_engine::{
    AssessmentRequest, EngineConfig, EngineData, FertilityClass, FertilityEngine,
};

const SCHEMA: &str = "soil-v1";

/// A dense grid of reference points around (0, 36).
fn catalog(side: usize) -> SoilCatalog {
    let mut points = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let lat = -0.5 + row as f64 * 1.0 / side as f64;
            let lon = 35.5 + col as f64 * 1.0 / side as f64;
            let mut values = [None; SoilProperty::COUNT];
            values[SoilProperty::Ph.index()] = Some(5.5 + (row % 5) as f64 * 0.4);
            values[SoilProperty::Nitrogen.index()] = Some(20.0 + (col % 7) as f64 * 8.0);
            values[SoilProperty::Sand.index()] = Some(40.0);
            values[SoilProperty::Silt.index()] = Some(40.0);
            values[SoilProperty::Clay.index()] = Some(20.0);
            values[SoilProperty::Cec.index()] = Some(18.0);
            values[SoilProperty::BulkDensity.index()] = Some(135.0);
            values[SoilProperty::Soc.index()] = Some(25.0);
            points.push(ReferencePoint {
                id: format!("p-{}-{}", row, col),
                region: Some("benchland".to_string()),
                lat,
                lon,
                values,
            });
        }
    }
    SoilCatalog::new(points)
}

fn normalization() -> NormalizationParams {
    NormalizationParams {
        schema_version: SCHEMA.to_string(),
        features: vec![
            FeatureSpec {
                property: SoilProperty::Ph,
                scaling: Scaling::MinMax { min: 3.5, max: 9.5 },
                impute: Imputation::Required,
            },
            FeatureSpec {
                property: SoilProperty::Nitrogen,
                scaling: Scaling::MinMax { min: 0.0, max: 100.0 },
                impute: Imputation::Constant { value: 30.0 },
            },
        ],
    }
}

fn models() -> Vec<ModelArtifact> {
    vec![
        ModelArtifact::Thresholds {
            id: "rules-v1".to_string(),
            weight: 1.0,
            schema_version: SCHEMA.to_string(),
            rules: vec![
                ThresholdRule {
                    property: SoilProperty::Nitrogen,
                    op: Cmp::Ge,
                    threshold: 0.45,
                    class: FertilityClass::High,
                },
                ThresholdRule {
                    property: SoilProperty::Nitrogen,
                    op: Cmp::Lt,
                    threshold: 0.15,
                    class: FertilityClass::Low,
                },
                ThresholdRule {
                    property: SoilProperty::Ph,
                    op: Cmp::Ge,
                    threshold: 0.40,
                    class: FertilityClass::High,
                },
                ThresholdRule {
                    property: SoilProperty::Ph,
                    op: Cmp::Lt,
                    threshold: 0.40,
                    class: FertilityClass::Moderate,
                },
            ],
        },
        ModelArtifact::Linear {
            id: "linear-v1".to_string(),
            weight: 1.0,
            schema_version: SCHEMA.to_string(),
            coefficients: ClassMap {
                low: vec![0.0, -8.0],
                moderate: vec![0.0, 0.0],
                high: vec![0.0, 8.0],
            },
            intercepts: ClassMap {
                low: 3.0,
                moderate: 0.0,
                high: -3.0,
            },
        },
    ]
}

fn engine(side: usize) -> FertilityEngine {
    let data = EngineData::from_parts(catalog(side), normalization(), models(), CropTable::builtin());
    FertilityEngine::new(data, EngineConfig::default()).unwrap()
}

fn bench_assess_single(c: &mut Criterion) {
    let engine = engine(32);
    let request = AssessmentRequest::coordinates("bench", 0.013, 36.017);

    c.bench_function("assess_coordinates", |b| {
        b.iter(|| engine.assess(black_box(&request)).unwrap())
    });
}

fn bench_assess_region(c: &mut Criterion) {
    let engine = engine(32);
    let request = AssessmentRequest::region("bench", "benchland");

    c.bench_function("assess_region", |b| {
        b.iter(|| engine.assess(black_box(&request)).unwrap())
    });
}

fn bench_assess_batch(c: &mut Criterion) {
    let engine = engine(32);
    let requests: Vec<AssessmentRequest> = (0..256)
        .map(|i| {
            AssessmentRequest::coordinates(
                format!("bench-{}", i),
                -0.4 + (i % 16) as f64 * 0.05,
                35.6 + (i / 16) as f64 * 0.05,
            )
        })
        .collect();

    c.bench_function("assess_batch_256", |b| {
        b.iter(|| engine.assess_batch(black_box(&requests)))
    });
}

criterion_group!(
    benches,
    bench_assess_single,
    bench_assess_batch,
    bench_assess_region
);
criterion_main!(benches);
