//! Crop recommender
//!
//! Maps a fertility verdict plus raw soil properties to a ranked crop
//! list. Each crop declares the fertility classes it tolerates and the
//! property ranges it requires; suitability is the fraction of satisfied
//! ranges, demoted (never excluded) when the verdict class falls outside
//! the tolerated set.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::ensemble::FertilityClass;
use crate::error::{EngineError, EngineResult};
use crate::sample::{SoilProperty, SoilSample};

/// A required property band. An open bound is unconstrained on that side.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PropertyRange {
    pub property: SoilProperty,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PropertyRange {
    pub fn new(property: SoilProperty, min: Option<f64>, max: Option<f64>) -> Self {
        Self { property, min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }

    /// Human-readable description used as a limiting factor.
    pub fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => format!("{} {:.1}-{:.1}", self.property.name(), lo, hi),
            (Some(lo), None) => format!("{} >= {:.1}", self.property.name(), lo),
            (None, Some(hi)) => format!("{} <= {:.1}", self.property.name(), hi),
            (None, None) => self.property.name().to_string(),
        }
    }
}

/// One crop's compatibility entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CropProfile {
    pub name: String,
    /// Fertility classes the crop tolerates.
    pub tolerated: Vec<FertilityClass>,
    /// Property ranges the crop requires.
    pub requirements: Vec<PropertyRange>,
}

/// The static crop compatibility table, loaded once and immutable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CropTable {
    crops: Vec<CropProfile>,
    #[serde(skip)]
    by_name: AHashMap<String, usize>,
}

impl CropTable {
    pub fn new(crops: Vec<CropProfile>) -> Self {
        let by_name = crops
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), i))
            .collect();
        Self { crops, by_name }
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }

    pub fn crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn get(&self, name: &str) -> Option<&CropProfile> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| &self.crops[i])
    }

    /// Rebuild the name index after deserialization.
    pub fn reindex(&mut self) {
        self.by_name = self
            .crops
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), i))
            .collect();
    }

    /// Built-in table seeded from the crop lists of the original fertility
    /// mapping (low / moderate / high), with agronomic pH and texture bands.
    pub fn builtin() -> Self {
        use FertilityClass::{High, Low, Moderate};

        fn ph(lo: f64, hi: f64) -> PropertyRange {
            PropertyRange::new(SoilProperty::Ph, Some(lo), Some(hi))
        }
        fn band(p: SoilProperty, lo: f64, hi: f64) -> PropertyRange {
            PropertyRange::new(p, Some(lo), Some(hi))
        }
        fn crop(
            name: &str,
            tolerated: &[FertilityClass],
            requirements: Vec<PropertyRange>,
        ) -> CropProfile {
            CropProfile {
                name: name.to_string(),
                tolerated: tolerated.to_vec(),
                requirements,
            }
        }

        Self::new(vec![
            // Hardy crops for low-fertility soils
            crop("Millet", &[Low, Moderate], vec![ph(5.0, 7.5), band(SoilProperty::Sand, 30.0, 90.0)]),
            crop("Sorghum", &[Low, Moderate], vec![ph(5.5, 8.0), band(SoilProperty::Clay, 0.0, 45.0)]),
            crop("Cassava", &[Low, Moderate], vec![ph(4.5, 7.0), band(SoilProperty::Sand, 30.0, 85.0)]),
            crop("Sweet Potato", &[Low, Moderate], vec![ph(5.0, 6.8), band(SoilProperty::Clay, 0.0, 40.0)]),
            crop("Groundnut", &[Low, Moderate], vec![ph(5.5, 7.0), band(SoilProperty::Sand, 40.0, 85.0)]),
            crop("Pigeon Pea", &[Low, Moderate], vec![ph(5.0, 7.5)]),
            crop("Taro", &[Low, Moderate], vec![ph(5.5, 6.5), band(SoilProperty::Clay, 20.0, 60.0)]),
            crop("Sunflower", &[Low, Moderate, High], vec![ph(6.0, 7.5), band(SoilProperty::Cec, 10.0, 40.0)]),
            // Mid-demand crops
            crop("Maize", &[Moderate, High], vec![ph(5.5, 7.5), band(SoilProperty::Nitrogen, 20.0, 80.0), band(SoilProperty::Cec, 10.0, 40.0)]),
            crop("Beans", &[Moderate, High], vec![ph(6.0, 7.5), band(SoilProperty::Clay, 10.0, 40.0)]),
            crop("Cowpea", &[Low, Moderate], vec![ph(5.5, 7.0)]),
            crop("Potato", &[Moderate], vec![ph(5.0, 6.5), band(SoilProperty::Clay, 0.0, 35.0)]),
            crop("Cabbage", &[Moderate, High], vec![ph(6.0, 7.5), band(SoilProperty::Nitrogen, 25.0, 90.0)]),
            crop("Tomato", &[Moderate, High], vec![ph(5.5, 7.5), band(SoilProperty::Cec, 12.0, 40.0)]),
            crop("Soybean", &[Moderate, High], vec![ph(6.0, 7.0), band(SoilProperty::Clay, 10.0, 45.0)]),
            crop("Chili Pepper", &[Moderate, High], vec![ph(5.5, 7.0)]),
            // Demanding crops for high-fertility soils
            crop("Wheat", &[High], vec![ph(6.0, 7.5), band(SoilProperty::Nitrogen, 30.0, 90.0), band(SoilProperty::Clay, 10.0, 45.0)]),
            crop("Rice", &[High], vec![ph(5.0, 7.0), band(SoilProperty::Clay, 20.0, 60.0)]),
            crop("Sugarcane", &[High], vec![ph(6.0, 7.5), band(SoilProperty::Cec, 15.0, 45.0)]),
            crop("Coffee", &[High, Moderate], vec![ph(5.0, 6.5), band(SoilProperty::Soc, 15.0, 80.0)]),
            crop("Cocoa", &[High], vec![ph(5.0, 7.0), band(SoilProperty::Soc, 15.0, 80.0)]),
            crop("Banana", &[High], vec![ph(5.5, 7.0), band(SoilProperty::Cec, 15.0, 45.0)]),
            crop("Avocado", &[High, Moderate], vec![ph(5.0, 7.0), band(SoilProperty::Clay, 0.0, 40.0)]),
        ])
    }
}

/// One ranked recommendation entry.
#[derive(Debug, Clone, Serialize)]
pub struct CropScore {
    pub crop: String,
    /// Suitability in [0, 1].
    pub score: f64,
    /// Requirements the sample failed, plus "fertility class" when the
    /// verdict fell outside the tolerated set.
    pub limiting_factors: Vec<String>,
}

/// Ordered crop recommendation, best first.
pub type CropRecommendation = Vec<CropScore>;

/// Recommendation policy knobs.
#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Candidates scoring below this floor are dropped.
    pub min_suitability: f64,
    /// Multiplier applied when the verdict class is not tolerated.
    /// Marginal fertility demotes a candidate, it does not eliminate it.
    pub off_class_penalty: f64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            min_suitability: 0.25,
            off_class_penalty: 0.5,
        }
    }
}

/// Scores crops against a verdict and sample.
pub struct CropRecommender<'a> {
    table: &'a CropTable,
    config: RecommenderConfig,
}

impl<'a> CropRecommender<'a> {
    pub fn new(table: &'a CropTable, config: RecommenderConfig) -> Self {
        Self { table, config }
    }

    /// Rank every crop in the table against the verdict class and sample.
    ///
    /// Output is sorted descending by score, ties broken ascending by crop
    /// name. An empty result after the floor is `NoCompatibleCrop` — the
    /// caller decides how to present that.
    pub fn recommend(
        &self,
        class: FertilityClass,
        sample: &SoilSample,
    ) -> EngineResult<CropRecommendation> {
        let mut scored: Vec<CropScore> = self
            .table
            .crops()
            .iter()
            .map(|crop| self.score_crop(crop, class, sample))
            .filter(|s| s.score >= self.config.min_suitability)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.crop.cmp(&b.crop))
        });

        if scored.is_empty() {
            return Err(EngineError::NoCompatibleCrop {
                floor: self.config.min_suitability,
            });
        }
        Ok(scored)
    }

    fn score_crop(&self, crop: &CropProfile, class: FertilityClass, sample: &SoilSample) -> CropScore {
        let mut limiting_factors = Vec::new();

        let satisfied = crop
            .requirements
            .iter()
            .filter(|range| {
                match sample.get(range.property) {
                    Some(value) if range.contains(value) => true,
                    Some(_) => {
                        limiting_factors.push(range.describe());
                        false
                    }
                    None => {
                        // No data cannot satisfy a requirement.
                        limiting_factors.push(format!("{} (no data)", range.property.name()));
                        false
                    }
                }
            })
            .count();

        let mut score = if crop.requirements.is_empty() {
            1.0
        } else {
            satisfied as f64 / crop.requirements.len() as f64
        };

        if !crop.tolerated.contains(&class) {
            score *= self.config.off_class_penalty;
            limiting_factors.push("fertility class".to_string());
        }

        CropScore {
            crop: crop.name.clone(),
            score,
            limiting_factors,
        }
    }
}
