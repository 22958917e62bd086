//! Reference data loading
//!
//! Loads the read-only artifacts the engine depends on: the soil reference
//! catalog (CSV via Polars), the normalization parameters, the trained
//! model artifacts, and the crop compatibility table (JSON). Everything is
//! loaded once at startup and treated as immutable for the process
//! lifetime; the engine receives it as explicit dependencies, never via a
//! global.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::ensemble::ModelArtifact;
use crate::normalizer::NormalizationParams;
use crate::recommender::CropTable;
use crate::resolver::{ReferencePoint, SoilCatalog};
use crate::sample::SoilProperty;

/// All startup artifacts in one place.
pub struct EngineData {
    pub catalog: SoilCatalog,
    pub normalization: NormalizationParams,
    pub models: Vec<ModelArtifact>,
    pub crops: CropTable,
}

impl EngineData {
    /// Load every artifact from a data directory:
    ///
    ///   - `reference_catalog.csv` — id, region, lat, lon + property columns
    ///   - `normalization_params.json`
    ///   - `model_artifacts.json`
    ///   - `crop_table.json` (optional; falls back to the built-in table)
    pub fn load(data_dir: &Path) -> Result<Self> {
        tracing::info!(dir = %data_dir.display(), "loading engine reference data");

        let catalog = load_catalog(&data_dir.join("reference_catalog.csv"))?;
        let normalization = NormalizationParams::load(&data_dir.join("normalization_params.json"))?;
        let models = load_models(&data_dir.join("model_artifacts.json"))?;

        let crops_path = data_dir.join("crop_table.json");
        let crops = if crops_path.exists() {
            load_crop_table(&crops_path)?
        } else {
            tracing::info!("crop table not found - using built-in table");
            CropTable::builtin()
        };

        tracing::info!(
            reference_points = catalog.len(),
            features = normalization.features.len(),
            models = models.len(),
            crops = crops.len(),
            "engine reference data loaded"
        );

        Ok(EngineData {
            catalog,
            normalization,
            models,
            crops,
        })
    }

    /// Assemble from already-built parts (tests, embedded deployments).
    pub fn from_parts(
        catalog: SoilCatalog,
        normalization: NormalizationParams,
        models: Vec<ModelArtifact>,
        crops: CropTable,
    ) -> Self {
        Self {
            catalog,
            normalization,
            models,
            crops,
        }
    }
}

/// Load the reference catalog CSV.
///
/// Required columns: `id`, `lat`, `lon`. Optional: `region` plus one column
/// per soil property (canonical names); a null cell is an explicit gap,
/// never zero.
pub fn load_catalog(path: &Path) -> Result<SoilCatalog> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load reference catalog: {:?}", path))?;

    let ids = df
        .column("id")
        .with_context(|| "Catalog column 'id' not found")?
        .str()
        .with_context(|| "Catalog column 'id' is not string typed")?
        .clone();

    let lats = numeric_column(&df, "lat")?;
    let lons = numeric_column(&df, "lon")?;

    let regions = df
        .column("region")
        .ok()
        .and_then(|c| c.str().ok().cloned());

    // A property column may be absent entirely; every point then has a gap
    // for that property.
    let mut property_columns: Vec<Option<Float64Chunked>> =
        Vec::with_capacity(SoilProperty::COUNT);
    for property in SoilProperty::ALL {
        match df.column(property.name()) {
            Ok(column) => {
                let casted = column.cast(&DataType::Float64).with_context(|| {
                    format!("Catalog column '{}' is not numeric", property.name())
                })?;
                property_columns.push(Some(
                    casted
                        .f64()
                        .with_context(|| {
                            format!("Catalog column '{}' cast failed", property.name())
                        })?
                        .clone(),
                ));
            }
            Err(_) => property_columns.push(None),
        }
    }

    let mut points = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(id), Some(lat), Some(lon)) = (ids.get(idx), lats.get(idx), lons.get(idx))
        else {
            anyhow::bail!("catalog row {} is missing id/lat/lon", idx);
        };

        let mut values = [None; SoilProperty::COUNT];
        for (slot, column) in values.iter_mut().zip(&property_columns) {
            if let Some(column) = column {
                *slot = column.get(idx);
            }
        }

        points.push(ReferencePoint {
            id: id.to_string(),
            region: regions
                .as_ref()
                .and_then(|r| r.get(idx))
                .map(|s| s.to_string()),
            lat,
            lon,
            values,
        });
    }

    if points.is_empty() {
        anyhow::bail!("reference catalog is empty: {:?}", path);
    }

    Ok(SoilCatalog::new(points))
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let casted = df
        .column(name)
        .with_context(|| format!("Catalog column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Catalog column '{}' is not numeric", name))?;
    Ok(casted
        .f64()
        .with_context(|| format!("Catalog column '{}' cast failed", name))?
        .clone())
}

/// Load the serialized model artifacts.
pub fn load_models(path: &Path) -> Result<Vec<ModelArtifact>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read model artifacts: {:?}", path))?;
    let models: Vec<ModelArtifact> =
        serde_json::from_str(&contents).with_context(|| "Failed to parse model artifacts JSON")?;
    if models.is_empty() {
        anyhow::bail!("model artifact file declares no models: {:?}", path);
    }
    Ok(models)
}

/// Load the crop compatibility table.
pub fn load_crop_table(path: &Path) -> Result<CropTable> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read crop table: {:?}", path))?;
    let mut table: CropTable =
        serde_json::from_str(&contents).with_context(|| "Failed to parse crop table JSON")?;
    table.reindex();
    if table.is_empty() {
        anyhow::bail!("crop table declares no crops: {:?}", path);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "soil_fertility_engine_test_{}_{}",
            std::process::id(),
            name
        ));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_catalog_with_gaps() {
        let csv = "\
id,region,lat,lon,nitrogen,ph,sand,silt,cec,bulk_density,clay,soc
r1,west,0.1,36.1,30.0,6.5,40.0,40.0,18.0,140.0,20.0,25.0
r2,west,0.2,36.2,,5.9,50.0,30.0,15.0,135.0,20.0,20.0
";
        let path = write_temp("catalog.csv", csv);
        let catalog = load_catalog(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(catalog.len(), 2);
        let r2 = &catalog.points()[1];
        assert_eq!(r2.values[SoilProperty::Nitrogen.index()], None);
        assert_eq!(r2.values[SoilProperty::Ph.index()], Some(5.9));
        assert_eq!(r2.region.as_deref(), Some("west"));
    }

    #[test]
    fn test_load_models_rejects_empty() {
        let path = write_temp("models.json", "[]");
        let err = load_models(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(err.to_string().contains("no models"));
    }

    #[test]
    fn test_load_crop_table_reindexes() {
        let json = r#"{
            "crops": [
                {
                    "name": "Maize",
                    "tolerated": ["moderate", "high"],
                    "requirements": [
                        {"property": "ph", "min": 5.5, "max": 7.5}
                    ]
                }
            ]
        }"#;
        let path = write_temp("crops.json", json);
        let table = load_crop_table(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(table.len(), 1);
        assert!(table.get("Maize").is_some());
    }
}
