//! Soil sample types
//!
//! Defines the fixed soil-property schema (the eight SoilGrids topsoil
//! properties the models were trained on) and the `SoilSample` produced by
//! the resolver. Property order is the schema order and never changes.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::texture::{classify_texture, TextureClass};

/// The soil properties the engine understands, in schema order.
///
/// Values are topsoil (0-5 cm) means: total nitrogen (cg/kg), pH (H2O),
/// sand/silt/clay (%), CEC (cmol/kg), bulk density (cg/cm3), soil organic
/// carbon (dg/kg).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilProperty {
    Nitrogen,
    Ph,
    Sand,
    Silt,
    Cec,
    BulkDensity,
    Clay,
    Soc,
}

impl SoilProperty {
    /// All properties in schema order.
    pub const ALL: [SoilProperty; 8] = [
        SoilProperty::Nitrogen,
        SoilProperty::Ph,
        SoilProperty::Sand,
        SoilProperty::Silt,
        SoilProperty::Cec,
        SoilProperty::BulkDensity,
        SoilProperty::Clay,
        SoilProperty::Soc,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Canonical column/key name for catalogs and artifacts.
    pub fn name(&self) -> &'static str {
        match self {
            SoilProperty::Nitrogen => "nitrogen",
            SoilProperty::Ph => "ph",
            SoilProperty::Sand => "sand",
            SoilProperty::Silt => "silt",
            SoilProperty::Cec => "cec",
            SoilProperty::BulkDensity => "bulk_density",
            SoilProperty::Clay => "clay",
            SoilProperty::Soc => "soc",
        }
    }

    /// Index into the schema-ordered value array.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    /// Parse a canonical property name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Whether the sample's values were measured at a reference point or
/// spatially interpolated between reference points. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Measured,
    Interpolated,
}

/// A resolved soil sample at a location.
///
/// Every schema property is present or explicitly `None` (missing) — a
/// missing value is never silently zero. Imputation happens downstream in
/// the normalizer, under a declared strategy.
#[derive(Debug, Clone, Serialize)]
pub struct SoilSample {
    /// Identifier of the reference point, or a synthetic id for
    /// interpolated samples.
    pub id: String,

    pub lat: f64,
    pub lon: f64,

    /// Schema-ordered property values; `None` marks an explicit gap.
    #[serde(serialize_with = "serialize_properties")]
    pub values: [Option<f64>; SoilProperty::COUNT],

    pub provenance: Provenance,

    /// When the sample was resolved (request time, not measurement time).
    pub resolved_at: DateTime<Utc>,
}

impl SoilSample {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64, provenance: Provenance) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            values: [None; SoilProperty::COUNT],
            provenance,
            resolved_at: Utc::now(),
        }
    }

    pub fn get(&self, property: SoilProperty) -> Option<f64> {
        self.values[property.index()]
    }

    pub fn set(&mut self, property: SoilProperty, value: f64) {
        self.values[property.index()] = Some(value);
    }

    /// Iterate (property, value) pairs in schema order.
    pub fn properties(&self) -> impl Iterator<Item = (SoilProperty, Option<f64>)> + '_ {
        SoilProperty::ALL.iter().map(move |p| (*p, self.get(*p)))
    }

    /// Number of properties with a present value.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// USDA texture class derived from the sand/silt/clay fractions, if all
    /// three are present and sum to ~100%.
    pub fn texture_class(&self) -> Option<TextureClass> {
        let sand = self.get(SoilProperty::Sand)?;
        let silt = self.get(SoilProperty::Silt)?;
        let clay = self.get(SoilProperty::Clay)?;
        classify_texture(sand, silt, clay)
    }
}

/// Serialize the value array as an ordered name → value map.
fn serialize_properties<S: Serializer>(
    values: &[Option<f64>; SoilProperty::COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(SoilProperty::COUNT))?;
    for property in SoilProperty::ALL {
        map.serialize_entry(property.name(), &values[property.index()])?;
    }
    map.end()
}
