//! USDA soil texture classification
//!
//! Places a sand/silt/clay composition into one of the 12 USDA texture
//! classes using the standard decision rules over the texture triangle.

use serde::Serialize;

/// The 12 USDA texture classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureClass {
    Sand,
    LoamySand,
    SandyLoam,
    Loam,
    SiltLoam,
    Silt,
    SandyClayLoam,
    ClayLoam,
    SiltyClayLoam,
    SandyClay,
    SiltyClay,
    Clay,
}

impl TextureClass {
    pub fn display_text(&self) -> &'static str {
        match self {
            TextureClass::Sand => "Sand",
            TextureClass::LoamySand => "Loamy Sand",
            TextureClass::SandyLoam => "Sandy Loam",
            TextureClass::Loam => "Loam",
            TextureClass::SiltLoam => "Silt Loam",
            TextureClass::Silt => "Silt",
            TextureClass::SandyClayLoam => "Sandy Clay Loam",
            TextureClass::ClayLoam => "Clay Loam",
            TextureClass::SiltyClayLoam => "Silty Clay Loam",
            TextureClass::SandyClay => "Sandy Clay",
            TextureClass::SiltyClay => "Silty Clay",
            TextureClass::Clay => "Clay",
        }
    }

    /// Broad drainage behaviour of the class, for advisory text.
    pub fn drainage(&self) -> &'static str {
        match self {
            TextureClass::Sand | TextureClass::LoamySand => "fast-draining",
            TextureClass::SandyLoam | TextureClass::Loam => "well-drained",
            TextureClass::SiltLoam | TextureClass::SandyClayLoam => "moderately drained",
            TextureClass::Silt | TextureClass::ClayLoam | TextureClass::SiltyClayLoam => {
                "slow-draining"
            }
            TextureClass::SandyClay | TextureClass::SiltyClay | TextureClass::Clay => {
                "poorly drained"
            }
        }
    }
}

/// Classify a composition into a USDA texture class.
///
/// Fractions are percentages and must sum to ~100 (±1 tolerance for rounded
/// inputs); returns `None` otherwise. Rules follow the USDA texture
/// triangle boundaries, checked from coarsest to finest.
pub fn classify_texture(sand: f64, silt: f64, clay: f64) -> Option<TextureClass> {
    if sand < 0.0 || silt < 0.0 || clay < 0.0 {
        return None;
    }
    if ((sand + silt + clay) - 100.0).abs() > 1.0 {
        return None;
    }

    let class = if silt + 1.5 * clay < 15.0 {
        TextureClass::Sand
    } else if silt + 1.5 * clay >= 15.0 && silt + 2.0 * clay < 30.0 {
        TextureClass::LoamySand
    } else if (clay >= 7.0 && clay < 20.0 && sand > 52.0 && silt + 2.0 * clay >= 30.0)
        || (clay < 7.0 && silt < 50.0 && silt + 2.0 * clay >= 30.0)
    {
        TextureClass::SandyLoam
    } else if clay >= 7.0 && clay < 27.0 && silt >= 28.0 && silt < 50.0 && sand <= 52.0 {
        TextureClass::Loam
    } else if (silt >= 50.0 && clay >= 12.0 && clay < 27.0) || (silt >= 50.0 && silt < 80.0 && clay < 12.0) {
        TextureClass::SiltLoam
    } else if silt >= 80.0 && clay < 12.0 {
        TextureClass::Silt
    } else if clay >= 20.0 && clay < 35.0 && silt < 28.0 && sand > 45.0 {
        TextureClass::SandyClayLoam
    } else if clay >= 27.0 && clay < 40.0 && sand > 20.0 && sand <= 45.0 {
        TextureClass::ClayLoam
    } else if clay >= 27.0 && clay < 40.0 && sand <= 20.0 {
        TextureClass::SiltyClayLoam
    } else if clay >= 35.0 && sand > 45.0 {
        TextureClass::SandyClay
    } else if clay >= 40.0 && silt >= 40.0 {
        TextureClass::SiltyClay
    } else if clay >= 40.0 && sand <= 45.0 && silt < 40.0 {
        TextureClass::Clay
    } else {
        // Boundary compositions that slip between rule edges
        TextureClass::Loam
    };

    Some(class)
}
