//! Agronomic advisory tables
//!
//! Static per-class guidance attached to each report: what the fertility
//! class indicates about the soil, and which management practices apply.

use serde::Serialize;

use crate::ensemble::FertilityClass;

/// Guidance bundle for one fertility class.
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub status: &'static str,
    pub insights: &'static [&'static str],
    pub soil_indicators: &'static [&'static str],
    pub management_practices: &'static [&'static str],
}

/// Advisory content for a fertility class.
pub fn advisory_for(class: FertilityClass) -> Advisory {
    match class {
        FertilityClass::Low => Advisory {
            status: "Low fertility",
            insights: &[
                "Add compost or manure and use balanced NPK fertilizer to supply missing nutrients",
                "Cover the soil with mulch and reduce tillage to retain moisture",
                "Rotate in legumes such as beans or cowpeas to fix nitrogen naturally",
                "Prefer drought-tolerant crops like millet or sorghum while fertility recovers",
                "Apply fertilizer in small split doses so crops absorb more of it",
            ],
            soil_indicators: &[
                "Low nutrient content; the soil lacks key nutrients for plants",
                "Poor water retention; the soil dries out quickly",
                "Limited organic matter",
                "Unbalanced pH",
            ],
            management_practices: &[
                "Use urea or DAP in small portions at planting and during growth",
                "Plant and incorporate legume cover crops to raise nitrogen and organic matter",
                "Contour-plant on sloped land to reduce erosion and water loss",
                "Mulch to conserve moisture and protect the surface",
                "Test the soil and correct pH with lime (acidic) or sulfur (alkaline)",
            ],
        },
        FertilityClass::Moderate => Advisory {
            status: "Moderate fertility",
            insights: &[
                "Apply a balanced nutrient mix to lift moderate soils toward full productivity",
                "Plant cover crops and add compost to improve structure",
                "Rotate crops to prevent nutrient depletion",
                "Watch crops for deficiency symptoms and adjust fertilization",
                "Irrigate carefully so the soil retains enough moisture in dry spells",
            ],
            soil_indicators: &[
                "Enough nutrients for moderate plant growth",
                "Holds some water but may need irrigation in dry periods",
                "Adequate organic material; benefits from more input",
                "pH usually suitable; minor adjustment may help",
            ],
            management_practices: &[
                "Test soil regularly to track nutrient levels and pH",
                "Fertilize based on soil tests and crop needs",
                "Grow compatible crops together for better nutrient use",
                "Combine organic and mineral fertilizer for soil health",
            ],
        },
        FertilityClass::High => Advisory {
            status: "High fertility",
            insights: &[
                "Keep using balanced fertilizer and organic matter to preserve fertility",
                "Grow a variety of crops to prevent depletion and pest build-up",
                "Test regularly to avoid nutrient excesses as well as deficits",
                "Use minimal tillage and cover crops to protect structure",
                "Adopt drip or sprinkler irrigation for efficient water use",
            ],
            soil_indicators: &[
                "A proper mix of essential nutrients for healthy growth",
                "Holds enough water to carry crops through dry periods",
                "Rich in decomposed organic material",
                "Balanced pH, so crops absorb nutrients easily",
            ],
            management_practices: &[
                "Monitor nutrient levels regularly",
                "Rotate crops to prevent depletion and control pests",
                "Plant cover crops to hold fertility and reduce erosion",
                "Use terracing and cover where erosion threatens",
            ],
        },
    }
}
