//! Keyword classification of reported causes.

use super::patterns::LIFT_STATION_ABBREV;
use crate::models::CauseCategory;

/// Checked in order. Power keywords must precede lift station keywords.
const KEYWORDS: &[(CauseCategory, &[&str])] = &[
    (
        CauseCategory::HeavyRain,
        &["rain", "storm", "wet weather", "i/i", "inflow", "infiltration", "flood"],
    ),
    (CauseCategory::PowerFailure, &["power", "electrical", "outage", "generator"]),
    (
        CauseCategory::TreatmentPlantFailure,
        &["wwtp", "treatment plant", "clarifier", "headworks", "lagoon"],
    ),
    (
        CauseCategory::LiftStationFailure,
        &["lift station", "pump", "float", "wet well"],
    ),
    (
        CauseCategory::DevelopmentDamage,
        &["contractor", "construction", "excavation", "third party", "third-party", "hit by"],
    ),
    (
        CauseCategory::InfrastructureFailure,
        &[
            "broken", "main", "grease", "roots", "crack", "pipe", "plugged", "blockage", "clog",
            "collapse", "debris",
        ],
    ),
];

/// Map free-text cause to a category. Missing text is `Unknown`; text that
/// matches nothing is `Other`.
pub fn classify_cause(cause: Option<&str>) -> CauseCategory {
    let Some(text) = cause.map(str::trim).filter(|c| !c.is_empty()) else {
        return CauseCategory::Unknown;
    };
    let lower = text.to_lowercase();

    for (category, words) in KEYWORDS {
        if words.iter().any(|w| lower.contains(w)) {
            return *category;
        }
        if *category == CauseCategory::LiftStationFailure && LIFT_STATION_ABBREV.is_match(&lower) {
            return *category;
        }
    }
    CauseCategory::Other
}
