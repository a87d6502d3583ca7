//! Receiving water resolution and normalization.

use super::patterns::{collapse_whitespace, PARENTHESIZED};

pub const CONTAINED_LABEL: &str = "Contained / did not reach state waters";
pub const GROUND_ABSORBED: &str = "Ground absorbed";

const WATERBODY_KEYWORDS: &[&str] = &[
    "river", "creek", "bay", "branch", "lake", "pond", "gully", "lagoon", "swamp", "stream",
    "ditch", "canal", "cove", "slough", "harbor",
];

const CONTAINED_PHRASES: &[&str] = &[
    "ground absorbed",
    "backup into building",
    "backup into building/residence",
    "contained",
    "did not reach us waters",
    "did not reach waters",
];

fn names_waterbody(value: &str) -> bool {
    let lower = value.to_lowercase();
    let negated = ["no ", "not ", "none"].iter().any(|n| lower.starts_with(n));
    !negated && WATERBODY_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Pick the receiving water for a report.
///
/// A destination mentioning ground absorption wins outright; otherwise the
/// named creek or river, falling back to the destination text.
pub fn resolve_receiving_water(named: Option<&str>, destination: Option<&str>) -> Option<String> {
    if let Some(dest) = destination {
        if dest.to_lowercase().contains("ground absorbed") {
            return Some(GROUND_ABSORBED.to_string());
        }
    }
    named
        .or(destination)
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

/// Reduce a receiving-water description to a waterbody name.
///
/// Parts are `;`-separated. The first part naming a waterbody wins, with a
/// parenthesized name preferred over its qualifier ("Drainage Ditch(Coosa
/// River)" gives "Coosa River"); negated parts ("No specific stream") never
/// count. Otherwise containment phrases collapse to
/// [`CONTAINED_LABEL`], "Unknown" becomes `None`, and anything else is kept
/// as its first part.
pub fn normalize_receiving_water(raw: Option<&str>) -> Option<String> {
    let value = collapse_whitespace(raw?);
    if value.is_empty() || value.eq_ignore_ascii_case("unknown") {
        return None;
    }

    let parts: Vec<&str> = value
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    for part in &parts {
        if let Some(inner) = PARENTHESIZED
            .captures_iter(part)
            .map(|c| c[1].trim().to_string())
            .find(|inner| names_waterbody(inner))
        {
            return Some(inner);
        }
        if names_waterbody(part) {
            return Some((*part).to_string());
        }
    }

    let lower = value.to_lowercase();
    if CONTAINED_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(CONTAINED_LABEL.to_string());
    }

    parts
        .first()
        .map(|p| (*p).to_string())
        .or(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn norm(raw: &str) -> Option<String> {
        normalize_receiving_water(Some(raw))
    }

    #[test]
    fn test_parenthesized_names() {
        assert_eq!(norm("Ground Absorbed;Drainage Ditch(Coosa River)").as_deref(), Some("Coosa River"));
        assert_eq!(norm("Drainage Ditch(Coosa River)").as_deref(), Some("Coosa River"));
        assert_eq!(norm("Tributary (Yellow Leaf Creek)").as_deref(), Some("Yellow Leaf Creek"));
    }

    #[test]
    fn test_keywords() {
        assert_eq!(norm("Guntersville Lake").as_deref(), Some("Guntersville Lake"));
        assert_eq!(norm("Cahaba River").as_deref(), Some("Cahaba River"));
        assert_eq!(norm("Black Warrior").as_deref(), Some("Black Warrior"));
    }

    #[test]
    fn test_contained() {
        assert_eq!(norm("Ground Absorbed").as_deref(), Some(CONTAINED_LABEL));
        assert_eq!(norm("Backup into building").as_deref(), Some(CONTAINED_LABEL));
        assert_eq!(norm("Ground Absorbed; Backup").as_deref(), Some(CONTAINED_LABEL));
    }

    #[test]
    fn test_waterbody_beats_earlier_parts() {
        assert_eq!(norm("No specific stream; Paint Rock River").as_deref(), Some("Paint Rock River"));
        assert_eq!(norm("Ground absorbed; Turkey Creek").as_deref(), Some("Turkey Creek"));
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(norm("Some unknown location").as_deref(), Some("Some unknown location"));
        assert_eq!(normalize_receiving_water(None), None);
        assert_eq!(norm("Unknown"), None);
        assert_eq!(norm("  "), None);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve_receiving_water(Some("Fish River"), Some("Creek or River")).as_deref(),
            Some("Fish River")
        );
        assert_eq!(
            resolve_receiving_water(Some("Fish River"), Some("Ground Absorbed")).as_deref(),
            Some(GROUND_ABSORBED)
        );
        assert_eq!(
            resolve_receiving_water(None, Some("Storm drain to ditch")).as_deref(),
            Some("Storm drain to ditch")
        );
        assert_eq!(resolve_receiving_water(None, None), None);
    }
}
