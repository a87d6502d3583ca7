//! Estimated volume normalization.
//!
//! Reports give volume either as an exact gallon count ("25,000"), as one of
//! the regulator's bucket strings ("1,000 < gallons <= 10,000", often
//! truncated by the form to "1,000 < gall"), or as free text with embedded
//! numbers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::patterns::{DIGITS_ONLY, VOLUME_NUMBER, WHITESPACE};

/// Normalized estimate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeEstimate {
    /// Gallons; the upper bound for closed ranges, the lower bound for open ones.
    pub gallons: Option<u64>,
    pub is_range: bool,
    /// Human-readable bucket label, or the original text when unrecognized.
    pub label: Option<String>,
}

impl VolumeEstimate {
    fn exact(gallons: u64) -> Self {
        Self {
            gallons: Some(gallons),
            is_range: false,
            label: None,
        }
    }

    fn bucket(lower: u64, upper: Option<u64>) -> Self {
        Self {
            gallons: Some(upper.unwrap_or(lower)),
            is_range: true,
            label: Some(bucket_label(lower, upper)),
        }
    }

    /// Whether the text matched no known pattern.
    pub fn is_unrecognized(&self) -> bool {
        self.gallons.is_none() && self.is_range
    }
}

/// Bucket keys as they appear after whitespace removal and lowercasing.
/// Matched exactly first, then as prefixes.
const BUCKETS: &[(&str, u64, u64)] = &[
    ("<=1,0", 0, 1_000),
    ("<=1,000", 0, 1_000),
    ("<=1000", 0, 1_000),
    ("1,000<gall", 1_000, 10_000),
    ("1000<gall", 1_000, 10_000),
    ("10,000<gall", 10_000, 25_000),
    ("10000<gall", 10_000, 25_000),
    ("25,000<gall", 25_000, 50_000),
    ("25000<gall", 25_000, 50_000),
    ("50,000<gall", 50_000, 75_000),
    ("50000<gall", 50_000, 75_000),
    ("75,000<gall", 75_000, 100_000),
    ("75000<gall", 75_000, 100_000),
    ("75,000<gallo", 75_000, 100_000),
    ("100,000<gall", 100_000, 250_000),
    ("100000<gall", 100_000, 250_000),
    ("250,000<gall", 250_000, 500_000),
    ("250000<gall", 250_000, 500_000),
    ("500,000<gall", 500_000, 750_000),
    ("500000<gall", 500_000, 750_000),
    ("750,000<gall", 750_000, 1_000_000),
    ("750,000<gallo", 750_000, 1_000_000),
    ("750000<gall", 750_000, 1_000_000),
];

/// Format a number with thousands separators.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// "0 - 1,000", "1,000 - 10,000", or "≥ 1,000,000" for open ranges.
pub fn bucket_label(lower: u64, upper: Option<u64>) -> String {
    match upper {
        None => format!("\u{2265} {}", format_thousands(lower)),
        Some(upper) => format!("{} - {}", format_thousands(lower), format_thousands(upper)),
    }
}

fn lookup_bucket(norm: &str) -> Option<(u64, u64)> {
    BUCKETS
        .iter()
        .find(|(key, _, _)| *key == norm)
        .or_else(|| BUCKETS.iter().find(|(key, _, _)| norm.starts_with(key)))
        .map(|&(_, lower, upper)| (lower, upper))
}

fn parse_number(token: &str) -> Option<u64> {
    token.replace(',', "").parse().ok()
}

/// Parse raw volume text into an estimate.
///
/// Unrecognized text yields `gallons: None, is_range: true` with the
/// original text as label, and logs a warning.
pub fn parse_volume(raw: Option<&str>) -> VolumeEstimate {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return VolumeEstimate::default();
    };

    if DIGITS_ONLY.is_match(raw) {
        if let Some(n) = parse_number(&WHITESPACE.replace_all(raw, "")) {
            return VolumeEstimate::exact(n);
        }
    }

    let norm = WHITESPACE.replace_all(raw, "").to_lowercase();
    if let Some((lower, upper)) = lookup_bucket(&norm) {
        return VolumeEstimate::bucket(lower, Some(upper));
    }

    let numbers: Vec<u64> = VOLUME_NUMBER
        .find_iter(raw)
        .filter_map(|m| parse_number(m.as_str()))
        .collect();
    match numbers.as_slice() {
        [lower, upper, ..] => VolumeEstimate::bucket(*lower, Some(*upper)),
        [lower] => VolumeEstimate::bucket(*lower, None),
        [] => {
            warn!("Unrecognized estimated volume format: {}", raw);
            VolumeEstimate {
                gallons: None,
                is_range: true,
                label: Some(raw.to_string()),
            }
        }
    }
}

/// Whether a primary volume capture is a range placeholder rather than a
/// number.
pub fn is_range_text(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains('<')
        || lower.contains('>')
        || lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == "to")
}

/// Pick the volume text for a record: the primary capture unless it is a
/// range placeholder, in which case the range field replaces it.
pub fn resolve_volume_text<'a>(primary: Option<&'a str>, range: Option<&'a str>) -> Option<&'a str> {
    match primary {
        Some(p) if !is_range_text(p) => Some(p),
        Some(p) => range.or(Some(p)),
        None => range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(raw: &str, gallons: u64, is_range: bool, label: Option<&str>) {
        let v = parse_volume(Some(raw));
        assert_eq!(v.gallons, Some(gallons), "gallons for {:?}", raw);
        assert_eq!(v.is_range, is_range, "is_range for {:?}", raw);
        assert_eq!(v.label.as_deref(), label, "label for {:?}", raw);
    }

    #[test]
    fn test_exact_numbers() {
        check("25,000", 25_000, false, None);
        check(" 150 ", 150, false, None);
    }

    #[test]
    fn test_bucket_strings() {
        check("<=1,0", 1_000, true, Some("0 - 1,000"));
        check("1,000 < gall", 10_000, true, Some("1,000 - 10,000"));
        check("1,000 < gallons", 10_000, true, Some("1,000 - 10,000"));
        check("10,000 < gall", 25_000, true, Some("10,000 - 25,000"));
        check("250,000 < gall", 500_000, true, Some("250,000 - 500,000"));
        check("750,000 < gallo", 1_000_000, true, Some("750,000 - 1,000,000"));
    }

    #[test]
    fn test_full_range_field_text() {
        check("1,000 < gallons <= 10,000", 10_000, true, Some("1,000 - 10,000"));
    }

    #[test]
    fn test_open_range() {
        check("1,000,000 < gall", 1_000_000, true, Some("\u{2265} 1,000,000"));
    }

    #[test]
    fn test_embedded_numbers() {
        check("between 200 and 400 gallons", 400, true, Some("200 - 400"));
        check("500 to 800", 800, true, Some("500 - 800"));
    }

    #[test]
    fn test_missing_and_unrecognized() {
        assert_eq!(parse_volume(None), VolumeEstimate::default());
        assert_eq!(parse_volume(Some("   ")), VolumeEstimate::default());

        let v = parse_volume(Some("unknown amount"));
        assert!(v.is_unrecognized());
        assert_eq!(v.label.as_deref(), Some("unknown amount"));
    }

    #[test]
    fn test_resolve_volume_text() {
        assert_eq!(resolve_volume_text(Some("2,500"), Some("1,000 < gall")), Some("2,500"));
        assert_eq!(resolve_volume_text(Some("< 1,000"), Some("<= 1,000 gallons")), Some("<= 1,000 gallons"));
        assert_eq!(resolve_volume_text(Some("100 to 200"), None), Some("100 to 200"));
        assert_eq!(resolve_volume_text(None, Some("1,000 < gall")), Some("1,000 < gall"));
        assert_eq!(resolve_volume_text(None, None), None);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }
}
