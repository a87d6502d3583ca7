//! Common regex patterns shared by the normalizers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Volume text
    pub static ref DIGITS_ONLY: Regex = Regex::new(r"^[\d,\s]+$").unwrap();

    pub static ref VOLUME_NUMBER: Regex = Regex::new(r"\d[\d,]*").unwrap();

    // Page footer submission stamp: 3/15/2024 10:22:11 AM
    pub static ref FOOTER_TIMESTAMP: Regex = Regex::new(
        r"(?i)(\d{1,2}/\d{1,2}/\d{4})\s+(\d{1,2}:\d{2}:\d{2})\s*(AM|PM)"
    ).unwrap();

    // Report form date/time: 03/14/2024 ... 07:30 AM
    pub static ref FORM_DATETIME: Regex = Regex::new(
        r"(?is)(\d{1,2}/\d{1,2}/\d{4})[^\d]{0,40}?(\d{1,2}:\d{2}(?::\d{2})?)\s*([AP]\.?M\.?)?"
    ).unwrap();

    pub static ref FORM_DATE: Regex = Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap();

    pub static ref EPOCH: Regex = Regex::new(r"^\d{9,13}(?:\.\d+)?$").unwrap();

    // Organization names
    pub static ref STATE_SUFFIX: Regex = Regex::new(r",\s*[A-Z]{2}$").unwrap();

    pub static ref PAREN_ACRONYM: Regex = Regex::new(r"\(([A-Z]{2,6})\)").unwrap();

    pub static ref LEADING_THE: Regex = Regex::new(r"(?i)^the\s+").unwrap();

    pub static ref MAWSS_LONG: Regex = Regex::new(
        r"(?i)\bmobile\s+area\s+water\s+(?:and|&)\s+sewer\s+system\b"
    ).unwrap();

    // Boilerplate prefixes, most specific first.
    pub static ref ORG_PREFIXES: Vec<Regex> = [
        r"(?i)^the\s+utilities\s+board\s+of\s+the\s+(?:city|town)\s+of\s+",
        r"(?i)^the\s+water\s+works\s+(?:and|&)\s+sewer\s+board\s+of\s+the\s+city\s+of\s+",
        r"(?i)^the\s+water\s+works\s+and\s+sanitary\s+sewer\s+board\s+of\s+(?:the\s+(?:city|town)\s+of\s+)?",
        r"(?i)^utilities\s+board\s+of\s+the\s+city\s+of\s+",
        r"(?i)^board\s+of\s+water\s+and\s+sewer\s+commissioners\s+of\s+the\s+city\s+of\s+",
        r"(?i)^water\s+works\s+(?:and|&)\s+sewer\s+board\s+of\s+the\s+city\s+of\s+",
        r"(?i)^utilities\s+board\s+of\s+the\s+town\s+of\s+",
        r"(?i)^utilities\s+board\s+of\s+",
        r"(?i)^water\s+works\s+(?:and|&)\s+sewer\s+board\s+of\s+",
        r"(?i)^city\s+of\s+",
        r"(?i)^town\s+of\s+",
        r"(?i)^village\s+of\s+",
        r"(?i)^the\s+utilities\s+board\s+of\s+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    // Words dropped when shortening an organization name to a tag.
    pub static ref TAG_STOPWORDS: Regex = Regex::new(
        r"(?i)\b(?:city|town|village|county|water\s+and\s+sewer\s+board|water\s+&\s*sewer\s+board|utilities?\s+board|utilities|utility|board|department|authority|of|the)\b"
    ).unwrap();

    // Receiving waters
    pub static ref PARENTHESIZED: Regex = Regex::new(r"\(([^)]+)\)").unwrap();

    pub static ref WATERBODY_PLACEHOLDER: Regex = Regex::new(
        r"(?i)^(?:creek\s+or\s+river|creek|river|drainage\s+ditch|storm\s+drain|provide.*|n/?a|none)$"
    ).unwrap();

    // Causes
    pub static ref LIFT_STATION_ABBREV: Regex = Regex::new(r"(?i)\bls\b").unwrap();
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_timestamp() {
        let caps = FOOTER_TIMESTAMP.captures("printed 3/15/2024 10:22:11 AM page 1").unwrap();
        assert_eq!(&caps[1], "3/15/2024");
        assert_eq!(&caps[2], "10:22:11");
        assert_eq!(&caps[3], "AM");
    }

    #[test]
    fn test_org_prefixes_compile() {
        assert_eq!(ORG_PREFIXES.len(), 13);
        assert!(ORG_PREFIXES[9].is_match("City of Foley"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Fish \n\t River "), "Fish River");
    }
}
