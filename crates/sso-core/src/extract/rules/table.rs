//! Versioned, ordered table of extraction rules.
//!
//! Several rules may target the same field; they are tried in table order
//! and the first one whose cleaned capture is non-empty wins.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use super::patterns::{collapse_whitespace, WATERBODY_PLACEHOLDER};
use crate::models::Field;

/// Post-processing applied to a raw capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleaner {
    /// First line that is not a placeholder.
    Line,
    /// Whole capture with whitespace collapsed.
    Collapse,
    /// First whitespace-delimited token.
    Token,
    /// First line naming an actual waterbody.
    Waterbody,
}

const PLACEHOLDERS: &[&str] = &["n/a", "na", "none", "-", "information", "unknown/none"];

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    PLACEHOLDERS.contains(&lower.as_str()) || value.ends_with(':')
}

impl Cleaner {
    /// Clean a capture. `None` means the capture holds nothing usable.
    pub fn apply(&self, raw: &str) -> Option<String> {
        let cleaned = match self {
            Cleaner::Line => raw
                .lines()
                .map(collapse_whitespace)
                .find(|line| !line.is_empty() && !is_placeholder(line)),
            Cleaner::Collapse => {
                let value = collapse_whitespace(raw);
                (!is_placeholder(&value)).then_some(value)
            }
            Cleaner::Token => raw
                .split_whitespace()
                .next()
                .map(|t| t.trim_end_matches([',', ';', '.']).to_string()),
            Cleaner::Waterbody => raw
                .lines()
                .map(collapse_whitespace)
                .find(|line| {
                    !line.is_empty()
                        && line.chars().any(char::is_alphabetic)
                        && !WATERBODY_PLACEHOLDER.is_match(line)
                        && !is_placeholder(line)
                }),
        }?;
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

/// Declarative rule: which field, which pattern, which capture group.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRule {
    pub field: Field,
    pub pattern: &'static str,
    pub group: usize,
    pub clean: Cleaner,
}

const fn rule(field: Field, pattern: &'static str, clean: Cleaner) -> ExtractionRule {
    ExtractionRule {
        field,
        pattern,
        group: 1,
        clean,
    }
}

/// Street, city, state, zip and location description in one pass.
pub const ADDRESS_BLOCK_V2: &str = r"Street\s+Address\s*:?\s*(.+?)\s*City\s*:?\s*(.+?),\s*State\s*:?\s*([A-Z]{2})\s*ZIP\s+Code\s*:?\s*(\d{5}(?:-\d{4})?)\s*Location\s+Description\s*:?\s*(.+?)\s*Known\s+or\s+suspected\s+cause";

/// The second-generation report template rules.
pub const RULES_V2: &[ExtractionRule] = &[
    rule(
        Field::ReportId,
        r"Assigned\s+SSO\s+ID\s*:?\s*SSO\s*-?\s*(\d+)",
        Cleaner::Token,
    ),
    rule(Field::ReportId, r"\bSSO-(\d{3,})\b", Cleaner::Token),
    rule(
        Field::PermitNumber,
        r"Permit\s+Number\s*:?\s*([A-Z0-9]*\d[A-Z0-9]*)",
        Cleaner::Token,
    ),
    rule(
        Field::Permittee,
        r"Permittee(?:[ \t]+Name)?[ \t]*:?[ \t]+([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::Permittee,
        r"(?m)^[ \t]*Permittee[ \t]*:?[ \t]*\r?\n\s*([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::FacilityName,
        r"Facility\s+Name\s*:?\s*(.+?)\s+Facility\s+County",
        Cleaner::Collapse,
    ),
    rule(
        Field::FacilityName,
        r"Facility\s+Name[ \t]*:?[ \t]*([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::FacilityCounty,
        r"Facility\s+County\s*:?\s*(\w+)",
        Cleaner::Token,
    ),
    rule(
        Field::Source,
        r"Indicate\s+source\s+of\s+discharge\s+event\s*:?\s*(.+?)\s*County\s+in\s+which",
        Cleaner::Collapse,
    ),
    rule(
        Field::County,
        r"County\s+in\s+which[^\r\n]*?occurred\??[ \t]*:?[ \t]*([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::County,
        r"County\s+in\s+which[^\r\n]*?occurred\??\s*:?\s*\r?\n\s*([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::County,
        r"Facility\s+County\s*:?\s*(\w+)",
        Cleaner::Token,
    ),
    rule(
        Field::Started,
        r"Date\s*[/-]\s*Time\s+SSO\s+Event\s+Started.{0,250}?(\d{1,2}/\d{1,2}/\d{4}[^\d]{0,40}?\d{1,2}:\d{2}(?::\d{2})?\s*[AP]\.?M\.?)",
        Cleaner::Collapse,
    ),
    rule(
        Field::Started,
        r"SSO\s+Event\s+Started.{0,250}?(\d{1,2}/\d{1,2}/\d{4})",
        Cleaner::Token,
    ),
    rule(
        Field::Stopped,
        r"Date\s*[/-]\s*Time\s+SSO\s+Event\s+Stopped.{0,250}?(\d{1,2}/\d{1,2}/\d{4}[^\d]{0,40}?\d{1,2}:\d{2}(?::\d{2})?\s*[AP]\.?M\.?)",
        Cleaner::Collapse,
    ),
    rule(
        Field::Stopped,
        r"SSO\s+Event\s+Stopped.{0,250}?(\d{1,2}/\d{1,2}/\d{4})",
        Cleaner::Token,
    ),
    rule(
        Field::Volume,
        r"Estimated\s+Volume\s+Discharged\s*\(\s*in\s+gallons\s*\)\s*:?[ \t]*([<>=\d][\d,<>=. \t]*(?:to[ \t]*[\d,]+)?)",
        Cleaner::Collapse,
    ),
    rule(
        Field::VolumeRange,
        r"Estimated\s+Volume\s+Discharged\s*\(\s*Range\s*\)\s*:?[ \t]*([^\r\n]*[\d<][^\r\n]*)",
        Cleaner::Line,
    ),
    rule(
        Field::VolumeRange,
        r"Estimated\s+Volume\s+Discharged\s*\(\s*Range\s*\)\s*:?\s*\r?\n\s*([^\r\n]*[\d<][^\r\n]*)",
        Cleaner::Line,
    ),
    rule(
        Field::Latitude,
        r"Latitude\s*/\s*Longitude\s+of\s+discharge\s*:?[ \t]*([^\s,]+)[ \t]*,",
        Cleaner::Token,
    ),
    rule(Field::Latitude, r"\bLatitude\s*:?\s*(-?\d+\.\d+)", Cleaner::Token),
    rule(
        Field::Longitude,
        r"Latitude\s*/\s*Longitude\s+of\s+discharge\s*:?[ \t]*[^\s,]+[ \t]*,[ \t]*([^\s,]+)",
        Cleaner::Token,
    ),
    rule(Field::Longitude, r"\bLongitude\s*:?\s*(-?\d+\.\d+)", Cleaner::Token),
    rule(
        Field::StreetAddress,
        r"Street\s+Address\s*:?\s*(.+?)\s*(?m:^)[ \t]*City\b",
        Cleaner::Collapse,
    ),
    rule(
        Field::StreetAddress,
        r"Street\s+Address[ \t]*:?[ \t]*([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::City,
        r"(?m)^[ \t]*City[ \t]*:?[ \t]*([^,\r\n]+)",
        Cleaner::Collapse,
    ),
    rule(Field::State, r"\bState\s*:?\s*([A-Z]{2})\b", Cleaner::Token),
    rule(
        Field::Zip,
        r"ZIP\s+Code\s*:?\s*(\d{5}(?:-\d{4})?)",
        Cleaner::Token,
    ),
    rule(
        Field::LocationDesc,
        r"Location\s+Description\s*:?\s*(.+?)\s*Known\s+or\s+suspected\s+cause",
        Cleaner::Collapse,
    ),
    rule(
        Field::LocationDesc,
        r"Location\s+Description[ \t]*:?[ \t]*([^\r\n]+)",
        Cleaner::Line,
    ),
    rule(
        Field::Cause,
        r"Known\s+or\s+suspected\s+cause\s+of\s+the\s+discharge\s*:?\s*(.{1,600}?)\s*(?:Destination\s+of\s+discharge|\z)",
        Cleaner::Collapse,
    ),
    rule(
        Field::Destination,
        r"Destination\s+of\s+discharge\s*:?\s*(.{1,400}?)\s*(?:Note\s*:|Provide\s+the\s+first|\z)",
        Cleaner::Collapse,
    ),
    rule(
        Field::ReceivingWater,
        r"Provide\s+the\s+first\s+named\s+creek\s+or\s+river\s+that\s+receives\s+the\s+flow\.?\s*(.{1,400}?)\s*(?:Did\s+the\s+discharge|Describe\s+corrective|\z)",
        Cleaner::Waterbody,
    ),
    rule(
        Field::SwimmingWater,
        r"swimming[^?\r\n]{0,120}\??[ \t]*:?[ \t]*\b(Yes|No)\b",
        Cleaner::Token,
    ),
    rule(
        Field::Monitoring,
        r"monitoring[^?\r\n]{0,120}\??[ \t]*:?[ \t]*\b(Yes|No)\b",
        Cleaner::Token,
    ),
    rule(
        Field::Cleaned,
        r"\bcleaned\b[^?\r\n]{0,80}\??[ \t]*:?[ \t]*\b(Yes|No)\b",
        Cleaner::Token,
    ),
    rule(
        Field::Disinfected,
        r"\bdisinfected\b[^?\r\n]{0,80}\??[ \t]*:?[ \t]*\b(Yes|No)\b",
        Cleaner::Token,
    ),
    rule(
        Field::CorrectiveAction,
        r"Describe\s+corrective\s+actions?\s+taken[^\r\n]*\r?\n(.+?)\r?\n\s*Please\s+attach",
        Cleaner::Collapse,
    ),
    rule(
        Field::PublicNotice,
        r"Indicate\s+efforts\s+to\s+notify\s+(?:the\s+)?public[^\r\n]*\r?\n(.+?)\r?\n\s*Date\s+signs\s+were\s+placed",
        Cleaner::Collapse,
    ),
    rule(
        Field::SignsDate,
        r"Date\s+signs\s+were\s+placed\s*:?\s*(\d{1,2}/\d{1,2}/\d{2,4})",
        Cleaner::Token,
    ),
    rule(
        Field::HealthNotified,
        r"County\s+Health\s+Department\s+notification\s+date\s*:?\s*(\d{1,2}/\d{1,2}/\d{2,4})",
        Cleaner::Token,
    ),
];

/// A rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub field: Field,
    pub regex: Regex,
    pub group: usize,
    pub clean: Cleaner,
}

impl CompiledRule {
    /// First match whose cleaned capture is non-empty.
    pub fn capture(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(self.group))
            .find_map(|m| self.clean.apply(m.as_str()))
    }
}

/// An ordered, versioned set of compiled rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: String,
    rules: Vec<CompiledRule>,
    address_block: Option<Regex>,
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

lazy_static! {
    static ref V2: RuleSet = RuleSet::compile("v2", RULES_V2, Some(ADDRESS_BLOCK_V2)).unwrap();
}

impl RuleSet {
    /// Compile a rule table. Patterns are case-insensitive and `.` matches
    /// newlines.
    pub fn compile(
        version: impl Into<String>,
        rules: &[ExtractionRule],
        address_block: Option<&str>,
    ) -> Result<Self, regex::Error> {
        let compiled = rules
            .iter()
            .map(|r| {
                Ok(CompiledRule {
                    field: r.field,
                    regex: compile_pattern(r.pattern)?,
                    group: r.group,
                    clean: r.clean,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            version: version.into(),
            rules: compiled,
            address_block: address_block.map(compile_pattern).transpose()?,
        })
    }

    /// The current report template rules.
    pub fn v2() -> &'static RuleSet {
        &V2
    }

    /// Look up a built-in table by version name.
    pub fn by_version(version: &str) -> Option<&'static RuleSet> {
        match version {
            "v2" => Some(Self::v2()),
            _ => None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rules_for(&self, field: Field) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(move |r| r.field == field)
    }

    pub fn address_block(&self) -> Option<&Regex> {
        self.address_block.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_v2_compiles() {
        let rules = RuleSet::v2();
        assert_eq!(rules.version(), "v2");
        assert_eq!(rules.rules().len(), RULES_V2.len());
        assert!(rules.address_block().is_some());
        assert!(RuleSet::by_version("v9").is_none());
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let bad = [rule(Field::Cause, r"(unclosed", Cleaner::Line)];
        assert!(RuleSet::compile("broken", &bad, None).is_err());
    }

    #[test]
    fn test_line_cleaner_skips_placeholders() {
        assert_eq!(Cleaner::Line.apply("  \nN/A\nMobile  County\n"), Some("Mobile County".to_string()));
        assert_eq!(Cleaner::Line.apply("Information"), None);
        assert_eq!(Cleaner::Line.apply("Facility Name:"), None);
    }

    #[test]
    fn test_token_cleaner() {
        assert_eq!(Cleaner::Token.apply("AL0049859, issued"), Some("AL0049859".to_string()));
        assert_eq!(Cleaner::Token.apply("   "), None);
    }

    #[test]
    fn test_waterbody_cleaner() {
        let raw = "Creek or River\n\nDrainage Ditch\nFish River\n";
        assert_eq!(Cleaner::Waterbody.apply(raw), Some("Fish River".to_string()));
        assert_eq!(Cleaner::Waterbody.apply("Creek or River\n123"), None);
    }

    #[test]
    fn test_rule_takes_first_usable_match() {
        let set = RuleSet::v2();
        let permittee = set.rules_for(Field::Permittee).next().unwrap();
        let text = "Permittee Information\nPermittee City of Foley\n";
        assert_eq!(permittee.capture(text), Some("City of Foley".to_string()));
    }
}
