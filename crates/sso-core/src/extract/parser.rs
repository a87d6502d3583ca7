//! Rule-table driven report parser.

use std::time::Instant;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::{Field, RawFieldMap};

use super::rules::{
    footer_timestamp, is_range_text, resolve_receiving_water, Cleaner, RuleSet,
};
use super::ReportParser;

/// Result of field extraction over one document's text.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Captured raw strings.
    pub fields: RawFieldMap,
    /// Last page footer stamp, used only to order duplicate submissions.
    pub submitted_at: Option<NaiveDateTime>,
    /// Version of the rule table that produced `fields`.
    pub rule_set: String,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    pub fn missing(&self) -> Vec<Field> {
        self.fields.missing()
    }
}

/// Parser applying an ordered [`RuleSet`] to report text.
pub struct RuleBasedParser {
    rules: &'static RuleSet,
    /// Whether address fields fall back to their own rules when the block
    /// pattern misses.
    address_fallback: bool,
}

impl RuleBasedParser {
    /// Create a parser over the current rule table.
    pub fn new() -> Self {
        Self {
            rules: RuleSet::v2(),
            address_fallback: true,
        }
    }

    /// Use a different rule table.
    pub fn with_rules(mut self, rules: &'static RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Set address fallback.
    pub fn with_address_fallback(mut self, enabled: bool) -> Self {
        self.address_fallback = enabled;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        self.rules
    }

    /// Returns whether the block matched.
    fn extract_address_block(&self, text: &str, fields: &mut RawFieldMap) -> bool {
        let Some(caps) = self.rules.address_block().and_then(|re| re.captures(text)) else {
            return false;
        };
        for (i, field) in Field::ADDRESS_BLOCK.iter().enumerate() {
            if let Some(value) = caps.get(i + 1).and_then(|m| Cleaner::Collapse.apply(m.as_str())) {
                fields.insert(*field, value);
            }
        }
        debug!("Address block matched");
        true
    }

    fn apply_rules(&self, text: &str, fields: &mut RawFieldMap, block_hit: bool) {
        for rule in self.rules.rules() {
            if fields.contains(rule.field) || rule.field == Field::VolumeRange {
                continue;
            }
            if rule.field.is_address_part() && !block_hit && !self.address_fallback {
                continue;
            }
            if let Some(value) = rule.capture(text) {
                debug!("Rule hit: {} = {:?}", rule.field, value);
                fields.insert(rule.field, value);
            }
        }
    }

    /// The range field is only consulted when the primary volume is absent
    /// or is itself range text.
    fn apply_volume_range(&self, text: &str, fields: &mut RawFieldMap) {
        if fields.get(Field::Volume).is_some_and(|v| !is_range_text(v)) {
            return;
        }
        if let Some(value) = self
            .rules
            .rules_for(Field::VolumeRange)
            .find_map(|rule| rule.capture(text))
        {
            debug!("Rule hit: {} = {:?}", Field::VolumeRange, value);
            fields.insert(Field::VolumeRange, value);
        }
    }
}

impl Default for RuleBasedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser for RuleBasedParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut fields = RawFieldMap::new();

        let block_hit = self.extract_address_block(text, &mut fields);
        self.apply_rules(text, &mut fields, block_hit);
        self.apply_volume_range(text, &mut fields);

        if let Some(water) = resolve_receiving_water(
            fields.get(Field::ReceivingWater),
            fields.get(Field::Destination),
        ) {
            fields.insert(Field::ReceivingWater, water);
        }

        let submitted_at = footer_timestamp(text);
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Extracted {} of {} fields with rule set {} in {}ms",
            fields.len(),
            Field::ALL.len(),
            self.rules.version(),
            processing_time_ms
        );

        ExtractionResult {
            fields,
            submitted_at,
            rule_set: self.rules.version().to_string(),
            processing_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"
SSO Event - Information
Permit Number AL0049859
Permittee
Baldwin County Sewer Service, LLC
Facility Name Eastern Shore Collection System Facility County Baldwin
Assigned SSO ID SSO-20417
Date/Time SSO Event Started: Date Time 03/14/2024 07:30 AM
Date/Time SSO Event Stopped: Date Time 03/14/2024 11:15 AM
Estimated Volume Discharged (in gallons) 2,500
Estimated Volume Discharged (Range) 1,000 < gallons <= 10,000
Indicate source of discharge event Manhole County in which the discharge occurred Baldwin
Latitude/Longitude of discharge 30.6035, -87.9036
Street Address 123 Main St
City Daphne, State AL ZIP Code 36526
Location Description Manhole behind the library
Known or suspected cause of the discharge Heavy rain and inflow
Destination of discharge Creek or River
Note: attach a map if available.
Provide the first named creek or river that receives the flow.
Creek or River
D'Olive Creek
Did the discharge reach a swimming area? No
Describe corrective actions taken
Area cleaned and limed
Please attach any photos.
Indicate efforts to notify the public
Signs posted at the creek
Date signs were placed: 03/14/2024
County Health Department notification date: 03/15/2024
3/15/2024 10:22:11 AM
"#;

    #[test]
    fn test_parse_full_report() {
        let result = RuleBasedParser::new().parse(REPORT);
        let f = &result.fields;

        assert_eq!(f.get(Field::ReportId), Some("20417"));
        assert_eq!(f.get(Field::PermitNumber), Some("AL0049859"));
        assert_eq!(f.get(Field::Permittee), Some("Baldwin County Sewer Service, LLC"));
        assert_eq!(f.get(Field::FacilityName), Some("Eastern Shore Collection System"));
        assert_eq!(f.get(Field::FacilityCounty), Some("Baldwin"));
        assert_eq!(f.get(Field::County), Some("Baldwin"));
        assert_eq!(f.get(Field::Source), Some("Manhole"));
        assert_eq!(f.get(Field::Started), Some("03/14/2024 07:30 AM"));
        assert_eq!(f.get(Field::Stopped), Some("03/14/2024 11:15 AM"));
        assert_eq!(f.get(Field::Volume), Some("2,500"));
        assert_eq!(f.get(Field::VolumeRange), None);
        assert_eq!(f.get(Field::Latitude), Some("30.6035"));
        assert_eq!(f.get(Field::Longitude), Some("-87.9036"));
        assert_eq!(f.get(Field::StreetAddress), Some("123 Main St"));
        assert_eq!(f.get(Field::City), Some("Daphne"));
        assert_eq!(f.get(Field::State), Some("AL"));
        assert_eq!(f.get(Field::Zip), Some("36526"));
        assert_eq!(f.get(Field::LocationDesc), Some("Manhole behind the library"));
        assert_eq!(f.get(Field::Cause), Some("Heavy rain and inflow"));
        assert_eq!(f.get(Field::Destination), Some("Creek or River"));
        assert_eq!(f.get(Field::ReceivingWater), Some("D'Olive Creek"));
        assert_eq!(f.get(Field::SwimmingWater), Some("No"));
        assert_eq!(f.get(Field::CorrectiveAction), Some("Area cleaned and limed"));
        assert_eq!(f.get(Field::PublicNotice), Some("Signs posted at the creek"));
        assert_eq!(f.get(Field::SignsDate), Some("03/14/2024"));
        assert_eq!(f.get(Field::HealthNotified), Some("03/15/2024"));

        assert_eq!(
            result.submitted_at.map(|t| t.to_string()).as_deref(),
            Some("2024-03-15 10:22:11")
        );
        assert_eq!(result.rule_set, "v2");
    }

    #[test]
    fn test_range_replaces_placeholder_volume() {
        let text = "Estimated Volume Discharged (in gallons) < 1,000\n\
                    Estimated Volume Discharged (Range) 1,000 < gallons <= 10,000\n";
        let fields = RuleBasedParser::new().parse(text).fields;
        assert_eq!(fields.get(Field::Volume), Some("< 1,000"));
        assert_eq!(fields.get(Field::VolumeRange), Some("1,000 < gallons <= 10,000"));
    }

    #[test]
    fn test_range_used_when_volume_missing() {
        let text = "Estimated Volume Discharged (in gallons)\n\
                    Estimated Volume Discharged (Range) 10,000 < gallons <= 25,000\n";
        let fields = RuleBasedParser::new().parse(text).fields;
        assert_eq!(fields.get(Field::Volume), None);
        assert_eq!(fields.get(Field::VolumeRange), Some("10,000 < gallons <= 25,000"));
    }

    #[test]
    fn test_address_fields_fall_back_independently() {
        let text = "Street Address 9 Bay Rd\nCity Fairhope\nZIP Code 36532\n";
        let fields = RuleBasedParser::new().parse(text).fields;
        assert_eq!(fields.get(Field::StreetAddress), Some("9 Bay Rd"));
        assert_eq!(fields.get(Field::City), Some("Fairhope"));
        assert_eq!(fields.get(Field::Zip), Some("36532"));
        assert_eq!(fields.get(Field::State), None);

        let strict = RuleBasedParser::new().with_address_fallback(false).parse(text).fields;
        assert_eq!(strict.get(Field::City), None);
    }

    #[test]
    fn test_ground_absorbed_destination() {
        let text = "Destination of discharge Ground Absorbed\nNote: none\n\
                    Provide the first named creek or river that receives the flow.\nN/A\n";
        let fields = RuleBasedParser::new().parse(text).fields;
        assert_eq!(fields.get(Field::ReceivingWater), Some("Ground absorbed"));
    }

    #[test]
    fn test_receiving_water_falls_back_to_destination() {
        let text = "Destination of discharge Storm drain to Mill Creek\nNote: x\n";
        let fields = RuleBasedParser::new().parse(text).fields;
        assert_eq!(fields.get(Field::ReceivingWater), Some("Storm drain to Mill Creek"));
    }

    #[test]
    fn test_empty_text() {
        let result = RuleBasedParser::new().parse("");
        assert!(result.fields.is_empty());
        assert_eq!(result.submitted_at, None);
        assert_eq!(result.missing().len(), Field::ALL.len());
    }
}
