//! Field names captured from report text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A field the rule table knows how to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ReportId,
    PermitNumber,
    Permittee,
    FacilityName,
    FacilityCounty,
    County,
    Source,
    Started,
    Stopped,
    Volume,
    VolumeRange,
    Latitude,
    Longitude,
    StreetAddress,
    City,
    State,
    Zip,
    LocationDesc,
    Cause,
    Destination,
    ReceivingWater,
    SwimmingWater,
    Monitoring,
    Cleaned,
    Disinfected,
    CorrectiveAction,
    PublicNotice,
    SignsDate,
    HealthNotified,
}

impl Field {
    pub const ALL: [Field; 29] = [
        Field::ReportId,
        Field::PermitNumber,
        Field::Permittee,
        Field::FacilityName,
        Field::FacilityCounty,
        Field::County,
        Field::Source,
        Field::Started,
        Field::Stopped,
        Field::Volume,
        Field::VolumeRange,
        Field::Latitude,
        Field::Longitude,
        Field::StreetAddress,
        Field::City,
        Field::State,
        Field::Zip,
        Field::LocationDesc,
        Field::Cause,
        Field::Destination,
        Field::ReceivingWater,
        Field::SwimmingWater,
        Field::Monitoring,
        Field::Cleaned,
        Field::Disinfected,
        Field::CorrectiveAction,
        Field::PublicNotice,
        Field::SignsDate,
        Field::HealthNotified,
    ];

    /// Fields whose absence is reported as a diagnostic.
    pub const CRITICAL: [Field; 3] = [Field::ReportId, Field::Started, Field::Volume];

    /// Fields captured together by the address block pattern.
    pub const ADDRESS_BLOCK: [Field; 5] = [
        Field::StreetAddress,
        Field::City,
        Field::State,
        Field::Zip,
        Field::LocationDesc,
    ];

    /// Stable snake_case key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::ReportId => "report_id",
            Field::PermitNumber => "permit_number",
            Field::Permittee => "permittee",
            Field::FacilityName => "facility_name",
            Field::FacilityCounty => "facility_county",
            Field::County => "county",
            Field::Source => "source",
            Field::Started => "started",
            Field::Stopped => "stopped",
            Field::Volume => "volume",
            Field::VolumeRange => "volume_range",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::StreetAddress => "street_address",
            Field::City => "city",
            Field::State => "state",
            Field::Zip => "zip",
            Field::LocationDesc => "location_desc",
            Field::Cause => "cause",
            Field::Destination => "destination",
            Field::ReceivingWater => "receiving_water",
            Field::SwimmingWater => "swimming_water",
            Field::Monitoring => "monitoring",
            Field::Cleaned => "cleaned",
            Field::Disinfected => "disinfected",
            Field::CorrectiveAction => "corrective_action",
            Field::PublicNotice => "public_notice",
            Field::SignsDate => "signs_date",
            Field::HealthNotified => "health_notified",
        }
    }

    pub fn is_address_part(&self) -> bool {
        Self::ADDRESS_BLOCK.contains(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// Captured raw strings for one document.
///
/// A field that was not found is simply absent; stored values are never
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFieldMap {
    values: BTreeMap<Field, String>,
}

impl RawFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// Store a value, ignoring blank input.
    pub fn insert(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.values.insert(field, trimmed.to_string());
    }

    pub fn remove(&mut self, field: Field) -> Option<String> {
        self.values.remove(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Fields the map does not carry.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.values.contains_key(f))
            .collect()
    }

    /// String-keyed copy, as retained on the record.
    pub fn to_raw(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect()
    }

    /// Rebuild a map from a record's `raw` side channel. Unknown keys are
    /// skipped.
    pub fn from_raw(raw: &BTreeMap<String, String>) -> Self {
        let mut map = Self::new();
        for (key, value) in raw {
            if let Ok(field) = key.parse::<Field>() {
                map.insert(field, value.clone());
            }
        }
        map
    }
}

impl FromIterator<(Field, String)> for RawFieldMap {
    fn from_iter<I: IntoIterator<Item = (Field, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}
