//! Canonical overflow record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::fields::Field;

/// One sanitary sewer overflow, normalized from a single report document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoRecord {
    /// Report identifier (`SSO-nnnnn`), or a synthetic `NOID-…` id.
    pub report_id: String,
    /// Set when `report_id` was derived from content rather than read.
    #[serde(default)]
    pub report_id_synthetic: bool,

    /// Permit number of the reporting organization.
    pub org_id: Option<String>,
    /// Canonical display name of the reporting organization.
    pub org_name: Option<String>,
    /// Facility / collection system name.
    pub sewer_system: Option<String>,
    pub county: Option<String>,
    pub location_desc: Option<String>,

    pub began_at: Option<NaiveDateTime>,
    pub stopped_at: Option<NaiveDateTime>,

    /// Estimated gallons; the upper bound for bucketed ranges.
    pub volume_gallons: Option<u64>,
    pub est_volume_raw: Option<String>,
    pub est_volume_is_range: bool,
    pub est_volume_range_label: Option<String>,

    pub cause: Option<String>,
    pub cause_category: CauseCategory,
    pub destination: Option<String>,
    pub receiving_water: Option<String>,
    /// Receiving water before a disambiguation tag was appended.
    pub receiving_water_raw: Option<String>,

    /// Longitude.
    pub x: Option<f64>,
    /// Latitude.
    pub y: Option<f64>,

    /// File name relative to the batch input directory.
    pub source_file: String,

    /// Every captured field as found in the text. Carried for provenance
    /// only; excluded from equality.
    #[serde(default)]
    pub raw: BTreeMap<String, String>,
}

impl SsoRecord {
    /// Empty record for a document; every optional field unset.
    pub fn new(report_id: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            report_id_synthetic: false,
            org_id: None,
            org_name: None,
            sewer_system: None,
            county: None,
            location_desc: None,
            began_at: None,
            stopped_at: None,
            volume_gallons: None,
            est_volume_raw: None,
            est_volume_is_range: false,
            est_volume_range_label: None,
            cause: None,
            cause_category: CauseCategory::Unknown,
            destination: None,
            receiving_water: None,
            receiving_water_raw: None,
            x: None,
            y: None,
            source_file: source_file.into(),
            raw: BTreeMap::new(),
        }
    }

    /// Whether a disambiguation tag has already been applied.
    pub fn is_tagged(&self) -> bool {
        self.receiving_water_raw.is_some()
    }

    pub fn has_geometry(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Whether any of [`Field::CRITICAL`] has no usable value.
    pub fn missing_critical(&self) -> bool {
        Field::CRITICAL.iter().any(|&field| match field {
            Field::ReportId => self.report_id_synthetic,
            Field::Started => self.began_at.is_none(),
            Field::Volume => self.volume_gallons.is_none(),
            _ => false,
        })
    }
}

impl PartialEq for SsoRecord {
    fn eq(&self, other: &Self) -> bool {
        self.report_id == other.report_id
            && self.report_id_synthetic == other.report_id_synthetic
            && self.org_id == other.org_id
            && self.org_name == other.org_name
            && self.sewer_system == other.sewer_system
            && self.county == other.county
            && self.location_desc == other.location_desc
            && self.began_at == other.began_at
            && self.stopped_at == other.stopped_at
            && self.volume_gallons == other.volume_gallons
            && self.est_volume_raw == other.est_volume_raw
            && self.est_volume_is_range == other.est_volume_is_range
            && self.est_volume_range_label == other.est_volume_range_label
            && self.cause == other.cause
            && self.cause_category == other.cause_category
            && self.destination == other.destination
            && self.receiving_water == other.receiving_water
            && self.receiving_water_raw == other.receiving_water_raw
            && self.x == other.x
            && self.y == other.y
            && self.source_file == other.source_file
    }
}

/// Coarse cause classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CauseCategory {
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
    #[serde(rename = "Power Failure")]
    PowerFailure,
    #[serde(rename = "Treatment Plant Failure")]
    TreatmentPlantFailure,
    #[serde(rename = "Lift Station Failure")]
    LiftStationFailure,
    #[serde(rename = "Development Damage")]
    DevelopmentDamage,
    #[serde(rename = "Infrastructure Failure")]
    InfrastructureFailure,
    Other,
    #[default]
    Unknown,
}

impl CauseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CauseCategory::HeavyRain => "Heavy Rain",
            CauseCategory::PowerFailure => "Power Failure",
            CauseCategory::TreatmentPlantFailure => "Treatment Plant Failure",
            CauseCategory::LiftStationFailure => "Lift Station Failure",
            CauseCategory::DevelopmentDamage => "Development Damage",
            CauseCategory::InfrastructureFailure => "Infrastructure Failure",
            CauseCategory::Other => "Other",
            CauseCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
