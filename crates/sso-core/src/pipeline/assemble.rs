//! Record assembly: raw field map to canonical record.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Diagnostic;
use crate::extract::rules::{
    classify_cause, lookup_alias, normalize_receiving_water, parse_timestamp, parse_volume,
    resolve_volume_text, NameCanonicalizer,
};
use crate::models::{Field, RawFieldMap, SsoRecord};

/// Per-document facts that do not come from the field map.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    /// File name relative to the batch input directory.
    pub source_file: String,
    /// Hex SHA-256 of the source file name and document text.
    pub content_hash: String,
    /// Page footer submission stamp.
    pub submitted_at: Option<NaiveDateTime>,
}

impl DocumentMeta {
    pub fn new(source_file: impl Into<String>, text: &str) -> Self {
        let source_file = source_file.into();
        let mut hasher = Sha256::new();
        hasher.update(source_file.as_bytes());
        hasher.update(text.as_bytes());
        Self {
            source_file,
            content_hash: hex::encode(hasher.finalize()),
            submitted_at: None,
        }
    }

    pub fn with_submitted_at(mut self, submitted_at: Option<NaiveDateTime>) -> Self {
        self.submitted_at = submitted_at;
        self
    }

    /// Deterministic id for reports that carry none.
    pub fn synthetic_id(&self) -> String {
        format!("NOID-{}", &self.content_hash[..12])
    }
}

/// An assembled record with what the later stages need alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct Assembly {
    pub record: SsoRecord,
    /// Footer stamp; orders duplicate submissions.
    pub submitted_at: Option<NaiveDateTime>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds canonical records from field maps.
pub struct RecordAssembler {
    names: Arc<NameCanonicalizer>,
}

impl RecordAssembler {
    pub fn new(names: Arc<NameCanonicalizer>) -> Self {
        Self { names }
    }

    /// Assemble one record. Never fails; unusable values become `None` and
    /// are reported as diagnostics.
    pub fn assemble(&self, fields: &RawFieldMap, meta: &DocumentMeta) -> Assembly {
        let mut diagnostics = Vec::new();
        let mut coerced = |field: Field, value: &str| {
            warn!("{}: could not coerce {} from {:?}", meta.source_file, field, value);
            diagnostics.push(Diagnostic::AssemblyCoercionFailed {
                field: field.to_string(),
                value: value.to_string(),
            });
        };

        let report_id = fields.get(Field::ReportId).and_then(|raw| {
            let id = normalize_report_id(raw);
            if id.is_none() {
                coerced(Field::ReportId, raw);
            }
            id
        });
        let mut record = match report_id {
            Some(id) => SsoRecord::new(id, meta.source_file.clone()),
            None => {
                let mut record = SsoRecord::new(meta.synthetic_id(), meta.source_file.clone());
                record.report_id_synthetic = true;
                record
            }
        };

        record.org_id = fields.get(Field::PermitNumber).map(str::to_string);
        record.org_name = match fields.get(Field::Permittee) {
            Some(name) => self.names.canonicalize(name),
            None => record
                .org_id
                .as_deref()
                .and_then(lookup_alias)
                .map(str::to_string),
        };
        record.sewer_system = fields.get(Field::FacilityName).map(str::to_string);
        record.county = fields
            .get(Field::County)
            .or(fields.get(Field::FacilityCounty))
            .map(str::to_string);
        record.location_desc = fields.get(Field::LocationDesc).map(str::to_string);

        record.began_at = fields.get(Field::Started).and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                coerced(Field::Started, raw);
            }
            parsed
        });
        record.stopped_at = fields.get(Field::Stopped).and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                coerced(Field::Stopped, raw);
            }
            parsed
        });

        let volume_text = resolve_volume_text(fields.get(Field::Volume), fields.get(Field::VolumeRange));
        let estimate = parse_volume(volume_text);
        record.volume_gallons = estimate.gallons;
        record.est_volume_raw = volume_text.map(str::to_string);
        record.est_volume_is_range = estimate.is_range;
        record.est_volume_range_label = estimate.label.clone();

        record.cause = fields.get(Field::Cause).map(str::to_string);
        record.cause_category = classify_cause(record.cause.as_deref());
        record.destination = fields.get(Field::Destination).map(str::to_string);
        record.receiving_water = normalize_receiving_water(fields.get(Field::ReceivingWater));

        record.y = fields.get(Field::Latitude).and_then(|raw| {
            let parsed = parse_coordinate(raw, 90.0);
            if parsed.is_none() {
                coerced(Field::Latitude, raw);
            }
            parsed
        });
        record.x = fields.get(Field::Longitude).and_then(|raw| {
            let parsed = parse_coordinate(raw, 180.0);
            if parsed.is_none() {
                coerced(Field::Longitude, raw);
            }
            parsed
        });

        record.raw = fields.to_raw();

        if let Some(raw) = volume_text.filter(|_| estimate.is_unrecognized()) {
            diagnostics.push(Diagnostic::VolumeUnrecognized {
                raw: raw.to_string(),
            });
        }
        for field in Field::CRITICAL {
            let absent = match field {
                Field::ReportId => record.report_id_synthetic,
                Field::Volume => volume_text.is_none(),
                _ => !fields.contains(field),
            };
            if absent {
                diagnostics.push(missing(field));
            }
        }

        debug!(
            "Assembled {} from {} with {} diagnostics",
            record.report_id,
            meta.source_file,
            diagnostics.len()
        );

        Assembly {
            record,
            submitted_at: meta.submitted_at,
            diagnostics,
        }
    }
}

fn missing(field: Field) -> Diagnostic {
    Diagnostic::FieldMissing {
        field: field.to_string(),
    }
}

/// `SSO-<digits>` from a captured id such as `20417` or `sso - 20417`.
fn normalize_report_id(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then(|| format!("SSO-{}", digits))
}

fn parse_coordinate(raw: &str, limit: f64) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}
