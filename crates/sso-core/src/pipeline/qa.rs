//! Per-record data quality checks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::SsoRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        })
    }
}

/// One finding against one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub report_id: String,
}

impl QaIssue {
    fn new(severity: Severity, code: &str, message: impl Into<String>, record: &SsoRecord) -> Self {
        Self {
            severity,
            code: code.to_string(),
            message: message.into(),
            report_id: record.report_id.clone(),
        }
    }
}

/// Volume text that described a range rather than a count.
fn volume_range_text(record: &SsoRecord) -> Option<&str> {
    record
        .est_volume_raw
        .as_deref()
        .filter(|_| record.est_volume_is_range)
}

/// Run every check over every record, in record order.
pub fn run_basic_qa(records: &[SsoRecord]) -> Vec<QaIssue> {
    let mut issues = Vec::new();

    for record in records {
        if record.volume_gallons == Some(0) {
            issues.push(QaIssue::new(Severity::Warning, "ZERO_VOLUME", "Volume is zero", record));
        }
        if record.began_at.is_none() {
            issues.push(QaIssue::new(
                Severity::Warning,
                "MISSING_START_DATE",
                "began_at is missing",
                record,
            ));
        }
        if record.org_name.is_none() {
            issues.push(QaIssue::new(
                Severity::Warning,
                "MISSING_UTILITY",
                "org_name is missing",
                record,
            ));
        }
        if !record.has_geometry() {
            issues.push(QaIssue::new(
                Severity::Warning,
                "MISSING_GEOMETRY",
                "Missing x or y coordinate",
                record,
            ));
        }
        if let (Some(began), Some(stopped)) = (record.began_at, record.stopped_at) {
            if stopped < began {
                issues.push(QaIssue::new(
                    Severity::Warning,
                    "STOP_BEFORE_START",
                    format!("Stopped {} before it began {}", stopped, began),
                    record,
                ));
            }
        }
        if let Some(value) = volume_range_text(record) {
            issues.push(QaIssue::new(
                Severity::Info,
                "VOLUME_RANGE_TEXT",
                format!("Volume given as a range: {}", value),
                record,
            ));
        }
    }

    issues
}
