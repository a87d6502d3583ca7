//! Dataset writers.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use sso_core::SsoRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One row per record, fixed columns
    Csv,
    /// Array of full records, including raw captures
    Json,
}

/// CSV column order.
pub const CSV_COLUMNS: [&str; 19] = [
    "report_id",
    "org_id",
    "org_name",
    "facility",
    "county",
    "began_at",
    "stopped_at",
    "volume_gallons",
    "est_volume_raw",
    "est_volume_is_range",
    "est_volume_range_label",
    "receiving_water",
    "latitude",
    "longitude",
    "destination",
    "cause",
    "cause_category",
    "location_desc",
    "source_file",
];

fn timestamp(value: Option<NaiveDateTime>) -> String {
    value
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn csv_row(record: &SsoRecord) -> [String; 19] {
    [
        record.report_id.clone(),
        text(&record.org_id),
        text(&record.org_name),
        text(&record.sewer_system),
        text(&record.county),
        timestamp(record.began_at),
        timestamp(record.stopped_at),
        record.volume_gallons.map(|v| v.to_string()).unwrap_or_default(),
        text(&record.est_volume_raw),
        record.est_volume_is_range.to_string(),
        text(&record.est_volume_range_label),
        text(&record.receiving_water),
        record.y.map(|v| v.to_string()).unwrap_or_default(),
        record.x.map(|v| v.to_string()).unwrap_or_default(),
        text(&record.destination),
        text(&record.cause),
        record.cause_category.to_string(),
        text(&record.location_desc),
        record.source_file.clone(),
    ]
}

pub fn format_csv(records: &[SsoRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_COLUMNS)?;
    for record in records {
        wtr.write_record(csv_row(record))?;
    }
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_records(records: &[SsoRecord], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Csv => format_csv(records),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
    }
}

/// Write the dataset, creating the parent directory if needed.
pub fn write_records(path: &Path, records: &[SsoRecord], format: OutputFormat) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_records(records, format)?)?;
    Ok(())
}
