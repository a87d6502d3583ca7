//! Inspect command - show extraction results for one report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Args;
use serde::Serialize;
use tracing::info;

use sso_core::acquisition::TextOrigin;
use sso_core::{Diagnostic, Document, Pipeline, SsoRecord};

use super::load_config;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Report file (PDF or pre-extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Use only the text layer
    #[arg(long)]
    no_ocr: bool,

    /// Include the acquired text in the output
    #[arg(long)]
    show_text: bool,
}

#[derive(Serialize)]
struct Inspection {
    document: String,
    origin: TextOrigin,
    rule_set: String,
    fields: BTreeMap<String, String>,
    missing: Vec<String>,
    submitted_at: Option<NaiveDateTime>,
    record: SsoRecord,
    diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

pub async fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if args.no_ocr {
        config.acquisition.enable_ocr = false;
    }
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Inspecting {}", args.input.display());
    let root = args.input.parent().map(PathBuf::from).unwrap_or_default();
    let doc = Document::from_path(&args.input, &root)?;

    let pipeline = Pipeline::from_config(&config)?;
    let report = tokio::task::spawn_blocking(move || pipeline.inspect(&doc)).await??;

    let inspection = Inspection {
        document: report.assembly.record.source_file.clone(),
        origin: report.acquired.origin,
        rule_set: report.extraction.rule_set.clone(),
        fields: report.extraction.fields.to_raw(),
        missing: report
            .extraction
            .missing()
            .iter()
            .map(|f| f.to_string())
            .collect(),
        submitted_at: report.extraction.submitted_at,
        record: report.assembly.record,
        diagnostics: report.assembly.diagnostics,
        text: args.show_text.then_some(report.acquired.text),
    };

    println!("{}", serde_json::to_string_pretty(&inspection)?);
    Ok(())
}
