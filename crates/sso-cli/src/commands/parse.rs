//! Parse command - extract every report under a directory into one dataset.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::{glob_with, MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use sso_core::pipeline::{BatchSummary, DocumentOutcome, QaIssue, Severity};
use sso_core::acquisition::document_name;
use sso_core::{AcquisitionError, Document, Pipeline};

use super::load_config;
use super::output::{write_records, OutputFormat};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Directory of report files (searched recursively for .pdf and .txt)
    #[arg(required = true)]
    input_dir: PathBuf,

    /// Output dataset file
    #[arg(short, long)]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Number of parallel workers (default: config, then CPU count)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Write batch summary and QA issues as JSON to this path
    #[arg(long)]
    status: Option<PathBuf>,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Use only the text layer; skip documents without one
    #[arg(long)]
    no_ocr: bool,
}

/// Status file contents.
#[derive(Serialize)]
struct StatusReport<'a> {
    generated_at: String,
    input_dir: String,
    output: String,
    summary: &'a BatchSummary,
    issues: &'a [QaIssue],
}

/// Report files under `dir`, sorted by path. Extensions match in any case.
fn collect_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let root = Pattern::escape(&dir.to_string_lossy());
    let mut files = Vec::new();
    for ext in ["pdf", "txt"] {
        let pattern = format!("{}/**/*.{}", root, ext);
        files.extend(
            glob_with(&pattern, options)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file()),
        );
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn worker_count(requested: Option<usize>, configured: usize) -> usize {
    match requested.filter(|&j| j > 0) {
        Some(j) => j,
        None if configured > 0 => configured,
        None => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.no_ocr {
        config.acquisition.enable_ocr = false;
    }
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }

    if !args.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input_dir.display());
    }

    let files = collect_files(&args.input_dir)?;
    if files.is_empty() {
        anyhow::bail!("No report files found under {}", args.input_dir.display());
    }

    let pipeline = Arc::new(Pipeline::from_config(&config)?);
    if config.acquisition.enable_ocr && !pipeline.has_ocr() {
        println!(
            "{} OCR models not found in {}; scanned reports will be skipped",
            style("!").yellow(),
            config.ocr.model_dir.display()
        );
    }

    let jobs = worker_count(args.jobs, config.pipeline.jobs);
    println!(
        "{} Found {} files to process ({} workers)",
        style("ℹ").blue(),
        files.len(),
        jobs
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let root = Arc::new(args.input_dir.clone());
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        let root = root.clone();
        let pb = pb.clone();
        let name = document_name(&path, &root);

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = match Document::from_path(&path, &root) {
                Ok(doc) => pipeline.process_document(&doc),
                Err(e) => {
                    warn!("Skipping {}: {}", e.document(), e);
                    DocumentOutcome::Skipped(e)
                }
            };
            pb.inc(1);
            outcome
        });
        handles.push((name, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = handle.await.unwrap_or_else(|e| {
            warn!("Worker for {} failed: {}", name, e);
            DocumentOutcome::Skipped(AcquisitionError::Unreadable {
                document: name,
                detail: format!("worker failed: {}", e),
            })
        });
        outcomes.push(outcome);
    }
    pb.finish_and_clear();

    let batch = pipeline.finish(outcomes);

    write_records(&args.output, &batch.records, args.format)?;
    info!("Wrote {} records to {}", batch.records.len(), args.output.display());

    if let Some(status_path) = &args.status {
        let report = StatusReport {
            generated_at: Local::now().to_rfc3339(),
            input_dir: args.input_dir.display().to_string(),
            output: args.output.display().to_string(),
            summary: &batch.summary,
            issues: &batch.issues,
        };
        if let Some(parent) = status_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(status_path, serde_json::to_string_pretty(&report)?)?;
        debug!("Wrote status to {}", status_path.display());
    }

    print_summary(&batch.summary, &batch.issues);
    println!(
        "{} Wrote {} records to {} in {:.1?}",
        style("✓").green(),
        batch.records.len(),
        args.output.display(),
        start.elapsed()
    );

    Ok(())
}

fn print_summary(summary: &BatchSummary, issues: &[QaIssue]) {
    println!();
    println!(
        "   {} scanned, {} assembled, {} kept, {} skipped",
        summary.scanned,
        style(summary.assembled).green(),
        style(summary.kept).green(),
        style(summary.skipped.len()).red()
    );
    println!(
        "   {} missing a critical field, {} waterway names disambiguated",
        style(summary.missing_critical).yellow(),
        summary.waterways_disambiguated
    );

    if !summary.diagnostics.is_empty() {
        let counts: Vec<String> = summary
            .diagnostics
            .iter()
            .map(|(kind, n)| format!("{:?}: {}", kind, n))
            .collect();
        println!("   diagnostics: {}", counts.join(", "));
    }

    let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();
    println!(
        "   QA: {} warnings, {} info",
        style(count(Severity::Warning)).yellow(),
        count(Severity::Info)
    );

    if !summary.skipped.is_empty() {
        println!();
        println!("{}", style("Skipped documents:").red());
        for skipped in &summary.skipped {
            println!("  - {}", skipped);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(Some(3), 8), 3);
        assert_eq!(worker_count(None, 8), 8);
        assert_eq!(worker_count(Some(0), 2), 2);
        assert!(worker_count(None, 0) >= 1);
    }

    #[test]
    fn test_collect_files_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2024")).unwrap();
        fs::write(dir.path().join("b.txt"), "x").unwrap();
        fs::write(dir.path().join("2024").join("a.pdf"), "x").unwrap();
        fs::write(dir.path().join("notes.md"), "x").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| document_name(p, dir.path())).collect();
        assert_eq!(names, vec!["2024/a.pdf", "b.txt"]);
    }

    #[test]
    fn test_collect_files_ignores_extension_case_and_escapes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("reports [2024]");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("r1.Pdf"), "x").unwrap();
        fs::write(root.join("r2.TXT"), "x").unwrap();
        fs::write(root.join("r3.pdf"), "x").unwrap();

        let files = collect_files(&root).unwrap();
        let mut names: Vec<String> = files
            .iter()
            .map(|p| document_name(p, &root).to_lowercase())
            .collect();
        names.sort();
        assert_eq!(names, vec!["r1.pdf", "r2.txt", "r3.pdf"]);
    }
}
