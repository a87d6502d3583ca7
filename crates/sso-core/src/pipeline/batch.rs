//! Batch driver: documents in, deduplicated and disambiguated records out.
//!
//! Per-document work ([`Pipeline::process_document`]) is independent and may
//! run on any number of threads. [`Pipeline::finish`] is the single barrier
//! where dedup, disambiguation, QA, and the summary see the whole batch.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::acquisition::{AcquiredText, Document, TextAcquirer};
use crate::error::{panic_message, AcquisitionError, DiagnosticKind, Result, SsoError};
use crate::extract::rules::{NameCanonicalizer, RuleSet};
use crate::extract::{ExtractionResult, ReportParser, RuleBasedParser};
use crate::models::{SsoConfig, SsoRecord};

use super::assemble::{Assembly, DocumentMeta, RecordAssembler};
use super::dedup::dedupe_keep_newest;
use super::disambiguate::{disambiguate_waterways, waterway_key, TagDeriver};
use super::qa::{run_basic_qa, QaIssue};

/// What became of one document.
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Assembled(Assembly),
    Skipped(AcquisitionError),
}

/// Everything a single document produced, for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub acquired: AcquiredText,
    pub extraction: ExtractionResult,
    pub assembly: Assembly,
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Documents seen.
    pub scanned: usize,
    /// Documents excluded, with the reason for each.
    pub skipped: Vec<AcquisitionError>,
    /// Records produced before dedup.
    pub assembled: usize,
    /// Records after dedup.
    pub kept: usize,
    /// Assembled records lacking a report id, start time, or volume.
    pub missing_critical: usize,
    pub diagnostics: BTreeMap<DiagnosticKind, usize>,
    /// Distinct waterway names that received organization tags.
    pub waterways_disambiguated: usize,
}

/// Result of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutput {
    pub records: Vec<SsoRecord>,
    pub summary: BatchSummary,
    pub issues: Vec<QaIssue>,
}

fn tagged_waterways(records: &[SsoRecord]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|r| r.receiving_water_raw.as_deref())
        .filter_map(waterway_key)
        .collect()
}

/// Configured end-to-end pipeline.
pub struct Pipeline {
    acquirer: TextAcquirer,
    parser: RuleBasedParser,
    assembler: RecordAssembler,
    tags: TagDeriver,
    dedupe: bool,
    disambiguate: bool,
}

impl Pipeline {
    /// Build from configuration. The OCR fallback is attached when enabled
    /// and its models load; otherwise low-text documents are skipped.
    pub fn from_config(config: &SsoConfig) -> Result<Self> {
        let rules = RuleSet::by_version(&config.extraction.rule_set).ok_or_else(|| {
            SsoError::Config(format!("unknown rule set: {}", config.extraction.rule_set))
        })?;
        let parser = RuleBasedParser::new()
            .with_rules(rules)
            .with_address_fallback(config.extraction.address_fallback);

        #[allow(unused_mut)]
        let mut acquirer = TextAcquirer::from_config(&config.acquisition);
        #[cfg(feature = "native")]
        if config.acquisition.enable_ocr {
            match crate::acquisition::PdfOcrFallback::from_config(&config.ocr) {
                Ok(fallback) => acquirer = acquirer.with_fallback(Arc::new(fallback)),
                Err(e) => warn!("OCR fallback unavailable: {}", e),
            }
        }

        let ttl = config.pipeline.name_cache_ttl();
        Ok(Self {
            acquirer,
            parser,
            assembler: RecordAssembler::new(Arc::new(NameCanonicalizer::new(ttl))),
            tags: TagDeriver::new(ttl),
            dedupe: config.pipeline.dedupe,
            disambiguate: config.pipeline.disambiguate,
        })
    }

    /// Replace the text acquirer.
    pub fn with_acquirer(mut self, acquirer: TextAcquirer) -> Self {
        self.acquirer = acquirer;
        self
    }

    pub fn has_ocr(&self) -> bool {
        self.acquirer.has_fallback()
    }

    /// Acquire, extract, and assemble one document, keeping every stage's
    /// output.
    pub fn inspect(&self, doc: &Document) -> std::result::Result<DocumentReport, AcquisitionError> {
        let acquired = self.acquirer.acquire(doc)?;
        let extraction = self.parser.parse(&acquired.text);
        let meta = DocumentMeta::new(doc.name.as_str(), &acquired.text)
            .with_submitted_at(extraction.submitted_at);
        let assembly = self.assembler.assemble(&extraction.fields, &meta);
        Ok(DocumentReport {
            acquired,
            extraction,
            assembly,
        })
    }

    /// Run the per-document stages. Never fails or unwinds; unreadable
    /// documents come back as [`DocumentOutcome::Skipped`].
    pub fn process_document(&self, doc: &Document) -> DocumentOutcome {
        let inspected = panic::catch_unwind(AssertUnwindSafe(|| self.inspect(doc)))
            .unwrap_or_else(|payload| {
                Err(AcquisitionError::Unreadable {
                    document: doc.name.clone(),
                    detail: format!("processing panicked: {}", panic_message(payload.as_ref())),
                })
            });
        match inspected {
            Ok(report) => {
                info!(
                    "{}: {} ({} fields, {} diagnostics)",
                    doc.name,
                    report.assembly.record.report_id,
                    report.extraction.fields.len(),
                    report.assembly.diagnostics.len()
                );
                DocumentOutcome::Assembled(report.assembly)
            }
            Err(e) => {
                warn!("Skipping {}: {}", e.document(), e);
                DocumentOutcome::Skipped(e)
            }
        }
    }

    /// Batch-wide stages over every document's outcome.
    pub fn finish(&self, outcomes: Vec<DocumentOutcome>) -> BatchOutput {
        let mut summary = BatchSummary {
            scanned: outcomes.len(),
            ..Default::default()
        };

        let mut assemblies = Vec::new();
        for outcome in outcomes {
            match outcome {
                DocumentOutcome::Assembled(assembly) => assemblies.push(assembly),
                DocumentOutcome::Skipped(e) => summary.skipped.push(e),
            }
        }

        summary.assembled = assemblies.len();
        for assembly in &assemblies {
            if assembly.record.missing_critical() {
                summary.missing_critical += 1;
            }
            for diagnostic in &assembly.diagnostics {
                *summary.diagnostics.entry(diagnostic.kind()).or_default() += 1;
            }
        }

        let kept = if self.dedupe {
            dedupe_keep_newest(assemblies)
        } else {
            assemblies
        };
        let mut records: Vec<SsoRecord> = kept.into_iter().map(|a| a.record).collect();
        summary.kept = records.len();

        if self.disambiguate {
            let before = tagged_waterways(&records);
            records = disambiguate_waterways(records, &self.tags);
            summary.waterways_disambiguated =
                tagged_waterways(&records).difference(&before).count();
        }

        let issues = run_basic_qa(&records);

        info!(
            "Batch done: {} scanned, {} skipped, {} kept, {} QA issues",
            summary.scanned,
            summary.skipped.len(),
            summary.kept,
            issues.len()
        );

        BatchOutput {
            records,
            summary,
            issues,
        }
    }

    /// Sequential convenience over [`process_document`](Self::process_document)
    /// and [`finish`](Self::finish).
    pub fn run(&self, docs: &[Document]) -> BatchOutput {
        let outcomes = docs.iter().map(|doc| self.process_document(doc)).collect();
        self.finish(outcomes)
    }
}
