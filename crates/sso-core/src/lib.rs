//! Core library for sanitary sewer overflow report extraction.
//!
//! This crate provides:
//! - Text acquisition from report PDFs, with an OCR fallback for scans
//! - Rule-table field extraction into a raw field map
//! - Normalization of volumes, organization names, dates, and receiving waters
//! - Record assembly, duplicate collapse, and waterway disambiguation
//! - Batch summary and data-quality checks

pub mod acquisition;
pub mod cache;
pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use acquisition::{
    AcquiredText, Document, OcrFallback, PdfOcrFallback, TextAcquirer, TextLayer, TextOrigin,
};
pub use cache::TtlCache;
pub use error::{AcquisitionError, Diagnostic, DiagnosticKind, Result, SsoError};
pub use extract::rules::{canonicalize_org, parse_volume, NameCanonicalizer, RuleSet, VolumeEstimate};
pub use extract::{ExtractionResult, ReportParser, RuleBasedParser};
pub use models::{CauseCategory, Field, RawFieldMap, SsoConfig, SsoRecord};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::{
    Assembly, BatchOutput, BatchSummary, DocumentMeta, DocumentOutcome, DocumentReport, Pipeline,
    QaIssue, RecordAssembler, TagDeriver,
};
