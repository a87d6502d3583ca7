//! Error types for the sso-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the sso library.
#[derive(Error, Debug)]
pub enum SsoError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Neither the text layer nor the fallback produced text.
    #[error("text acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Rule table failed to compile.
    #[error("rule error: {0}")]
    Rule(#[from] regex::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Document had nothing to recognize.
    #[error("no images to recognize: {0}")]
    NoImages(String),

    /// Recognition did not finish in time.
    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(std::time::Duration),
}

/// Why a document could not be turned into text.
///
/// Any of these excludes the document from the batch; the batch itself
/// always continues.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AcquisitionError {
    /// Primary text was unusable and no fallback text was obtained.
    #[error("text acquisition failed for {document}: {detail}")]
    TextAcquisitionFailed { document: String, detail: String },

    /// The document could not be read at all.
    #[error("failed to read {document}: {detail}")]
    Unreadable { document: String, detail: String },
}

impl AcquisitionError {
    /// Identifier of the document that failed.
    pub fn document(&self) -> &str {
        match self {
            Self::TextAcquisitionFailed { document, .. }
            | Self::Unreadable { document, .. } => document,
        }
    }
}

/// Non-fatal problems found while extracting or assembling one document.
///
/// These never abort anything: the affected field degrades to `None` and
/// the diagnostic is counted in the batch summary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Expected field absent from the document.
    #[error("missing field: {field}")]
    FieldMissing { field: String },

    /// Volume text matched no numeric or bucket pattern.
    #[error("unrecognized volume text: {raw}")]
    VolumeUnrecognized { raw: String },

    /// A typed field could not be parsed.
    #[error("could not coerce {field} from {value:?}")]
    AssemblyCoercionFailed { field: String, value: String },
}

impl Diagnostic {
    /// Stable label used for counting.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::FieldMissing { .. } => DiagnosticKind::FieldMissing,
            Self::VolumeUnrecognized { .. } => DiagnosticKind::VolumeUnrecognized,
            Self::AssemblyCoercionFailed { .. } => DiagnosticKind::AssemblyCoercionFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    FieldMissing,
    VolumeUnrecognized,
    AssemblyCoercionFailed,
}

/// Message carried by a caught panic.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Result type for the sso library.
pub type Result<T> = std::result::Result<T, SsoError>;
