//! Text acquisition: document bytes to plain text, with an OCR fallback.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AcquisitionError, OcrError, PdfError};
use crate::models::config::AcquisitionConfig;
use crate::ocr::OcrWorker;
use crate::pdf::{looks_like_pdf, PdfExtractor, PdfProcessor};

/// Kind of input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
    /// Report PDF.
    Pdf,
    /// Text already extracted upstream.
    Text,
}

/// One input document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier used in records and logs (file name relative to the batch
    /// input directory).
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
}

impl Document {
    /// Wrap raw bytes; PDFs are recognized by header or extension.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = if looks_like_pdf(&bytes) || name.to_lowercase().ends_with(".pdf") {
            DocumentKind::Pdf
        } else {
            DocumentKind::Text
        };
        Self { name, bytes, kind }
    }

    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: text.into().into_bytes(),
            kind: DocumentKind::Text,
        }
    }

    /// Read a file, naming it with [`document_name`].
    pub fn from_path(path: &Path, root: &Path) -> Result<Self, AcquisitionError> {
        let name = document_name(path, root);
        let bytes = std::fs::read(path).map_err(|e| AcquisitionError::Unreadable {
            document: name.clone(),
            detail: e.to_string(),
        })?;
        Ok(Self::from_bytes(name, bytes))
    }
}

/// `path` relative to `root` with forward slashes, or the whole path when it
/// lies outside `root`.
pub fn document_name(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Primary text source.
pub trait TextLayer: Send + Sync {
    fn extract_text(&self, doc: &Document) -> Result<String, PdfError>;
}

/// Embedded PDF text via lopdf + pdf-extract.
pub struct PdfTextLayer;

impl TextLayer for PdfTextLayer {
    fn extract_text(&self, doc: &Document) -> Result<String, PdfError> {
        PdfExtractor::from_bytes(&doc.bytes)?.extract_text()
    }
}

/// Pre-extracted text documents.
pub struct PlainTextLayer;

impl TextLayer for PlainTextLayer {
    fn extract_text(&self, doc: &Document) -> Result<String, PdfError> {
        Ok(String::from_utf8_lossy(&doc.bytes).into_owned())
    }
}

/// Dispatches on [`DocumentKind`].
pub struct AutoTextLayer;

impl TextLayer for AutoTextLayer {
    fn extract_text(&self, doc: &Document) -> Result<String, PdfError> {
        match doc.kind {
            DocumentKind::Pdf => PdfTextLayer.extract_text(doc),
            DocumentKind::Text => PlainTextLayer.extract_text(doc),
        }
    }
}

/// Image-recognition fallback used when the text layer is unusable.
pub trait OcrFallback: Send + Sync {
    /// Recognize the document's text, giving up after `timeout`.
    fn recognize(&self, doc: &Document, timeout: Duration) -> Result<String, OcrError>;
}

/// OCR over each page's embedded images, run on a dedicated worker thread.
pub struct PdfOcrFallback {
    worker: OcrWorker,
    max_pages: usize,
}

impl PdfOcrFallback {
    pub fn new(worker: OcrWorker, max_pages: usize) -> Self {
        Self { worker, max_pages }
    }

    /// Start a worker with the models named in the configuration.
    #[cfg(feature = "native")]
    pub fn from_config(config: &crate::models::config::OcrConfig) -> Result<Self, OcrError> {
        let engine_config = config.clone();
        let worker = OcrWorker::start(move || {
            crate::ocr::PureOcrEngine::from_config(&engine_config)
                .map(|engine| Box::new(engine) as Box<dyn crate::ocr::ImageRecognizer>)
        })?;
        Ok(Self::new(worker, config.max_pages))
    }
}

impl OcrFallback for PdfOcrFallback {
    fn recognize(&self, doc: &Document, timeout: Duration) -> Result<String, OcrError> {
        if doc.kind != DocumentKind::Pdf {
            return Err(OcrError::NoImages(doc.name.clone()));
        }
        let pdf = PdfExtractor::from_bytes(&doc.bytes)
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        let mut pages = pdf.page_count();
        if self.max_pages > 0 {
            pages = pages.min(self.max_pages as u32);
        }

        let mut images = Vec::new();
        for page in 1..=pages {
            images.extend(
                pdf.extract_images(page)
                    .map_err(|e| OcrError::Recognition(e.to_string()))?,
            );
        }
        if images.is_empty() {
            return Err(OcrError::NoImages(doc.name.clone()));
        }
        self.worker.run(images, timeout)
    }
}

/// Which source produced a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextOrigin {
    TextLayer,
    Ocr,
}

/// Text for one document.
#[derive(Debug, Clone, Serialize)]
pub struct AcquiredText {
    pub text: String,
    pub origin: TextOrigin,
}

/// Text layer first, OCR fallback second, bounded by a timeout.
pub struct TextAcquirer {
    primary: Arc<dyn TextLayer>,
    fallback: Option<Arc<dyn OcrFallback>>,
    min_text_length: usize,
    ocr_timeout: Duration,
}

impl TextAcquirer {
    pub fn new(primary: Arc<dyn TextLayer>) -> Self {
        let defaults = AcquisitionConfig::default();
        Self {
            primary,
            fallback: None,
            min_text_length: defaults.min_text_length,
            ocr_timeout: defaults.ocr_timeout(),
        }
    }

    /// Auto-dispatching text layer, thresholds from configuration, no
    /// fallback.
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(Arc::new(AutoTextLayer))
            .with_min_text_length(config.min_text_length)
            .with_ocr_timeout(config.ocr_timeout())
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn OcrFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_min_text_length(mut self, min: usize) -> Self {
        self.min_text_length = min;
        self
    }

    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout = timeout;
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Produce text for a document.
    ///
    /// Text-layer output is used when its trimmed length reaches
    /// `min_text_length`. Otherwise the fallback runs with the configured
    /// timeout; an error or blank OCR output fails the document.
    pub fn acquire(&self, doc: &Document) -> Result<AcquiredText, AcquisitionError> {
        let reason = match self.primary.extract_text(doc) {
            Ok(text) if text.trim().chars().count() >= self.min_text_length => {
                debug!("{}: using text layer ({} chars)", doc.name, text.len());
                return Ok(AcquiredText {
                    text,
                    origin: TextOrigin::TextLayer,
                });
            }
            Ok(text) if text.trim().is_empty() => "text layer empty".to_string(),
            Ok(text) => format!("text layer too short ({} chars)", text.trim().chars().count()),
            Err(e) => format!("text layer unreadable: {}", e),
        };

        let failed = |detail: String| AcquisitionError::TextAcquisitionFailed {
            document: doc.name.clone(),
            detail,
        };

        let Some(fallback) = self.fallback.as_ref() else {
            return Err(failed(format!("{}; no OCR fallback", reason)));
        };

        info!("{}: {}, running OCR", doc.name, reason);
        match fallback.recognize(doc, self.ocr_timeout) {
            Ok(text) if !text.trim().is_empty() => Ok(AcquiredText {
                text,
                origin: TextOrigin::Ocr,
            }),
            Ok(_) => Err(failed(format!("{}; OCR produced no text", reason))),
            Err(OcrError::Timeout(limit)) => {
                warn!("{}: OCR exceeded {:?}", doc.name, limit);
                Err(failed(format!("{}; OCR timed out after {}s", reason, limit.as_secs())))
            }
            Err(e) => Err(failed(format!("{}; OCR failed: {}", reason, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ocr::ImageRecognizer;
    use lopdf::{dictionary, Object, Stream};

    struct FixedOcr(Result<String, String>);

    impl OcrFallback for FixedOcr {
        fn recognize(&self, _doc: &Document, _timeout: Duration) -> Result<String, OcrError> {
            self.0.clone().map_err(OcrError::Recognition)
        }
    }

    struct ExpiredOcr;

    impl OcrFallback for ExpiredOcr {
        fn recognize(&self, _doc: &Document, timeout: Duration) -> Result<String, OcrError> {
            Err(OcrError::Timeout(timeout))
        }
    }

    /// Reads a fixed report line from any image.
    struct StubRecognizer;

    impl ImageRecognizer for StubRecognizer {
        fn extract_text(&self, image: &image::DynamicImage) -> Result<String, OcrError> {
            Ok(format!("Assigned SSO ID SSO-77 ({}x{} scan)", image.width(), image.height()))
        }
    }

    /// One-page PDF with a 2x2 grayscale image and no text.
    fn scanned_pdf() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0, 64, 128, 255],
        ));
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 200.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn acquirer() -> TextAcquirer {
        TextAcquirer::new(Arc::new(AutoTextLayer)).with_min_text_length(10)
    }

    #[test]
    fn test_text_layer_used_when_long_enough() {
        let doc = Document::from_text("a.txt", "Assigned SSO ID SSO-1234");
        let got = acquirer().acquire(&doc).unwrap();
        assert_eq!(got.origin, TextOrigin::TextLayer);
    }

    #[test]
    fn test_short_text_falls_back_to_ocr() {
        let doc = Document::from_text("a.txt", "  ");
        let got = acquirer()
            .with_fallback(Arc::new(FixedOcr(Ok("recognized text".to_string()))))
            .acquire(&doc)
            .unwrap();
        assert_eq!(got.origin, TextOrigin::Ocr);
        assert_eq!(got.text, "recognized text");
    }

    #[test]
    fn test_failures_are_acquisition_errors() {
        let doc = Document::from_text("empty.txt", "");

        let no_fallback = acquirer().acquire(&doc).unwrap_err();
        assert_eq!(no_fallback.document(), "empty.txt");

        let failing = acquirer()
            .with_fallback(Arc::new(FixedOcr(Err("boom".to_string()))))
            .acquire(&doc)
            .unwrap_err();
        assert!(matches!(failing, AcquisitionError::TextAcquisitionFailed { .. }));

        let blank = acquirer()
            .with_fallback(Arc::new(FixedOcr(Ok("  ".to_string()))))
            .acquire(&doc)
            .unwrap_err();
        assert!(blank.to_string().contains("no text"));
    }

    #[test]
    fn test_fallback_timeout() {
        let doc = Document::from_text("slow.txt", "");
        let err = acquirer()
            .with_fallback(Arc::new(ExpiredOcr))
            .with_ocr_timeout(Duration::from_secs(3))
            .acquire(&doc)
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 3s"));
    }

    #[test]
    fn test_scanned_pdf_goes_through_ocr_worker() {
        let worker = OcrWorker::start(|| Ok(Box::new(StubRecognizer) as Box<dyn ImageRecognizer>)).unwrap();
        let fallback = Arc::new(PdfOcrFallback::new(worker, 0));
        let acquirer = TextAcquirer::new(Arc::new(AutoTextLayer))
            .with_min_text_length(10)
            .with_fallback(fallback.clone());

        let doc = Document::from_bytes("scan.pdf", scanned_pdf());
        assert_eq!(doc.kind, DocumentKind::Pdf);
        let got = acquirer.acquire(&doc).unwrap();
        assert_eq!(got.origin, TextOrigin::Ocr);
        assert_eq!(got.text, "Assigned SSO ID SSO-77 (2x2 scan)");

        let text_doc = Document::from_text("notes.txt", "");
        let err = fallback.recognize(&text_doc, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, OcrError::NoImages(_)));
    }

    #[test]
    fn test_document_kind_detection() {
        assert_eq!(Document::from_bytes("r.PDF", vec![]).kind, DocumentKind::Pdf);
        assert_eq!(Document::from_bytes("r.bin", b"%PDF-1.4".to_vec()).kind, DocumentKind::Pdf);
        assert_eq!(Document::from_bytes("r.txt", b"text".to_vec()).kind, DocumentKind::Text);
    }

    #[test]
    fn test_from_path_names_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("2024");
        std::fs::create_dir(&sub).unwrap();
        let file = sub.join("r1.txt");
        std::fs::write(&file, "hello").unwrap();

        let doc = Document::from_path(&file, dir.path()).unwrap();
        assert_eq!(doc.name, "2024/r1.txt");

        let missing = Document::from_path(&sub.join("nope.txt"), dir.path()).unwrap_err();
        assert!(matches!(missing, AcquisitionError::Unreadable { .. }));
    }
}
