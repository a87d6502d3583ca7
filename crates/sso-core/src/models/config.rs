//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the sso pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsoConfig {
    /// Text acquisition configuration.
    pub acquisition: AcquisitionConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch pipeline configuration.
    pub pipeline: PipelineConfig,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            ocr: OcrConfig::default(),
            extraction: ExtractionConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Text acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Minimum trimmed text length to accept the text layer without OCR.
    pub min_text_length: usize,

    /// Per-document budget for the OCR fallback, in seconds.
    pub ocr_timeout_secs: u64,

    /// Run the OCR fallback when the text layer is unusable.
    pub enable_ocr: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_text_length: 50,
            ocr_timeout_secs: 120,
            enable_ocr: true,
        }
    }
}

impl AcquisitionConfig {
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,

    /// Maximum pages to recognize (0 = unlimited).
    pub max_pages: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            max_pages: 10,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rule table version.
    pub rule_set: String,

    /// Report the address block fields individually when the block misses.
    pub address_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rule_set: "v2".to_string(),
            address_fallback: true,
        }
    }
}

/// Batch pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent documents (0 = number of CPUs).
    pub jobs: usize,

    /// Lifetime of memoized canonical names, in seconds.
    pub name_cache_ttl_secs: u64,

    /// Collapse duplicate report ids.
    pub dedupe: bool,

    /// Tag receiving waters shared by several organizations.
    pub disambiguate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            name_cache_ttl_secs: 3600,
            dedupe: true,
            disambiguate: true,
        }
    }
}

impl PipelineConfig {
    pub fn name_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.name_cache_ttl_secs)
    }
}

impl SsoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
