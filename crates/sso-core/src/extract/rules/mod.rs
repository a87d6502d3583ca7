//! Rule table and field normalizers for overflow reports.

pub mod causes;
pub mod dates;
pub mod names;
pub mod patterns;
pub mod table;
pub mod volume;
pub mod waters;

pub use causes::classify_cause;
pub use dates::{footer_timestamp, parse_form_datetime, parse_timestamp, FooterStampExtractor};
pub use names::{canonicalize_org, lookup_alias, NameCanonicalizer};
pub use table::{Cleaner, CompiledRule, ExtractionRule, RuleSet, ADDRESS_BLOCK_V2, RULES_V2};
pub use volume::{
    bucket_label, format_thousands, is_range_text, parse_volume, resolve_volume_text,
    VolumeEstimate,
};
pub use waters::{normalize_receiving_water, resolve_receiving_water, CONTAINED_LABEL, GROUND_ABSORBED};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A located extraction with a confidence score.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
