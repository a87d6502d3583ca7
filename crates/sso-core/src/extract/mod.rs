//! Report field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, RuleBasedParser};

/// Trait for report parsers.
///
/// Parsing never fails: absent fields are simply missing from the result.
pub trait ReportParser {
    /// Parse report fields from text.
    fn parse(&self, text: &str) -> ExtractionResult;
}
