//! Batch stages after text extraction.

pub mod assemble;
pub mod batch;
pub mod dedup;
pub mod disambiguate;
pub mod qa;

pub use assemble::{Assembly, DocumentMeta, RecordAssembler};
pub use batch::{BatchOutput, BatchSummary, DocumentOutcome, DocumentReport, Pipeline};
pub use dedup::{dedup_key, dedupe_keep_newest};
pub use disambiguate::{derive_tag, disambiguate_waterways, find_collisions, waterway_key, TagDeriver};
pub use qa::{run_basic_qa, QaIssue, Severity};
