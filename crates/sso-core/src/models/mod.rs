//! Data models: field names, records, configuration.

pub mod config;
pub mod fields;
pub mod record;

pub use config::SsoConfig;
pub use fields::{Field, RawFieldMap};
pub use record::{CauseCategory, SsoRecord};
