//! Operator-editable cadence parameters with file-backed hot reload.
//!
//! Each job owns a small YAML document in its output directory. The
//! running process polls the store once per iteration; the store re-reads
//! the file only when its modification time advances, so the common case
//! costs a single metadata call.

mod doc;
mod store;

pub use doc::{ConfigDoc, DEFAULT_SAMPLE_EVERY};
pub use store::{CadenceKey, DynamicConfig, DynamicConfigError, CONFIG_FILE_NAME};
