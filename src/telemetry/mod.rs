//! Logging and operational metrics for the recording pipeline.

mod logging;
pub mod ops;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use ops::init_metrics;
