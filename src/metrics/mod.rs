//! Metric recording pipeline: the event model, per-job buffering
//! collectors, the process registry, and the SQLite durable store.

mod collector;
mod event;
mod registry;
mod store;

use thiserror::Error;

pub use collector::{CollectorConfig, MetricsCollector};
pub use event::{ExtraValue, MetricEvent, MetricType, MetricValue, MAX_INFO_LEN};
pub use registry::{CollectorGuard, MetricsRegistry, RegistryConfig};
pub use store::{InfoRow, MetricRow, MetricsStore};

/// Errors surfaced by the metrics pipeline.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("flush timed out after {0:?}")]
    FlushTimeout(std::time::Duration),
}
