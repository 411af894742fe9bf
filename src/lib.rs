//! Trainkit Core
//!
//! An embeddable telemetry-and-live-configuration layer for long-running
//! training jobs. It records per-iteration scalar metrics durably without
//! stalling the producing loop, and lets an operator retune cadence
//! parameters on a running process by editing a side file.
//!
//! # Responsibilities
//!
//! - **Recording**: per-job [`metrics::MetricsCollector`] instances buffer
//!   events in memory and flush them as batched upserts into a shared
//!   SQLite database once a threshold is crossed or on demand.
//! - **Lifecycle**: a [`metrics::MetricsRegistry`] hands out exactly one
//!   collector per job id and owns the shutdown paths.
//! - **Live configuration**: [`dynconf::DynamicConfig`] serves
//!   operator-edited cadence values with modification-time cache
//!   invalidation, so polling every iteration costs one metadata call.
//!
//! # Boundaries
//!
//! The crate never decides what to train and never computes metric values;
//! it accepts what the training loop reports. Malformed values are skipped
//! or defaulted, storage failures are logged and retried, and nothing in
//! this crate aborts the caller's iteration.

pub mod cli;
pub mod config;
pub mod dynconf;
pub mod metrics;
pub mod telemetry;

pub use config::EnvConfig;
pub use dynconf::DynamicConfig;
pub use metrics::{MetricsCollector, MetricsRegistry, RegistryConfig};
