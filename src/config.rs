//! Runtime configuration loading from environment variables.
//!
//! All values are loaded from `TRAINKIT_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without
//! crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `TRAINKIT_OUTPUT_ROOT` | output | Training root containing per-job directories |
//! | `TRAINKIT_DB_PATH` | trainkit.db | Metrics database path |
//! | `TRAINKIT_FLUSH_THRESHOLD` | 10 | Buffered events triggering a flush |
//! | `TRAINKIT_MAX_BUFFERED` | 1000 | Events retained across failed flushes |
//! | `TRAINKIT_FLUSH_TIMEOUT_SECS` | 5 | Deadline for one durable write |
//! | `TRAINKIT_LOG_LEVEL` | info | Log filter directive |
//! | `TRAINKIT_LOG_FORMAT` | json | `json` or `pretty` |

use std::path::PathBuf;
use std::time::Duration;

use crate::metrics::{CollectorConfig, RegistryConfig};
use crate::telemetry::{LogConfig, LogFormat};

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub output_root: PathBuf,
    pub db_path: PathBuf,
    pub collector: CollectorConfig,
    pub log: LogConfig,
}

impl EnvConfig {
    /// Registry configuration derived from the loaded values.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            db_path: self.db_path.clone(),
            collector: self.collector.clone(),
        }
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_path(key: &str, default: &str) -> PathBuf {
    match std::env::var(key) {
        Ok(val) if !val.is_empty() => PathBuf::from(val),
        _ => PathBuf::from(default),
    }
}

/// Load collector tunables from environment.
fn load_collector_config() -> CollectorConfig {
    let flush_threshold = parse_usize("TRAINKIT_FLUSH_THRESHOLD", 10).max(1);
    let max_buffered = parse_usize("TRAINKIT_MAX_BUFFERED", 1000);
    let max_buffered = max_buffered.max(flush_threshold); // retain bound >= threshold
    let flush_timeout_secs = parse_u64("TRAINKIT_FLUSH_TIMEOUT_SECS", 5).max(1);
    CollectorConfig {
        flush_threshold,
        max_buffered,
        flush_timeout: Duration::from_secs(flush_timeout_secs),
    }
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let level = std::env::var("TRAINKIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let format = match std::env::var("TRAINKIT_LOG_FORMAT").as_deref() {
        Ok("pretty") => LogFormat::Pretty,
        _ => LogFormat::Json,
    };
    LogConfig {
        format,
        level,
        output_path: None,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        output_root: parse_path("TRAINKIT_OUTPUT_ROOT", "output"),
        db_path: parse_path("TRAINKIT_DB_PATH", "trainkit.db"),
        collector: load_collector_config(),
        log: load_log_config(),
    }
}
