//! Per-process registry handing out one collector per job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::collector::{CollectorConfig, MetricsCollector};
use super::store::MetricsStore;

/// Registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Database every collector writes to unless overridden at creation.
    pub db_path: PathBuf,
    pub collector: CollectorConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("trainkit.db"),
            collector: CollectorConfig::default(),
        }
    }
}

/// Hands out exactly one [`MetricsCollector`] per job id.
///
/// Constructed once at process start and passed by reference to whatever
/// needs it; there is no hidden global instance.
pub struct MetricsRegistry {
    config: RegistryConfig,
    collectors: RwLock<HashMap<String, Arc<MetricsCollector>>>,
}

impl MetricsRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            collectors: RwLock::new(HashMap::new()),
        }
    }

    /// Get the collector for `job_id`, constructing it on first call.
    /// `db_path` is honored only by the call that constructs.
    pub async fn get_or_create(&self, job_id: &str, db_path: Option<&Path>) -> Arc<MetricsCollector> {
        // The write lock is held across check-and-insert so concurrent
        // first calls construct exactly one collector.
        let mut collectors = self.collectors.write().await;
        if let Some(existing) = collectors.get(job_id) {
            return existing.clone();
        }

        let path = db_path.unwrap_or(&self.config.db_path);
        let store = MetricsStore::open(path);
        if let Err(e) = store.ensure_schema().await {
            warn!(job_id, error = %e, "could not prepare metrics schema; flushes will retry");
        }
        let collector = Arc::new(MetricsCollector::new(
            job_id,
            store,
            self.config.collector.clone(),
        ));
        collectors.insert(job_id.to_string(), collector.clone());
        debug!(job_id, "metrics collector created");
        collector
    }

    /// Like [`get_or_create`](Self::get_or_create), wrapped in a guard
    /// that schedules a best-effort flush when dropped. Explicit
    /// [`release`](Self::release) remains the primary shutdown path.
    pub async fn scoped(&self, job_id: &str, db_path: Option<&Path>) -> CollectorGuard {
        CollectorGuard {
            collector: self.get_or_create(job_id, db_path).await,
        }
    }

    /// Shut down and remove the collector for `job_id`. Unknown ids are a
    /// no-op.
    pub async fn release(&self, job_id: &str) {
        let removed = self.collectors.write().await.remove(job_id);
        if let Some(collector) = removed {
            if let Err(e) = collector.shutdown().await {
                warn!(job_id, error = %e, "final flush failed on release");
            }
        }
    }

    /// Shut down and remove every collector; process-wide teardown.
    pub async fn release_all(&self) {
        let drained: Vec<_> = self.collectors.write().await.drain().collect();
        for (job_id, collector) in drained {
            if let Err(e) = collector.shutdown().await {
                warn!(job_id = %job_id, error = %e, "final flush failed on release");
            }
        }
    }

    /// Number of registered collectors.
    pub async fn count(&self) -> usize {
        self.collectors.read().await.len()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

/// RAII handle over a registered collector.
///
/// Dropping the guard spawns a flush of whatever is still buffered, if a
/// tokio runtime is current. This is a safety net for abnormal exit
/// routes, not a replacement for calling `release` at job end.
pub struct CollectorGuard {
    collector: Arc<MetricsCollector>,
}

impl std::ops::Deref for CollectorGuard {
    type Target = MetricsCollector;

    fn deref(&self) -> &MetricsCollector {
        &self.collector
    }
}

impl Drop for CollectorGuard {
    fn drop(&mut self) {
        let collector = self.collector.clone();
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = collector.flush().await {
                    warn!(job_id = %collector.job_id(), error = %e, "best-effort flush on drop failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_of_unknown_job_is_a_noop() {
        let registry = MetricsRegistry::default();
        tokio_test::block_on(registry.release("never-registered"));
        assert_eq!(tokio_test::block_on(registry.count()), 0);
    }
}
