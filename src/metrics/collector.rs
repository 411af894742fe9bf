//! Per-job metric buffering and flush.
//!
//! A collector accepts one `report` call per training iteration, converts
//! it into events, and guarantees they eventually reach the database. The
//! buffer and the flush path form a single critical section, so a flush
//! never observes a partially appended batch and concurrent reports never
//! interleave their appends.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::telemetry::ops;

use super::event::{ExtraValue, MetricEvent, MetricType};
use super::store::MetricsStore;
use super::MetricsError;

/// Tunables for one collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Buffered event count that triggers an automatic flush.
    pub flush_threshold: usize,
    /// Upper bound on events retained across failed flushes.
    pub max_buffered: usize,
    /// Deadline for one durable write.
    pub flush_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 10,
            max_buffered: 1000,
            flush_timeout: Duration::from_secs(5),
        }
    }
}

/// Buffer & flush engine for a single training job.
pub struct MetricsCollector {
    job_id: String,
    store: MetricsStore,
    config: CollectorConfig,
    buffer: Mutex<Vec<MetricEvent>>,
}

impl MetricsCollector {
    pub fn new(job_id: &str, store: MetricsStore, config: CollectorConfig) -> Self {
        Self {
            job_id: job_id.to_string(),
            store,
            config,
            buffer: Mutex::new(Vec::new()),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Record one training iteration.
    ///
    /// Never fails the caller: values that cannot be stored are skipped
    /// and storage problems are logged and retried on the next flush. The
    /// call blocks only when it crosses the flush threshold, for at most
    /// the configured flush timeout.
    pub async fn report(
        &self,
        step: u64,
        losses: &HashMap<String, f64>,
        learning_rate: f64,
        extras: &HashMap<String, ExtraValue>,
    ) {
        // One capture time shared by every event of this call.
        let timestamp = Utc::now().to_rfc3339();
        let mut events = Vec::with_capacity(losses.len() + extras.len() + 1);

        for (name, value) in losses {
            if let Some(event) =
                MetricEvent::scalar(&self.job_id, step, MetricType::Loss, name, *value, &timestamp)
            {
                events.push(event);
            }
        }

        if let Some(event) = MetricEvent::scalar(
            &self.job_id,
            step,
            MetricType::LearningRate,
            "lr",
            learning_rate,
            &timestamp,
        ) {
            events.push(event);
        }

        for (name, value) in extras {
            let event = match value {
                ExtraValue::Number(v) => {
                    MetricEvent::scalar(&self.job_id, step, MetricType::System, name, *v, &timestamp)
                }
                ExtraValue::Text(text) => {
                    MetricEvent::text(&self.job_id, step, name, text, &timestamp)
                }
            };
            if let Some(event) = event {
                events.push(event);
            }
        }

        let mut buffer = self.buffer.lock().await;
        buffer.extend(events);
        ops::record_buffer_depth(buffer.len());
        if buffer.len() >= self.config.flush_threshold {
            if let Err(e) = self.flush_locked(&mut buffer).await {
                warn!(job_id = %self.job_id, error = %e, "metric flush failed; buffer retained");
            }
        }
    }

    /// Drain the buffer in one batched durable write. Clears the buffer
    /// only on success; an empty buffer is a no-op. Returns the number of
    /// events written.
    pub async fn flush(&self) -> Result<usize, MetricsError> {
        let mut buffer = self.buffer.lock().await;
        self.flush_locked(&mut buffer).await
    }

    /// Final flush before the collector is discarded.
    pub async fn shutdown(&self) -> Result<usize, MetricsError> {
        self.flush().await
    }

    /// Buffered events not yet written.
    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    async fn flush_locked(&self, buffer: &mut Vec<MetricEvent>) -> Result<usize, MetricsError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let outcome =
            tokio::time::timeout(self.config.flush_timeout, self.store.upsert_batch(buffer)).await;
        let result = match outcome {
            Ok(Ok(())) => {
                let written = buffer.len();
                buffer.clear();
                ops::record_flush_success(written);
                Ok(written)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MetricsError::FlushTimeout(self.config.flush_timeout)),
        };

        if result.is_err() {
            ops::record_flush_failure();
            // Bound retained memory while storage stays unavailable.
            if buffer.len() > self.config.max_buffered {
                let overflow = buffer.len() - self.config.max_buffered;
                buffer.drain(..overflow);
                ops::record_events_dropped(overflow);
                warn!(
                    job_id = %self.job_id,
                    dropped = overflow,
                    "retained buffer over capacity; oldest events dropped"
                );
            }
        }
        ops::record_buffer_depth(buffer.len());
        result
    }
}

impl Drop for MetricsCollector {
    fn drop(&mut self) {
        if let Ok(buffer) = self.buffer.try_lock() {
            if !buffer.is_empty() {
                warn!(
                    job_id = %self.job_id,
                    pending = buffer.len(),
                    "collector dropped with unflushed events; call shutdown() at job end"
                );
            }
        }
    }
}
