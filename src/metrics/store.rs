//! SQLite-backed durable store for metric events.
//!
//! One database file is shared by every job in the process; rows are
//! disjoint by `job_id`, so no cross-job coordination is needed. Writes
//! are transactional batched upserts keyed by event id.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use super::event::{MetricEvent, MetricType, MetricValue};
use super::MetricsError;

/// A persisted scalar metric row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MetricRow {
    pub id: String,
    pub job_id: String,
    pub step: i64,
    pub timestamp: String,
    pub metric_type: String,
    pub metric_name: String,
    pub value: f64,
}

/// A persisted textual info row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InfoRow {
    pub id: String,
    pub job_id: String,
    pub step: i64,
    pub timestamp: String,
    pub metric_name: String,
    pub value: String,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS training_metrics (
        id          TEXT PRIMARY KEY,
        job_id      TEXT NOT NULL,
        step        INTEGER NOT NULL,
        timestamp   TEXT NOT NULL,
        metric_type TEXT NOT NULL,
        metric_name TEXT NOT NULL,
        value       REAL NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_metrics_job_step
        ON training_metrics (job_id, step)",
    "CREATE INDEX IF NOT EXISTS idx_metrics_job_type_name
        ON training_metrics (job_id, metric_type, metric_name)",
    "CREATE TABLE IF NOT EXISTS training_info (
        id          TEXT PRIMARY KEY,
        job_id      TEXT NOT NULL,
        step        INTEGER NOT NULL,
        timestamp   TEXT NOT NULL,
        metric_name TEXT NOT NULL,
        value       TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_info_job_step
        ON training_info (job_id, step)",
];

/// Handle to the shared metrics database.
pub struct MetricsStore {
    pool: SqlitePool,
    schema_ready: AtomicBool,
}

impl MetricsStore {
    /// Open a store over the database at `path`. The pool is lazy: nothing
    /// touches the filesystem until the first query, so a bad path surfaces
    /// as a per-flush warning rather than a construction failure.
    pub fn open(path: &Path) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);
        Self {
            pool,
            schema_ready: AtomicBool::new(false),
        }
    }

    /// Create tables and indexes when absent. Retried on every write until
    /// it succeeds once.
    pub async fn ensure_schema(&self) -> Result<(), MetricsError> {
        if self.schema_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.schema_ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Write a batch of events in one transaction, replacing rows that
    /// share an id.
    pub async fn upsert_batch(&self, events: &[MetricEvent]) -> Result<(), MetricsError> {
        if events.is_empty() {
            return Ok(());
        }
        self.ensure_schema().await?;

        let mut tx = self.pool.begin().await?;
        for event in events {
            match &event.value {
                MetricValue::Scalar(value) => {
                    sqlx::query(
                        "INSERT OR REPLACE INTO training_metrics
                         (id, job_id, step, timestamp, metric_type, metric_name, value)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    )
                    .bind(&event.id)
                    .bind(&event.job_id)
                    .bind(event.step as i64)
                    .bind(&event.timestamp)
                    .bind(event.metric_type.as_str())
                    .bind(&event.metric_name)
                    .bind(*value)
                    .execute(&mut *tx)
                    .await?;
                }
                MetricValue::Text(value) => {
                    sqlx::query(
                        "INSERT OR REPLACE INTO training_info
                         (id, job_id, step, timestamp, metric_name, value)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    )
                    .bind(&event.id)
                    .bind(&event.job_id)
                    .bind(event.step as i64)
                    .bind(&event.timestamp)
                    .bind(&event.metric_name)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// All scalar rows for a job, ordered by step.
    pub async fn events_for_job(&self, job_id: &str) -> Result<Vec<MetricRow>, MetricsError> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, MetricRow>(
            "SELECT id, job_id, step, timestamp, metric_type, metric_name, value
             FROM training_metrics
             WHERE job_id = ?1
             ORDER BY step, metric_type, metric_name",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Scalar rows for one (metric_type, metric_name) series of a job,
    /// ordered by step.
    pub async fn events_by_metric(
        &self,
        job_id: &str,
        metric_type: MetricType,
        metric_name: &str,
    ) -> Result<Vec<MetricRow>, MetricsError> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, MetricRow>(
            "SELECT id, job_id, step, timestamp, metric_type, metric_name, value
             FROM training_metrics
             WHERE job_id = ?1 AND metric_type = ?2 AND metric_name = ?3
             ORDER BY step",
        )
        .bind(job_id)
        .bind(metric_type.as_str())
        .bind(metric_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Textual info rows for a job, ordered by step.
    pub async fn info_for_job(&self, job_id: &str) -> Result<Vec<InfoRow>, MetricsError> {
        self.ensure_schema().await?;
        let rows = sqlx::query_as::<_, InfoRow>(
            "SELECT id, job_id, step, timestamp, metric_name, value
             FROM training_info
             WHERE job_id = ?1
             ORDER BY step, metric_name",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
