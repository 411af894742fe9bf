//! Metrics inspection subcommand.
//!
//! Reads the shared database through the same store the collectors write
//! to; a running job and this command can use it concurrently.

use std::path::Path;

use crate::metrics::{InfoRow, MetricType, MetricsStore};

/// Query options for `metrics <job>`.
#[derive(Debug, Default)]
pub struct MetricsQuery {
    pub metric_type: Option<MetricType>,
    pub metric_name: Option<String>,
    /// Keep only the most recent N rows.
    pub limit: Option<usize>,
    pub json: bool,
}

/// `metrics <job>` — print recorded rows for a job.
pub async fn run_metrics(db_path: &Path, job_id: &str, query: &MetricsQuery) -> i32 {
    if !db_path.exists() {
        eprintln!("Metrics database not found: {}", db_path.display());
        return 1;
    }
    let store = MetricsStore::open(db_path);

    if query.metric_type == Some(MetricType::Info) {
        return print_info_rows(&store, job_id, query).await;
    }

    let fetched = match (query.metric_type, query.metric_name.as_deref()) {
        (Some(ty), Some(name)) => store.events_by_metric(job_id, ty, name).await,
        _ => store.events_for_job(job_id).await,
    };
    let mut rows = match fetched {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Query failed: {e}");
            return 1;
        }
    };
    match (query.metric_type, query.metric_name.as_deref()) {
        (Some(ty), None) => rows.retain(|r| r.metric_type == ty.as_str()),
        (None, Some(name)) => rows.retain(|r| r.metric_name == name),
        _ => {}
    }
    truncate_to_latest(&mut rows, query.limit);

    if query.json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No metrics recorded for job: {job_id}");
        return 0;
    }
    println!(
        "{:>8}  {:<13}  {:<24}  {:>14}  {}",
        "step", "type", "name", "value", "timestamp"
    );
    for row in &rows {
        println!(
            "{:>8}  {:<13}  {:<24}  {:>14.6}  {}",
            row.step, row.metric_type, row.metric_name, row.value, row.timestamp
        );
    }
    0
}

async fn print_info_rows(store: &MetricsStore, job_id: &str, query: &MetricsQuery) -> i32 {
    let mut rows: Vec<InfoRow> = match store.info_for_job(job_id).await {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Query failed: {e}");
            return 1;
        }
    };
    if let Some(name) = query.metric_name.as_deref() {
        rows.retain(|r| r.metric_name == name);
    }
    truncate_to_latest(&mut rows, query.limit);

    if query.json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No info entries recorded for job: {job_id}");
        return 0;
    }
    println!("{:>8}  {:<24}  {:<32}  {}", "step", "name", "value", "timestamp");
    for row in &rows {
        println!(
            "{:>8}  {:<24}  {:<32}  {}",
            row.step, row.metric_name, row.value, row.timestamp
        );
    }
    0
}

fn print_json<T: serde::Serialize>(rows: &[T]) -> i32 {
    match serde_json::to_string_pretty(rows) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            eprintln!("Serialization failed: {e}");
            1
        }
    }
}

/// Rows arrive ordered by step; keep the tail when a limit is set.
fn truncate_to_latest<T>(rows: &mut Vec<T>, limit: Option<usize>) {
    if let Some(limit) = limit {
        if rows.len() > limit {
            rows.drain(..rows.len() - limit);
        }
    }
}
