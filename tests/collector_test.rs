//! Buffer & flush engine tests against a real SQLite file.

use std::collections::HashMap;
use std::time::Duration;

use tempfile::TempDir;
use trainkit_core::metrics::{
    CollectorConfig, ExtraValue, MetricType, MetricsCollector, MetricsStore,
};

fn losses(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn no_extras() -> HashMap<String, ExtraValue> {
    HashMap::new()
}

fn collector_at(dir: &TempDir, config: CollectorConfig) -> MetricsCollector {
    let store = MetricsStore::open(&dir.path().join("metrics.db"));
    MetricsCollector::new("job-1", store, config)
}

// =============================================================================
// Threshold and buffering
// =============================================================================

#[tokio::test]
async fn buffer_fills_until_threshold_then_empties() {
    let dir = TempDir::new().unwrap();
    let collector = collector_at(
        &dir,
        CollectorConfig {
            flush_threshold: 4,
            ..CollectorConfig::default()
        },
    );

    // Each report yields two events: one loss plus the learning rate.
    collector
        .report(1, &losses(&[("total", 0.9)]), 1e-4, &no_extras())
        .await;
    assert_eq!(collector.pending().await, 2);

    collector
        .report(2, &losses(&[("total", 0.8)]), 1e-4, &no_extras())
        .await;
    assert_eq!(collector.pending().await, 0);
}

#[tokio::test]
async fn ten_reports_of_loss_and_lr_store_twenty_rows() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("metrics.db");
    let collector = MetricsCollector::new(
        "job-1",
        MetricsStore::open(&db_path),
        CollectorConfig::default(),
    );

    for step in 1..=10 {
        collector
            .report(step, &losses(&[("total", 0.53)]), 1e-4, &no_extras())
            .await;
    }
    // Default threshold is 10, so flushes fired at steps 5 and 10.
    assert_eq!(collector.pending().await, 0);

    let store = MetricsStore::open(&db_path);
    let rows = store.events_for_job("job-1").await.unwrap();
    assert_eq!(rows.len(), 20);
}

#[tokio::test]
async fn flush_with_empty_buffer_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let collector = collector_at(&dir, CollectorConfig::default());
    assert_eq!(collector.flush().await.unwrap(), 0);
}

// =============================================================================
// Upsert semantics and value filtering
// =============================================================================

#[tokio::test]
async fn re_reporting_a_step_overwrites_instead_of_duplicating() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("metrics.db");
    let collector = MetricsCollector::new(
        "job-1",
        MetricsStore::open(&db_path),
        CollectorConfig::default(),
    );

    collector
        .report(7, &losses(&[("total", 0.9)]), 1e-4, &no_extras())
        .await;
    collector
        .report(7, &losses(&[("total", 0.4)]), 1e-4, &no_extras())
        .await;
    collector.flush().await.unwrap();

    let store = MetricsStore::open(&db_path);
    let rows = store
        .events_by_metric("job-1", MetricType::Loss, "total")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].step, 7);
    assert!((rows[0].value - 0.4).abs() < f64::EPSILON);
}

#[tokio::test]
async fn non_finite_values_never_reach_the_store() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("metrics.db");
    let collector = MetricsCollector::new(
        "job-1",
        MetricsStore::open(&db_path),
        CollectorConfig::default(),
    );

    collector
        .report(
            1,
            &losses(&[("total", f64::NAN), ("aux", f64::INFINITY), ("kl", 0.1)]),
            f64::NAN,
            &no_extras(),
        )
        .await;
    collector.flush().await.unwrap();

    let store = MetricsStore::open(&db_path);
    let rows = store.events_for_job("job-1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].metric_name, "kl");
}

#[tokio::test]
async fn extras_split_between_system_and_info_tables() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("metrics.db");
    let collector = MetricsCollector::new(
        "job-1",
        MetricsStore::open(&db_path),
        CollectorConfig::default(),
    );

    let mut extras: HashMap<String, ExtraValue> = HashMap::new();
    extras.insert("gpu_memory_gb".to_string(), ExtraValue::Number(38.2));
    extras.insert("speed_info".to_string(), ExtraValue::Text("3.2 it/s".to_string()));
    extras.insert("oversized".to_string(), ExtraValue::Text("x".repeat(200)));

    collector.report(3, &losses(&[]), 1e-4, &extras).await;
    collector.flush().await.unwrap();

    let store = MetricsStore::open(&db_path);
    let system = store
        .events_by_metric("job-1", MetricType::System, "gpu_memory_gb")
        .await
        .unwrap();
    assert_eq!(system.len(), 1);
    assert!((system[0].value - 38.2).abs() < f64::EPSILON);

    let info = store.info_for_job("job-1").await.unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].metric_name, "speed_info");
    assert_eq!(info[0].value, "3.2 it/s");
}

// =============================================================================
// Failure handling: retain, bound, recover
// =============================================================================

#[tokio::test]
async fn failed_flush_retains_buffer_and_later_flush_recovers() {
    let dir = TempDir::new().unwrap();
    // Parent directory does not exist yet, so the first write fails.
    let db_path = dir.path().join("not-yet-created").join("metrics.db");
    let collector = MetricsCollector::new(
        "job-1",
        MetricsStore::open(&db_path),
        CollectorConfig {
            flush_threshold: 100,
            ..CollectorConfig::default()
        },
    );

    collector
        .report(1, &losses(&[("total", 0.5)]), 1e-4, &no_extras())
        .await;
    assert!(collector.flush().await.is_err());
    assert_eq!(collector.pending().await, 2);

    std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();
    assert_eq!(collector.flush().await.unwrap(), 2);
    assert_eq!(collector.pending().await, 0);

    let store = MetricsStore::open(&db_path);
    let rows = store.events_for_job("job-1").await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn retained_buffer_is_bounded_by_max_buffered() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("missing-parent").join("metrics.db");
    let collector = MetricsCollector::new(
        "job-1",
        MetricsStore::open(&db_path),
        CollectorConfig {
            flush_threshold: 2,
            max_buffered: 3,
            flush_timeout: Duration::from_secs(5),
        },
    );

    // Every report crosses the threshold and fails to flush; the retain
    // bound keeps only the newest three events.
    for step in 1..=4 {
        collector
            .report(step, &losses(&[("total", 0.5)]), 1e-4, &no_extras())
            .await;
    }
    assert_eq!(collector.pending().await, 3);
}
