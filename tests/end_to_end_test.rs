//! End-to-end: a simulated training loop reporting metrics while an
//! operator retunes the sampling cadence mid-run.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use trainkit_core::dynconf::DynamicConfig;
use trainkit_core::metrics::{CollectorConfig, ExtraValue, MetricsRegistry, MetricsStore, RegistryConfig};

fn operator_edit(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(2))
        .unwrap();
}

#[tokio::test]
async fn training_loop_records_metrics_and_observes_cadence_changes() {
    let dir = TempDir::new().unwrap();
    let job_id = "run-2026-08-01";
    let db_path = dir.path().join("metrics.db");

    let registry = MetricsRegistry::new(RegistryConfig {
        db_path: db_path.clone(),
        collector: CollectorConfig::default(),
    });
    let mut cadence = DynamicConfig::open(job_id, dir.path());
    let collector = registry.get_or_create(job_id, None).await;

    let mut observed_sample_every = Vec::new();
    for step in 1..=20u64 {
        // The operator lowers the sampling cadence while the loop runs.
        if step == 11 {
            operator_edit(&cadence.path().to_path_buf(), "sample_every: 5\n");
        }

        let mut losses = HashMap::new();
        losses.insert("total".to_string(), 1.0 / step as f64);
        let mut extras = HashMap::new();
        if step % 10 == 0 {
            extras.insert("gpu_memory_gb".to_string(), ExtraValue::Number(38.2));
        }
        collector.report(step, &losses, 1e-4, &extras).await;

        observed_sample_every.push(cadence.get_sample_every(100));
    }

    // The default was served before the edit, the override after it.
    assert!(observed_sample_every[..10].iter().all(|v| *v == 100));
    assert!(observed_sample_every[10..].iter().all(|v| *v == 5));

    registry.release(job_id).await;
    assert_eq!(registry.count().await, 0);

    // 20 losses + 20 learning rates + 2 system samples, all durable.
    let store = MetricsStore::open(&db_path);
    let rows = store.events_for_job(job_id).await.unwrap();
    assert_eq!(rows.len(), 42);
    assert!(rows.iter().filter(|r| r.metric_type == "system").count() == 2);
}
