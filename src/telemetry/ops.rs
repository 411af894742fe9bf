//! Operational counters for the recording pipeline.
//!
//! Goes through the `metrics` facade: with no recorder installed these
//! are no-ops, so the library never forces an exporter on its host.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_counter!("trainkit_flush_total", "Completed durable flushes");
    describe_counter!(
        "trainkit_flush_failures_total",
        "Flushes that failed or timed out"
    );
    describe_counter!(
        "trainkit_events_written_total",
        "Metric events durably written"
    );
    describe_counter!(
        "trainkit_events_dropped_total",
        "Buffered events dropped by the retain bound"
    );
    describe_counter!(
        "trainkit_config_reloads_total",
        "Dynamic config cache reloads"
    );
    describe_gauge!("trainkit_buffer_events", "Events currently buffered");
}

pub fn record_flush_success(written: usize) {
    counter!("trainkit_flush_total").increment(1);
    counter!("trainkit_events_written_total").increment(written as u64);
}

pub fn record_flush_failure() {
    counter!("trainkit_flush_failures_total").increment(1);
}

pub fn record_events_dropped(count: usize) {
    counter!("trainkit_events_dropped_total").increment(count as u64);
}

pub fn record_config_reload() {
    counter!("trainkit_config_reloads_total").increment(1);
}

pub fn record_buffer_depth(depth: usize) {
    gauge!("trainkit_buffer_events").set(depth as f64);
}
