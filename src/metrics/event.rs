//! Metric event model and id derivation.
//!
//! One event is a single (job, step, metric_type, metric_name, value)
//! observation. Ids are deterministic, so re-reporting the same tuple
//! overwrites the stored row instead of duplicating it.

/// Textual extras at or above this length are skipped at intake.
pub const MAX_INFO_LEN: usize = 100;

/// Category of a recorded metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Loss,
    LearningRate,
    System,
    Info,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Loss => "loss",
            MetricType::LearningRate => "learning_rate",
            MetricType::System => "system",
            MetricType::Info => "info",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loss" => Ok(MetricType::Loss),
            "learning_rate" => Ok(MetricType::LearningRate),
            "system" => Ok(MetricType::System),
            "info" => Ok(MetricType::Info),
            _ => Err(()),
        }
    }
}

/// A value supplied in the `extras` map of a report call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    Number(f64),
    Text(String),
}

impl From<f64> for ExtraValue {
    fn from(value: f64) -> Self {
        ExtraValue::Number(value)
    }
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        ExtraValue::Text(value.to_string())
    }
}

impl From<String> for ExtraValue {
    fn from(value: String) -> Self {
        ExtraValue::Text(value)
    }
}

/// Payload of one event: a scalar for the numeric table, or verbatim text
/// for the info side-table.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    Text(String),
}

/// One buffered telemetry observation.
#[derive(Debug, Clone)]
pub struct MetricEvent {
    pub id: String,
    pub job_id: String,
    pub step: u64,
    pub timestamp: String,
    pub metric_type: MetricType,
    pub metric_name: String,
    pub value: MetricValue,
}

impl MetricEvent {
    /// Derive the upsert key for a (job, step, type, name) tuple.
    ///
    /// The step token is purely numeric, so distinct tuples cannot produce
    /// the same id even when job ids or names contain underscores.
    pub fn derive_id(job_id: &str, step: u64, metric_type: MetricType, metric_name: &str) -> String {
        match metric_type {
            MetricType::LearningRate => format!("{job_id}_{step}_lr"),
            other => format!("{job_id}_{step}_{}_{metric_name}", other.as_str()),
        }
    }

    /// Build a scalar event. Returns `None` for values that cannot be
    /// stored as a finite number.
    pub fn scalar(
        job_id: &str,
        step: u64,
        metric_type: MetricType,
        metric_name: &str,
        value: f64,
        timestamp: &str,
    ) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Self {
            id: Self::derive_id(job_id, step, metric_type, metric_name),
            job_id: job_id.to_string(),
            step,
            timestamp: timestamp.to_string(),
            metric_type,
            metric_name: metric_name.to_string(),
            value: MetricValue::Scalar(value),
        })
    }

    /// Build a textual info event. Returns `None` for over-long strings.
    pub fn text(
        job_id: &str,
        step: u64,
        metric_name: &str,
        value: &str,
        timestamp: &str,
    ) -> Option<Self> {
        if value.len() >= MAX_INFO_LEN {
            return None;
        }
        Some(Self {
            id: Self::derive_id(job_id, step, MetricType::Info, metric_name),
            job_id: job_id.to_string(),
            step,
            timestamp: timestamp.to_string(),
            metric_type: MetricType::Info,
            metric_name: metric_name.to_string(),
            value: MetricValue::Text(value.to_string()),
        })
    }
}
