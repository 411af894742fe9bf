//! The cadence document: lenient YAML read, full-document write.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_yaml::Value;

/// Sampling cadence written into a freshly created document.
pub const DEFAULT_SAMPLE_EVERY: u64 = 100;

/// Cadence overrides parsed from one document.
///
/// `None` means "defer to the caller-supplied default", either because the
/// key is absent, null, or failed validation. One malformed key never
/// poisons the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDoc {
    pub sample_every: Option<u64>,
    pub save_every: Option<u64>,
    pub log_every: Option<u64>,
    /// Epoch seconds of the last write; informational only.
    pub last_updated: Option<f64>,
}

impl ConfigDoc {
    /// Document written when a job's config file is first created.
    pub fn initial() -> Self {
        Self {
            sample_every: Some(DEFAULT_SAMPLE_EVERY),
            ..Self::default()
        }
    }

    /// Parse a document, treating malformed values as absent. A document
    /// that is not valid YAML at all parses as empty.
    pub fn parse(text: &str) -> Self {
        let value: Value = match serde_yaml::from_str(text) {
            Ok(value) => value,
            Err(_) => return Self::default(),
        };
        Self {
            sample_every: positive_int(&value, "sample_every"),
            save_every: positive_int(&value, "save_every"),
            log_every: positive_int(&value, "log_every"),
            last_updated: value.get("last_updated").and_then(Value::as_f64),
        }
    }

    /// Serialize with a fresh `last_updated` stamp.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        #[derive(Serialize)]
        struct Output {
            sample_every: Option<u64>,
            save_every: Option<u64>,
            log_every: Option<u64>,
            last_updated: f64,
        }

        serde_yaml::to_string(&Output {
            sample_every: self.sample_every,
            save_every: self.save_every,
            log_every: self.log_every,
            last_updated: epoch_seconds(),
        })
    }
}

/// Extract `key` as a positive integer, treating anything else as absent.
fn positive_int(value: &Value, key: &str) -> Option<u64> {
    value.get(key)?.as_u64().filter(|v| *v > 0)
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_document() {
        let doc = ConfigDoc::parse("sample_every: 25\nsave_every: 1000\nlog_every: null\n");
        assert_eq!(doc.sample_every, Some(25));
        assert_eq!(doc.save_every, Some(1000));
        assert_eq!(doc.log_every, None);
    }

    #[test]
    fn malformed_values_read_as_absent() {
        let doc = ConfigDoc::parse(
            "sample_every: -5\nsave_every: soon\nlog_every: 2.5\nlast_updated: 1754000000.5\n",
        );
        assert_eq!(doc.sample_every, None);
        assert_eq!(doc.save_every, None);
        assert_eq!(doc.log_every, None);
        assert_eq!(doc.last_updated, Some(1754000000.5));
    }

    #[test]
    fn zero_reads_as_absent() {
        let doc = ConfigDoc::parse("sample_every: 0\n");
        assert_eq!(doc.sample_every, None);
    }

    #[test]
    fn unparsable_document_reads_as_empty() {
        assert_eq!(ConfigDoc::parse("{{{{"), ConfigDoc::default());
        assert_eq!(ConfigDoc::parse("- just\n- a\n- list\n"), ConfigDoc::default());
    }

    #[test]
    fn serialization_writes_null_for_absent_keys() {
        let text = ConfigDoc::initial().to_yaml().unwrap();
        assert!(text.contains("sample_every: 100"));
        assert!(text.contains("save_every: null"));
        assert!(text.contains("log_every: null"));
        assert!(text.contains("last_updated:"));
    }

    #[test]
    fn round_trip_preserves_overrides() {
        let doc = ConfigDoc {
            sample_every: Some(50),
            save_every: None,
            log_every: Some(10),
            last_updated: None,
        };
        let parsed = ConfigDoc::parse(&doc.to_yaml().unwrap());
        assert_eq!(parsed.sample_every, Some(50));
        assert_eq!(parsed.save_every, None);
        assert_eq!(parsed.log_every, Some(10));
        assert!(parsed.last_updated.is_some());
    }
}
