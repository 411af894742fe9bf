//! File-backed hot-reload store with modification-time cache invalidation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, warn};

use crate::telemetry::ops;

use super::doc::ConfigDoc;

/// File name of the per-job cadence document.
pub const CONFIG_FILE_NAME: &str = "dynamic_config.yaml";

#[derive(Debug, Error)]
pub enum DynamicConfigError {
    #[error("cadence values must be positive, got {0}")]
    InvalidValue(i64),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// One of the three operator-tunable cadence keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadenceKey {
    SampleEvery,
    SaveEvery,
    LogEvery,
}

impl CadenceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CadenceKey::SampleEvery => "sample_every",
            CadenceKey::SaveEvery => "save_every",
            CadenceKey::LogEvery => "log_every",
        }
    }
}

impl std::str::FromStr for CadenceKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sample_every" => Ok(CadenceKey::SampleEvery),
            "save_every" => Ok(CadenceKey::SaveEvery),
            "log_every" => Ok(CadenceKey::LogEvery),
            _ => Err(()),
        }
    }
}

/// Operator-editable cadence parameters for one running job.
///
/// Designed for a single caller (the training loop); getters take
/// `&mut self` because they refresh the cache. A read costs one metadata
/// call unless the file changed since the last check, so polling every
/// iteration is cheap and changes become visible on the next call after
/// the edit.
pub struct DynamicConfig {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    cache: ConfigDoc,
}

impl DynamicConfig {
    /// Open the store for `<root>/<job_id>/dynamic_config.yaml`, creating
    /// the directory and a default document when missing. Never fails: a
    /// store that cannot create its file serves caller defaults until the
    /// file appears.
    pub fn open(job_id: &str, root: &Path) -> Self {
        Self::with_path(root.join(job_id).join(CONFIG_FILE_NAME))
    }

    /// Open the store over an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        let mut store = Self {
            path,
            last_modified: None,
            cache: ConfigDoc::default(),
        };
        store.ensure_file();
        store
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current sampling cadence, or `default` when unset or invalid.
    pub fn get_sample_every(&mut self, default: u64) -> u64 {
        self.refresh();
        self.cache.sample_every.unwrap_or(default)
    }

    /// Current checkpoint-save cadence; `None` keeps the job's own setting.
    pub fn get_save_every(&mut self, default: Option<u64>) -> Option<u64> {
        self.refresh();
        self.cache.save_every.or(default)
    }

    /// Current logging cadence; `None` keeps the job's own setting.
    pub fn get_log_every(&mut self, default: Option<u64>) -> Option<u64> {
        self.refresh();
        self.cache.log_every.or(default)
    }

    /// Validate and persist one cadence override. `None` clears the key so
    /// the caller default wins again. Rejected values leave both the file
    /// and the cache untouched.
    pub fn set(&mut self, key: CadenceKey, value: Option<i64>) -> Result<(), DynamicConfigError> {
        let validated = match value {
            Some(v) if v <= 0 => return Err(DynamicConfigError::InvalidValue(v)),
            Some(v) => Some(v as u64),
            None => None,
        };

        // Load fresh from disk so an external edit to another key is not
        // clobbered with stale cache contents.
        let mut doc = self.load();
        match key {
            CadenceKey::SampleEvery => doc.sample_every = validated,
            CadenceKey::SaveEvery => doc.save_every = validated,
            CadenceKey::LogEvery => doc.log_every = validated,
        }
        self.commit(doc)
    }

    pub fn set_sample_every(&mut self, value: i64) -> Result<(), DynamicConfigError> {
        self.set(CadenceKey::SampleEvery, Some(value))
    }

    pub fn set_save_every(&mut self, value: i64) -> Result<(), DynamicConfigError> {
        self.set(CadenceKey::SaveEvery, Some(value))
    }

    pub fn set_log_every(&mut self, value: i64) -> Result<(), DynamicConfigError> {
        self.set(CadenceKey::LogEvery, Some(value))
    }

    /// Overwrite the document with the defaults of a fresh file.
    pub fn reset_to_defaults(&mut self) -> Result<(), DynamicConfigError> {
        self.commit(ConfigDoc::initial())
    }

    /// Write `doc` and adopt it as the cache, so our own writes are
    /// immediately visible without waiting for the mtime clock to tick.
    fn commit(&mut self, doc: ConfigDoc) -> Result<(), DynamicConfigError> {
        self.write(&doc)?;
        self.last_modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        self.cache = doc;
        Ok(())
    }

    /// Mtime-gated reload: one metadata call when the file is unchanged, a
    /// re-read and re-parse when it advanced or was never read.
    fn refresh(&mut self) {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Externally deleted. Recreate with defaults; this call
                // serves the caller's defaults and the next one re-reads.
                self.last_modified = None;
                self.cache = ConfigDoc::default();
                self.ensure_file();
                return;
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "config metadata check failed; serving cached values"
                );
                return;
            }
        };

        let stale = self.last_modified.map_or(true, |last| modified > last);
        if !stale {
            return;
        }

        self.cache = self.load();
        self.last_modified = Some(modified);
        ops::record_config_reload();
        debug!(path = %self.path.display(), config = ?self.cache, "dynamic config reloaded");
    }

    /// Read and leniently parse the on-disk document.
    fn load(&self) -> ConfigDoc {
        match fs::read_to_string(&self.path) {
            Ok(text) => ConfigDoc::parse(&text),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "config read failed; treating document as empty"
                );
                ConfigDoc::default()
            }
        }
    }

    fn write(&self, doc: &ConfigDoc) -> Result<(), DynamicConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, doc.to_yaml()?)?;
        Ok(())
    }

    fn ensure_file(&mut self) {
        if self.path.exists() {
            return;
        }
        if let Err(e) = self.write(&ConfigDoc::initial()) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "could not create default config file"
            );
        }
    }
}
