//! Cadence configuration subcommands.
//!
//! Operates on the same per-job YAML documents the running jobs
//! hot-reload, so an edit made here is picked up within a few training
//! iterations.

use std::fs;
use std::path::Path;

use crate::dynconf::{CadenceKey, ConfigDoc, DynamicConfig, CONFIG_FILE_NAME};

/// `config list` — job directories under the training root and whether
/// each carries a cadence document.
pub fn run_list(root: &Path) -> i32 {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Training folder not found: {} ({e})", root.display());
            return 1;
        }
    };

    let mut jobs: Vec<(String, bool)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let has_config = path.join(CONFIG_FILE_NAME).exists();
            jobs.push((entry.file_name().to_string_lossy().into_owned(), has_config));
        }
    }
    jobs.sort();

    if jobs.is_empty() {
        println!("No training jobs found.");
        return 0;
    }
    println!("Found {} training job(s):", jobs.len());
    for (name, has_config) in jobs {
        let status = if has_config { "has config" } else { "no config" };
        println!("  {name:<30} [{status}]");
    }
    0
}

/// `config get <job>` — print a job's cadence document.
pub fn run_get(root: &Path, job: &str) -> i32 {
    let path = root.join(job).join(CONFIG_FILE_NAME);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => {
            eprintln!("No dynamic config found for job: {job}");
            eprintln!("Expected location: {}", path.display());
            return 1;
        }
    };

    let doc = ConfigDoc::parse(&text);
    println!("Dynamic configuration for job: {job}");
    print_cadence("sample_every", doc.sample_every);
    print_cadence("save_every", doc.save_every);
    print_cadence("log_every", doc.log_every);
    if let Some(updated) = doc.last_updated {
        let formatted = chrono::DateTime::from_timestamp(updated as i64, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| updated.to_string());
        println!("  {:<15}: {formatted}", "last_updated");
    }
    println!();
    println!("Config file: {}", path.display());
    0
}

fn print_cadence(key: &str, value: Option<u64>) {
    match value {
        Some(v) => println!("  {key:<15}: {v}"),
        None => println!("  {key:<15}: (use default)"),
    }
}

/// `config set <job> <key> <value>` — value is a positive integer, or
/// "none" to clear the override.
pub fn run_set(root: &Path, job: &str, key: &str, value: &str) -> i32 {
    let Ok(key) = key.parse::<CadenceKey>() else {
        eprintln!("Invalid config key: {key}");
        eprintln!("Valid keys: sample_every, save_every, log_every");
        return 1;
    };
    let parsed = match parse_cadence_value(value) {
        Ok(parsed) => parsed,
        Err(()) => {
            eprintln!("Invalid value: {value}. Must be a positive integer or \"none\".");
            return 1;
        }
    };
    if !root.join(job).is_dir() {
        eprintln!("Job directory not found: {}", root.join(job).display());
        return 1;
    }

    let mut config = DynamicConfig::open(job, root);
    match config.set(key, parsed) {
        Ok(()) => {
            match parsed {
                Some(v) => println!("Updated {}: {v}", key.as_str()),
                None => println!("Cleared {}; the training default applies again", key.as_str()),
            }
            println!("Running jobs pick the change up within a few iterations.");
            0
        }
        Err(e) => {
            eprintln!("Failed to update config: {e}");
            1
        }
    }
}

/// `config create <job>` — write the default document.
pub fn run_create(root: &Path, job: &str) -> i32 {
    if !root.join(job).is_dir() {
        eprintln!("Job directory not found: {}", root.join(job).display());
        return 1;
    }
    let mut config = DynamicConfig::open(job, root);
    match config.reset_to_defaults() {
        Ok(()) => {
            println!("Created default configuration for job: {job}");
            println!("Config file: {}", config.path().display());
            0
        }
        Err(e) => {
            eprintln!("Failed to create config: {e}");
            1
        }
    }
}

/// Parse a positive integer or the "none"/"null" clearing sentinel.
fn parse_cadence_value(raw: &str) -> Result<Option<i64>, ()> {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() || lowered == "none" || lowered == "null" {
        return Ok(None);
    }
    match lowered.parse::<i64>() {
        Ok(v) if v > 0 => Ok(Some(v)),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_values_parse_integers_and_sentinels() {
        assert_eq!(parse_cadence_value("50"), Ok(Some(50)));
        assert_eq!(parse_cadence_value(" 1000 "), Ok(Some(1000)));
        assert_eq!(parse_cadence_value("none"), Ok(None));
        assert_eq!(parse_cadence_value("NULL"), Ok(None));
        assert_eq!(parse_cadence_value(""), Ok(None));
        assert_eq!(parse_cadence_value("0"), Err(()));
        assert_eq!(parse_cadence_value("-5"), Err(()));
        assert_eq!(parse_cadence_value("soon"), Err(()));
    }
}
