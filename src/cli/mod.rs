//! Operator command-line surface.
//!
//! Subcommands for inspecting recorded metrics and editing the per-job
//! cadence documents that running jobs hot-reload.
//!
//! ## Usage
//!
//! ```bash
//! trainkit-cli config list             # job directories and config presence
//! trainkit-cli config get my-job       # print a job's cadence document
//! trainkit-cli config set my-job sample_every 25
//! trainkit-cli metrics my-job --type loss --limit 20
//! ```

pub mod config_cmd;
pub mod metrics_cmd;

pub use metrics_cmd::MetricsQuery;

/// Value of a `--flag value` pair anywhere in `args`, if present.
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Whether a bare `--flag` is present in `args`.
pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flag_value_finds_pair_anywhere() {
        let a = args(&["metrics", "job-1", "--type", "loss", "--limit", "5"]);
        assert_eq!(flag_value(&a, "--type"), Some("loss"));
        assert_eq!(flag_value(&a, "--limit"), Some("5"));
        assert_eq!(flag_value(&a, "--name"), None);
    }

    #[test]
    fn flag_value_at_end_without_operand_is_none() {
        let a = args(&["metrics", "job-1", "--type"]);
        assert_eq!(flag_value(&a, "--type"), None);
    }

    #[test]
    fn has_flag_matches_exact_token() {
        let a = args(&["metrics", "job-1", "--json"]);
        assert!(has_flag(&a, "--json"));
        assert!(!has_flag(&a, "--js"));
    }
}
