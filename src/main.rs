//! trainkit-cli entry point.
//!
//! Operator tool over the training telemetry database and the per-job
//! cadence documents. Edits made here are hot-reloaded by running jobs
//! within a few iterations; no restart required.
//!
//! ## CLI Subcommands
//!
//! - `trainkit-cli config list` - List job directories under the training root
//! - `trainkit-cli config get <job>` - Print a job's cadence document
//! - `trainkit-cli config set <job> <key> <value>` - Update one cadence key
//! - `trainkit-cli config create <job>` - Write the default document
//! - `trainkit-cli metrics <job>` - Query recorded metrics

use std::path::PathBuf;
use std::process::ExitCode;

use trainkit_core::cli::{config_cmd, flag_value, has_flag, metrics_cmd, MetricsQuery};
use trainkit_core::config as env_config;
use trainkit_core::metrics::MetricType;
use trainkit_core::telemetry::{init_logging, LogConfig, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    let config = env_config::load();
    init_cli_logging(&config.log.level);

    match command {
        "config" => {
            let root = flag_value(&args, "--root")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.output_root.clone());
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("list");
            match subcommand {
                "list" => ExitCode::from(config_cmd::run_list(&root) as u8),
                "get" => {
                    let Some(job) = args.get(3) else {
                        eprintln!("Usage: trainkit-cli config get <job> [--root DIR]");
                        return ExitCode::FAILURE;
                    };
                    ExitCode::from(config_cmd::run_get(&root, job) as u8)
                }
                "set" => {
                    let (Some(job), Some(key), Some(value)) =
                        (args.get(3), args.get(4), args.get(5))
                    else {
                        eprintln!(
                            "Usage: trainkit-cli config set <job> <key> <value> [--root DIR]"
                        );
                        return ExitCode::FAILURE;
                    };
                    ExitCode::from(config_cmd::run_set(&root, job, key, value) as u8)
                }
                "create" => {
                    let Some(job) = args.get(3) else {
                        eprintln!("Usage: trainkit-cli config create <job> [--root DIR]");
                        return ExitCode::FAILURE;
                    };
                    ExitCode::from(config_cmd::run_create(&root, job) as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "metrics" => {
            let Some(job) = args.get(2).filter(|a| !a.starts_with("--")) else {
                eprintln!("Usage: trainkit-cli metrics <job> [--type T] [--name N] [--limit N] [--json]");
                return ExitCode::FAILURE;
            };
            let db_path = flag_value(&args, "--db")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.db_path.clone());

            let metric_type = match flag_value(&args, "--type") {
                Some(raw) => match raw.parse::<MetricType>() {
                    Ok(ty) => Some(ty),
                    Err(()) => {
                        eprintln!("Invalid metric type: {}", raw);
                        eprintln!("Valid types: loss, learning_rate, system, info");
                        return ExitCode::FAILURE;
                    }
                },
                None => None,
            };
            let limit = match flag_value(&args, "--limit") {
                Some(raw) => match raw.parse::<usize>() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        eprintln!("Invalid limit: {}", raw);
                        return ExitCode::FAILURE;
                    }
                },
                None => None,
            };
            let query = MetricsQuery {
                metric_type,
                metric_name: flag_value(&args, "--name").map(str::to_string),
                limit,
                json: has_flag(&args, "--json"),
            };
            ExitCode::from(metrics_cmd::run_metrics(&db_path, job, &query).await as u8)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("trainkit-cli {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

/// The CLI is interactive: pretty logs, warnings only unless overridden.
fn init_cli_logging(level: &str) {
    let config = LogConfig {
        format: LogFormat::Pretty,
        level: level.to_string(),
        output_path: None,
    };
    let _ = init_logging(&config);
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "trainkit-cli - Training telemetry and live-configuration tool v{}

USAGE:
    trainkit-cli [COMMAND] [OPTIONS]

COMMANDS:
    config list                      List job directories and config presence
    config get <job>                 Print a job's cadence document
    config set <job> <key> <value>   Update one cadence key on a running job
    config create <job>              Write the default cadence document
    metrics <job>                    Query recorded metrics for a job
    version                          Show version information
    help                             Show this help message

OPTIONS:
    --root DIR     Training root containing per-job directories
    --db PATH      Metrics database path
    --type T       Filter metrics by type (loss, learning_rate, system, info)
    --name N       Filter metrics by name
    --limit N      Keep only the most recent N rows
    --json         Emit rows as JSON

EXAMPLES:
    trainkit-cli config list                         # List known jobs
    trainkit-cli config get run-2026-08-01           # Show cadence overrides
    trainkit-cli config set run-2026-08-01 sample_every 25
    trainkit-cli config set run-2026-08-01 save_every none
    trainkit-cli metrics run-2026-08-01 --type loss --name total --limit 20
    trainkit-cli metrics run-2026-08-01 --json

ENVIRONMENT:
    TRAINKIT_OUTPUT_ROOT  Training root (default: output)
    TRAINKIT_DB_PATH      Metrics database path (default: trainkit.db)
    TRAINKIT_LOG_LEVEL    Log level (debug, info, warn, error)

EXIT CODES:
    0  Success
    1  Failure / invalid arguments",
        version
    );
}
