//! # Sweep Binary
//!
//! One-shot entry point for the external scheduler.
//!
//! ## Usage
//! ```bash
//! # Everything (reports, outbox, purge) against the default database
//! cargo run -p shopkit-jobs --bin sweep
//!
//! # Just the nightly report regeneration, for a specific date
//! cargo run -p shopkit-jobs --bin sweep -- --task reports --date 2024-03-15
//!
//! # Outbox drain with a config file
//! cargo run -p shopkit-jobs --bin sweep -- --task outbox --config ./jobs.toml
//! ```
//!
//! Exits non-zero when a selected sweep fails outright, so the scheduler's
//! failure alerting fires.

use chrono::{NaiveDate, Utc};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use shopkit_db::{Database, DbConfig};
use shopkit_jobs::{outbox, purge, reports, JobsConfig, LoggingDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Reports,
    Outbox,
    Purge,
    All,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut task = Task::All;
    let mut db_path = String::from("./shopkit.db");
    let mut config_path: Option<PathBuf> = None;
    let mut date: Option<NaiveDate> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--task" | "-t" => {
                if i + 1 < args.len() {
                    task = match args[i + 1].as_str() {
                        "reports" => Task::Reports,
                        "outbox" => Task::Outbox,
                        "purge" => Task::Purge,
                        "all" => Task::All,
                        other => {
                            eprintln!("Unknown task '{other}' (expected reports|outbox|purge|all)");
                            return ExitCode::FAILURE;
                        }
                    };
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--date" => {
                if i + 1 < args.len() {
                    match NaiveDate::parse_from_str(&args[i + 1], "%Y-%m-%d") {
                        Ok(d) => date = Some(d),
                        Err(_) => {
                            eprintln!("Invalid --date '{}' (expected YYYY-MM-DD)", args[i + 1]);
                            return ExitCode::FAILURE;
                        }
                    }
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopkit Sweep");
                println!();
                println!("Usage: sweep [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --task <TASK>    reports | outbox | purge | all (default: all)");
                println!("  -d, --db <PATH>      Database file path (default: ./shopkit.db)");
                println!("  -c, --config <PATH>  TOML config file");
                println!("      --date <DATE>    Reference date for reports, YYYY-MM-DD (default: today)");
                println!("  -h, --help           Show this help message");
                return ExitCode::SUCCESS;
            }
            _ => {}
        }
        i += 1;
    }

    let config = match JobsConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database at {db_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let reference = date.unwrap_or_else(|| Utc::now().date_naive());
    let mut failed = false;

    if matches!(task, Task::Reports | Task::All) {
        match reports::run_due(
            &db,
            reference,
            &config.reports.kinds(),
            config.reports.business_timeout(),
        )
        .await
        {
            Ok(summary) => {
                println!(
                    "reports: {} succeeded, {} failed",
                    summary.succeeded, summary.failed
                );
                if summary.is_total_failure() {
                    failed = true;
                }
            }
            Err(e) => {
                eprintln!("reports sweep failed: {e}");
                failed = true;
            }
        }
    }

    if matches!(task, Task::Outbox | Task::All) {
        match outbox::dispatch_batch(&db, &LoggingDispatcher, &config.outbox).await {
            Ok(summary) => {
                println!(
                    "outbox: {} delivered, {} failed",
                    summary.delivered, summary.failed
                );
            }
            Err(e) => {
                eprintln!("outbox sweep failed: {e}");
                failed = true;
            }
        }
    }

    if matches!(task, Task::Purge | Task::All) {
        match purge::run_purge(&db, config.purge.outbox_retention_days, Utc::now()).await {
            Ok(summary) => {
                println!(
                    "purge: {} outbox events, {} tokens removed",
                    summary.outbox_removed, summary.tokens_removed
                );
            }
            Err(e) => {
                eprintln!("purge sweep failed: {e}");
                failed = true;
            }
        }
    }

    db.close().await;

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
