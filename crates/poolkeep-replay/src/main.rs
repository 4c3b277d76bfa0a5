//! poolkeep-replay: run a scenario against an in-memory pool.
//!
//! Usage:
//! ```bash
//! poolkeep-replay scenarios/operator_limit.json
//! poolkeep-replay scenarios/operator_limit.json --summary --verbose
//! poolkeep-replay scenarios/operator_limit.json --fail-fast --json-logs
//! ```
//!
//! The report is written to stdout as JSON; logs go to stderr.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod scenario;

use scenario::Scenario;

/// Replay a poolkeep scenario and print the resulting journal and balances
#[derive(Parser)]
#[command(name = "poolkeep-replay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Abort on the first failing step
    #[arg(long)]
    fail_fast: bool,

    /// Omit the audit journal from the report
    #[arg(long)]
    summary: bool,

    /// Single-line JSON output instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().without_time().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let scenario = Scenario::from_file(&cli.scenario)?;
    tracing::info!(
        scenario = %cli.scenario.display(),
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    let mut report = scenario.replay(cli.fail_fast)?;
    tracing::info!(
        steps = report.steps.len(),
        failed = report.failed_steps(),
        records = report.journal.len(),
        head = %report.journal_head,
        "Replay complete"
    );

    if cli.summary {
        report.journal.clear();
    }
    let out = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{out}");
    Ok(())
}
