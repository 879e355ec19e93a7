//! Scrape harness - manifest-driven test runner for the scraping pipeline
//!
//! Runs each case of a manifest (or each run-light fixture directory)
//! against the external scripts and reports PASS/FAIL/ERROR. Exits 0 only
//! when every case passed.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use harness::{cli, commands, common::logging};

#[derive(Parser)]
#[command(name = "harness", about = "Manifest-driven test harness for the scraping scripts")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ./harness.toml, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print captured program output for passing cases too
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print the report as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Keep scratch logs and outputs under tests/tmp
    #[arg(long, global = true)]
    keep_temp: bool,

    /// Also write diagnostics to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));

    // Held for the whole run so the file writer flushes on exit
    let log_guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let options = cli::GlobalOptions {
        config: cli.config,
        verbose: cli.verbose,
        json: cli.json,
        keep_temp: cli.keep_temp,
    };

    let code = match cli::dispatch(cli.command, options).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            2
        }
    };

    drop(log_guard);
    std::process::exit(code);
}
