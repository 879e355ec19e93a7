//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the cases of a manifest
    Run {
        /// Case ids or names to run; each argument may hold several
        /// space-separated values (default: all cases)
        filters: Vec<String>,

        /// Manifest to read instead of tests/test_cases.txt (also `-tf`)
        #[arg(long = "test-file", value_name = "FILE")]
        test_file: Option<PathBuf>,
    },

    /// Discover and run the run-light fixture directories
    #[command(name = "run-light")]
    RunLight {
        /// Case directory names to run (default: all)
        filters: Vec<String>,

        /// Directory holding the TC* case directories
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// List the cases a run would execute
    #[command(alias = "ls")]
    List {
        /// Case ids or names to show (default: all cases)
        filters: Vec<String>,

        /// Manifest to read instead of tests/test_cases.txt (also `-tf`)
        #[arg(long = "test-file", value_name = "FILE")]
        test_file: Option<PathBuf>,
    },
}
