//! CLI command handling
//!
//! Loads configuration and cases, drives the executor and prints the
//! summary. Returns the process exit code.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::paths::TestLayout;
use crate::common::Result;
use crate::testing::{
    fixture, CaseFilter, Executor, Manifest, RowError, RunOptions, RunReport, TestCase,
};

/// Flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub json: bool,
    pub keep_temp: bool,
}

impl GlobalOptions {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            verbose: self.verbose,
            keep_temp: self.keep_temp,
            json: self.json,
        }
    }
}

/// Accept the single-dash `-tf <file>` spelling by rewriting it to
/// `--test-file` before clap sees the arguments
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-tf" {
                OsString::from("--test-file")
            } else if let Some(value) = arg.to_str().and_then(|a| a.strip_prefix("-tf=")) {
                OsString::from(format!("--test-file={}", value))
            } else {
                arg
            }
        })
        .collect()
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, options: GlobalOptions) -> Result<i32> {
    let config = Config::load(options.config.as_deref())?;
    let layout = TestLayout::current();

    match command {
        Commands::Run { filters, test_file } => {
            let path = test_file.unwrap_or_else(|| config.defaults.test_file.clone());
            let manifest = Manifest::load(&path)?;
            let filter = CaseFilter::new(&filters);
            let entries = filter.apply(manifest.entries());
            tracing::info!(
                "Running {} case(s) from {}",
                entries.len(),
                manifest.path().display()
            );

            let mut executor = Executor::new(config.programs.clone(), layout, options.run_options());
            let report = executor.run(entries).await;
            print_report(&report, options.json)?;
            Ok(report.exit_code())
        }

        Commands::RunLight { filters, root } => {
            let root = root.unwrap_or_else(|| layout.run_light_dir());
            let filter = CaseFilter::new(&filters);
            let cases: Vec<std::result::Result<TestCase, RowError>> = fixture::discover(&root)?
                .into_iter()
                .filter(|case| filter.matches_case(case))
                .map(Ok)
                .collect();
            tracing::info!("Running {} run-light case(s) from {}", cases.len(), root.display());

            let mut executor = Executor::new(config.programs.clone(), layout, options.run_options());
            let report = executor.run(cases).await;
            print_report(&report, options.json)?;
            Ok(report.exit_code())
        }

        Commands::List { filters, test_file } => {
            let path = test_file.unwrap_or_else(|| config.defaults.test_file.clone());
            list_cases(&path, &CaseFilter::new(&filters))?;
            Ok(0)
        }
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!();
        print!("{}", report.render_table());
    }
    Ok(())
}

fn list_cases(path: &Path, filter: &CaseFilter) -> Result<()> {
    let manifest = Manifest::load(path)?;
    let entries = filter.apply(manifest.entries());
    if entries.is_empty() {
        println!("No cases in {}", path.display());
        return Ok(());
    }
    for entry in entries {
        match entry {
            Ok(case) => println!("{:<8} {:<10} {}", case.id, case.mode(), case.name),
            Err(err) => println!("{:<8} {:<10} {}", err.id.as_deref().unwrap_or("-"), "invalid", err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(args: &[&str]) -> Vec<String> {
        normalize_args(args.iter().map(OsString::from))
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_normalize_short_test_file_flag() {
        assert_eq!(
            normalized(&["harness", "run", "-tf", "cases.txt", "1"]),
            vec!["harness", "run", "--test-file", "cases.txt", "1"]
        );
        assert_eq!(
            normalized(&["harness", "run", "-tf=cases.txt"]),
            vec!["harness", "run", "--test-file=cases.txt"]
        );
    }

    #[test]
    fn test_normalize_leaves_other_args() {
        assert_eq!(
            normalized(&["harness", "run", "-v", "tf", "--json"]),
            vec!["harness", "run", "-v", "tf", "--json"]
        );
    }
}
