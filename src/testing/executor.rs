//! Case executor
//!
//! Runs cases one after another, invoking the external program for each and
//! turning every outcome (including harness-side errors) into a result. A
//! failing case never stops the run.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use colored::Colorize;
use tokio::process::Command as TokioCommand;

use super::compare::{self, Comparison};
use super::fixture::FixtureWorkspace;
use super::manifest::{CaseSpec, Mode, RowError, TestCase};
use super::report::{RunReport, Status, TestResult};
use crate::common::config::Programs;
use crate::common::paths::{sanitize_file_stem, TestLayout};
use crate::common::{Error, Result};

/// Behavior switches for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print captured output for passing cases too
    pub verbose: bool,
    /// Leave logs and outputs in the scratch area after the run
    pub keep_temp: bool,
    /// Progress goes to stderr so stdout carries only the JSON report
    pub json: bool,
}

/// Exit code and combined stdout+stderr of one invocation
#[derive(Debug, Clone)]
pub struct Captured {
    pub code: Option<i32>,
    pub output: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn describe_exit(&self) -> String {
        match self.code {
            Some(code) => format!("program exited with code {}", code),
            None => "program was terminated by a signal".to_string(),
        }
    }
}

/// What a case produced before it is recorded
#[derive(Debug)]
struct CaseOutcome {
    status: Status,
    detail: Option<String>,
    log: Option<String>,
}

impl CaseOutcome {
    fn new(status: Status, detail: Option<String>, log: Option<String>) -> Self {
        Self {
            status,
            detail,
            log,
        }
    }

    /// A mismatch diff is appended to the case log before it is reported
    fn from_comparison(comparison: Comparison, log: CaseLog) -> Result<Self> {
        match comparison {
            Comparison::Match => Ok(Self::new(Status::Pass, None, Some(log.text))),
            Comparison::Mismatch { diff } => {
                log.append_diff(&diff)?;
                Ok(Self::new(Status::Fail, Some(diff), Some(log.text)))
            }
        }
    }
}

/// Captured output of a case and the scratch file it was written to
#[derive(Debug)]
struct CaseLog {
    path: PathBuf,
    text: String,
}

impl CaseLog {
    fn append_diff(&self, diff: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::file_read(&self.path, e))?;
        writeln!(file, "\n== diff (-expected +actual) ==")?;
        file.write_all(diff.as_bytes())?;
        Ok(())
    }
}

/// Sequential executor for a list of cases
pub struct Executor {
    programs: Programs,
    layout: TestLayout,
    options: RunOptions,
    /// Scratch files removed when the run ends
    scratch: Vec<PathBuf>,
}

impl Executor {
    pub fn new(programs: Programs, layout: TestLayout, options: RunOptions) -> Self {
        Self {
            programs,
            layout,
            options,
            scratch: Vec::new(),
        }
    }

    /// Run every entry in order and return the collected report
    pub async fn run<I>(&mut self, entries: I) -> RunReport
    where
        I: IntoIterator<Item = std::result::Result<TestCase, RowError>>,
    {
        let mut report = RunReport::new();
        for entry in entries {
            let result = match entry {
                Ok(case) => self.run_case(&case).await,
                Err(err) => {
                    let result = TestResult::from_row_error(&err);
                    self.print_outcome(&result, None);
                    result
                }
            };
            report.push(result);
        }
        self.cleanup();
        report
    }

    /// Run one case; never fails, errors become ERROR results
    pub async fn run_case(&mut self, case: &TestCase) -> TestResult {
        tracing::debug!(
            line = case.line,
            "Running case {} ({}) in {} mode",
            case.id,
            case.name,
            case.mode()
        );

        let outcome = match self.execute(case).await {
            Ok(outcome) => outcome,
            Err(e) => CaseOutcome::new(Status::Error, Some(e.to_string()), None),
        };

        tracing::info!(id = %case.id, name = %case.name, status = %outcome.status, "case finished");
        let result = TestResult::new(case, outcome.status, outcome.detail);
        self.print_outcome(&result, outcome.log.as_deref());
        result
    }

    async fn execute(&mut self, case: &TestCase) -> Result<CaseOutcome> {
        match &case.spec {
            CaseSpec::Offline => self.run_offline(case).await,
            CaseSpec::Live {
                input,
                html,
                expected,
                series_id,
            } => {
                self.run_live(case, input, html.as_deref(), expected, series_id.as_deref())
                    .await
            }
            CaseSpec::RunLight { case_dir } => self.run_light(case, case_dir).await,
        }
    }

    /// Plain invocation with a manifest holding just this case
    async fn run_offline(&mut self, case: &TestCase) -> Result<CaseOutcome> {
        let tmp_dir = self.layout.ensure_tmp_dir()?;
        let mut manifest = tempfile::Builder::new()
            .prefix(&format!("manifest_{}_", std::process::id()))
            .suffix(".txt")
            .tempfile_in(&tmp_dir)?;
        writeln!(manifest, "{}", case.raw)?;
        manifest.flush()?;

        let mut args: Vec<OsString> = vec!["--test-file".into(), manifest.path().into()];
        for (flag, dir) in [
            ("--input-dir", self.layout.input_dir()),
            ("--html-dir", self.layout.html_dir()),
        ] {
            if dir.is_dir() {
                args.push(flag.into());
                args.push(dir.into());
            }
        }

        let captured = self.invoke(Mode::Offline, &args).await?;
        let log = self.write_log(case, &captured)?;

        if self.options.keep_temp {
            manifest
                .keep()
                .map_err(|e| Error::Io(e.error))?;
        }

        let status = compare::classify_exit(captured.code, &captured.output);
        let detail = (status != Status::Pass).then(|| captured.describe_exit());
        Ok(CaseOutcome::new(status, detail, Some(log.text)))
    }

    /// Live-update invocation; missing fixtures skip the program entirely
    async fn run_live(
        &mut self,
        case: &TestCase,
        input: &str,
        html: Option<&str>,
        expected: &str,
        series_id: Option<&str>,
    ) -> Result<CaseOutcome> {
        let input_path = self.layout.input_dir().join(input);
        let html_path = html.map(|h| self.layout.html_dir().join(h));
        let expected_path = self.layout.expected_dir().join(expected);

        for path in [Some(&input_path), html_path.as_ref(), Some(&expected_path)]
            .into_iter()
            .flatten()
        {
            if !path.is_file() {
                return Err(Error::missing_fixture(path));
            }
        }

        let output_path = self.scratch_path(case, "out")?;
        if output_path.exists() {
            std::fs::remove_file(&output_path)?;
        }

        let mut args: Vec<OsString> = vec![
            "--input".into(),
            input_path.into(),
            "--output".into(),
            output_path.clone().into(),
        ];
        if let Some(html_path) = html_path {
            args.push("--html-file".into());
            args.push(html_path.into());
        }
        if let Some(series_id) = series_id {
            args.push("--series-id".into());
            args.push(series_id.into());
        }

        let captured = self.invoke(Mode::Live, &args).await?;
        let log = self.write_log(case, &captured)?;
        if !captured.success() {
            return Ok(CaseOutcome::new(
                Status::Error,
                Some(captured.describe_exit()),
                Some(log.text),
            ));
        }

        let comparison = compare::compare_files_sorted(&expected_path, &output_path)?;
        CaseOutcome::from_comparison(comparison, log)
    }

    /// Directory fixture invocation against a freshly reset case directory
    async fn run_light(&mut self, case: &TestCase, case_dir: &Path) -> Result<CaseOutcome> {
        let dir = if case_dir.is_absolute() {
            case_dir.to_path_buf()
        } else {
            self.layout.run_light_dir().join(case_dir)
        };
        let workspace = FixtureWorkspace::acquire(&dir)?;

        let mut args: Vec<OsString> = vec![
            "--games-file".into(),
            workspace.games_file().into(),
            "--series-live-file".into(),
            workspace.series_live_file().into(),
            "--html-root".into(),
            workspace.html_root().into(),
            "--hash-dir".into(),
            workspace.hash_dir().into(),
        ];
        if let Some(now) = workspace.now() {
            args.push("--now".into());
            args.push(now.into());
        }
        args.push("--debug".into());

        let captured = self.invoke(Mode::RunLight, &args).await?;
        let log = self.write_log(case, &captured)?;
        if !captured.success() {
            return Ok(CaseOutcome::new(
                Status::Error,
                Some(captured.describe_exit()),
                Some(log.text),
            ));
        }

        let comparison = compare::compare_fixture(workspace.dir())?;
        CaseOutcome::from_comparison(comparison, log)
    }

    /// Locate the interpreter and program configured for a mode
    fn resolve_command(&self, mode: Mode) -> Result<TokioCommand> {
        let program = self.programs.program_for(mode);
        let program_path = if program.exists() {
            program.to_path_buf()
        } else if self.programs.interpreter().is_none() {
            which::which(program)
                .map_err(|_| Error::ProgramNotFound(program.display().to_string()))?
        } else {
            return Err(Error::ProgramNotFound(program.display().to_string()));
        };

        match self.programs.interpreter() {
            Some(interpreter) => {
                let interpreter_path = which::which(interpreter)
                    .map_err(|_| Error::ProgramNotFound(interpreter.to_string()))?;
                let mut cmd = TokioCommand::new(interpreter_path);
                cmd.arg(program_path);
                Ok(cmd)
            }
            None => Ok(TokioCommand::new(program_path)),
        }
    }

    /// Run the program for `mode` to completion and capture its output
    pub async fn invoke(&self, mode: Mode, args: &[OsString]) -> Result<Captured> {
        let mut cmd = self.resolve_command(mode)?;
        cmd.args(args).stdin(Stdio::null());
        tracing::debug!("Invoking {:?}", cmd.as_std());

        let program = self.programs.program_for(mode).display().to_string();
        let output = cmd
            .output()
            .await
            .map_err(|e| Error::invocation_failed(&program, e))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(Captured {
            code: output.status.code(),
            output: text,
        })
    }

    /// Scratch file path for a case, registered for cleanup
    fn scratch_path(&mut self, case: &TestCase, extension: &str) -> Result<PathBuf> {
        let tmp_dir = self.layout.ensure_tmp_dir()?;
        let path = tmp_dir.join(format!(
            "{}_{}_{}.{}",
            sanitize_file_stem(&case.id),
            sanitize_file_stem(&case.name),
            std::process::id(),
            extension
        ));
        self.scratch.push(path.clone());
        Ok(path)
    }

    /// Persist the captured output to the case's `.log` scratch file
    fn write_log(&mut self, case: &TestCase, captured: &Captured) -> Result<CaseLog> {
        let path = self.scratch_path(case, "log")?;
        std::fs::write(&path, &captured.output)?;
        tracing::debug!("Captured output written to {}", path.display());
        Ok(CaseLog {
            path,
            text: captured.output.clone(),
        })
    }

    fn print_outcome(&self, result: &TestResult, log: Option<&str>) {
        let badge = match result.status {
            Status::Pass => "PASS".green().bold(),
            Status::Fail => "FAIL".red().bold(),
            Status::Error => "ERROR".yellow().bold(),
        };
        let mut text = format!("[{}] {} {}\n", badge, result.id, result.name.dimmed());

        if result.status != Status::Pass || self.options.verbose {
            if let Some(log) = log.filter(|l| !l.trim().is_empty()) {
                for line in log.lines() {
                    text.push_str(&format!("    {}\n", line));
                }
            }
            if let Some(detail) = &result.detail {
                for line in detail.lines() {
                    text.push_str(&format!("  {}\n", line));
                }
            }
        }

        if self.options.json {
            eprint!("{}", text);
        } else {
            print!("{}", text);
        }
    }

    /// Remove scratch files unless asked to keep them
    fn cleanup(&mut self) {
        if self.options.keep_temp {
            self.scratch.clear();
            return;
        }
        for path in self.scratch.drain(..) {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }
}
