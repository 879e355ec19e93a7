//! Result comparison strategies
//!
//! - log pattern: exit code plus the literal `FAIL` marker (offline cases)
//! - sorted content diff: line-ending and order insensitive (live cases)
//! - fixture diff: working copies and hash store against `expected/`
//!   (run-light cases)

use difference::{Changeset, Difference};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::fixture::{GAMES_FILE, HASH_DIR, SERIES_LIVE_FILE};
use super::report::Status;
use crate::common::{Error, Result};

/// Marker the external program prints when one of its own checks failed
pub const FAIL_MARKER: &str = "FAIL";

/// Outcome of comparing actual output against expectations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Match,
    Mismatch { diff: String },
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match)
    }

    fn mismatch(diff: impl Into<String>) -> Self {
        Comparison::Mismatch { diff: diff.into() }
    }
}

/// Classify an offline run from its exit code and captured output
///
/// `None` means the process was terminated by a signal and counts as a
/// non-zero exit.
pub fn classify_exit(code: Option<i32>, output: &str) -> Status {
    match code {
        Some(0) => Status::Pass,
        _ if output.contains(FAIL_MARKER) => Status::Fail,
        _ => Status::Error,
    }
}

fn normalized_lines(text: &str) -> Vec<&str> {
    text.lines().map(|l| l.trim_end_matches('\r')).collect()
}

/// Render a line diff between two texts with ` `, `-` and `+` prefixes
///
/// A final newline is a line terminator, not an extra empty line.
pub fn render_diff(expected: &str, actual: &str) -> String {
    let trim = |text: &str| text.strip_suffix('\n').unwrap_or(text).to_string();
    let changeset = Changeset::new(&trim(expected), &trim(actual), "\n");
    let mut out = String::new();
    for diff in &changeset.diffs {
        let (prefix, chunk) = match diff {
            Difference::Same(x) => (' ', x),
            Difference::Rem(x) => ('-', x),
            Difference::Add(x) => ('+', x),
        };
        for line in trim(chunk).split('\n') {
            out.push(prefix);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Order-insensitive comparison that ignores CRLF vs LF
pub fn compare_sorted(expected: &str, actual: &str) -> Comparison {
    let mut expected_lines = normalized_lines(expected);
    let mut actual_lines = normalized_lines(actual);
    expected_lines.sort_unstable();
    actual_lines.sort_unstable();

    if expected_lines == actual_lines {
        Comparison::Match
    } else {
        Comparison::mismatch(render_diff(
            &expected_lines.join("\n"),
            &actual_lines.join("\n"),
        ))
    }
}

/// Exact, ordered comparison
pub fn compare_exact(expected: &str, actual: &str) -> Comparison {
    if expected == actual {
        Comparison::Match
    } else {
        Comparison::mismatch(render_diff(expected, actual))
    }
}

/// Sorted comparison of an expected file against a produced output file
pub fn compare_files_sorted(expected: &Path, actual: &Path) -> Result<Comparison> {
    let expected_text = read_expected(expected)?;
    let Some(actual_text) = read_optional(actual)? else {
        return Ok(Comparison::mismatch(format!(
            "output file '{}' was not written",
            actual.display()
        )));
    };
    Ok(compare_sorted(&expected_text, &actual_text))
}

/// Drop the timestamp field (everything up to the first `;`) of a hash line
pub fn strip_hash_timestamp(line: &str) -> &str {
    let line = line.trim_end_matches('\r');
    match line.split_once(';') {
        Some((_, rest)) => rest,
        None => line,
    }
}

fn normalize_hash_file(text: &str) -> String {
    text.lines()
        .map(strip_hash_timestamp)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Files under `dir` keyed by their path relative to it
fn files_by_relative_path(dir: &Path) -> Result<BTreeMap<PathBuf, PathBuf>> {
    let mut files = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to walk '{}': {}",
                dir.display(),
                e
            )))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.insert(relative, entry.path().to_path_buf());
    }
    Ok(files)
}

/// Compare a hash store against expected hash files, ignoring timestamps
pub fn compare_hash_dirs(expected_dir: &Path, actual_dir: &Path) -> Result<Comparison> {
    let expected = files_by_relative_path(expected_dir)?;
    let actual = files_by_relative_path(actual_dir)?;

    let mut report = String::new();
    for (relative, expected_path) in &expected {
        let Some(actual_path) = actual.get(relative) else {
            report.push_str(&format!("missing hash file: {}\n", relative.display()));
            continue;
        };
        let expected_text = normalize_hash_file(&read_expected(expected_path)?);
        let actual_text = normalize_hash_file(&read_expected(actual_path)?);
        if expected_text != actual_text {
            report.push_str(&format!("--- {}\n", relative.display()));
            report.push_str(&render_diff(&expected_text, &actual_text));
        }
    }
    for relative in actual.keys().filter(|k| !expected.contains_key(*k)) {
        report.push_str(&format!("unexpected hash file: {}\n", relative.display()));
    }

    if report.is_empty() {
        Ok(Comparison::Match)
    } else {
        Ok(Comparison::mismatch(report))
    }
}

/// Compare a run-light case directory against its `expected/` tree
///
/// Each expected artifact that is absent is skipped rather than failed.
pub fn compare_fixture(case_dir: &Path) -> Result<Comparison> {
    let expected_dir = case_dir.join("expected");
    let mut report = String::new();

    for file in [SERIES_LIVE_FILE, GAMES_FILE] {
        let expected = expected_dir.join(file);
        let Some(expected_text) = read_optional(&expected)? else {
            tracing::debug!("No expected {} in {}, skipping", file, case_dir.display());
            continue;
        };
        let actual = case_dir.join(file);
        match read_optional(&actual)? {
            Some(actual_text) => {
                if let Comparison::Mismatch { diff } = compare_exact(&expected_text, &actual_text)
                {
                    report.push_str(&format!("--- {}\n{}", file, diff));
                }
            }
            None => report.push_str(&format!("missing working file: {}\n", file)),
        }
    }

    let expected_hashes = expected_dir.join(HASH_DIR);
    if expected_hashes.is_dir() {
        if let Comparison::Mismatch { diff } =
            compare_hash_dirs(&expected_hashes, &case_dir.join(HASH_DIR))?
        {
            report.push_str(&diff);
        }
    } else {
        tracing::debug!("No expected hashes in {}, skipping", case_dir.display());
    }

    if report.is_empty() {
        Ok(Comparison::Match)
    } else {
        Ok(Comparison::mismatch(report))
    }
}

fn read_expected(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::missing_fixture(path));
    }
    std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| Error::file_read(path, e))
}
