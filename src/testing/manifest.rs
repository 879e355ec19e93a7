//! Test manifest types and loader
//!
//! A manifest is a semicolon-delimited text file with one case per line:
//!
//! ```text
//! # id;name;mode;fields...
//! 1;BasicFetch;offline;2025-11-01;2025-11-02;null;games.txt
//! 7;LightUpdate;live;series.csv;overview.html;series_expected.csv;18805
//! 9;Tc3Replay;run-light;TC3
//! ```
//!
//! Blank lines, `#` comments and rows with an empty id are skipped.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Execution strategy for a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Plain invocation; the program reports PASS/FAIL in its own output
    Offline,
    /// Live-update invocation with explicit input/output/html files
    Live,
    /// Directory fixture reset from `pristine/` before each run
    RunLight,
}

impl Mode {
    /// Parse a manifest mode token
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "offline" | "plain" => Some(Mode::Offline),
            "live" | "live-update" | "live_update" => Some(Mode::Live),
            "run-light" | "run_light" | "runlight" => Some(Mode::RunLight),
            _ => None,
        }
    }

    /// Minimum number of `;` separated fields a row of this mode needs
    pub fn required_fields(self) -> usize {
        match self {
            Mode::Offline => 3,
            Mode::Live => 6,
            Mode::RunLight => 4,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Mode::Offline => "offline",
            Mode::Live => "live",
            Mode::RunLight => "run-light",
        })
    }
}

/// Mode-specific arguments of a case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseSpec {
    Offline,
    Live {
        /// File name under `tests/input`
        input: String,
        /// File name under `tests/html`, if the case uses one
        html: Option<String>,
        /// File name under `tests/expected`
        expected: String,
        series_id: Option<String>,
    },
    RunLight {
        /// Fixture directory, relative to `tests/run_light` unless absolute
        case_dir: PathBuf,
    },
}

/// One row of the manifest
#[derive(Debug, Clone)]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub spec: CaseSpec,
    /// 1-based manifest line, 0 for discovered cases
    pub line: usize,
    /// The original row text
    pub raw: String,
}

impl TestCase {
    pub fn mode(&self) -> Mode {
        match self.spec {
            CaseSpec::Offline => Mode::Offline,
            CaseSpec::Live { .. } => Mode::Live,
            CaseSpec::RunLight { .. } => Mode::RunLight,
        }
    }
}

/// A manifest row that could not be turned into a case
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub reason: String,
}

impl RowError {
    pub fn to_error(&self) -> Error {
        Error::ManifestParse {
            line: self.line,
            reason: self.reason.clone(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error())
    }
}

/// A loaded manifest file
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    content: String,
}

impl Manifest {
    /// Read a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Ok(Self::parse(path, content))
    }

    /// Wrap already loaded manifest text
    pub fn parse(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cases in file order, parsed lazily
    pub fn entries(&self) -> impl Iterator<Item = std::result::Result<TestCase, RowError>> + '_ {
        self.content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| parse_row(idx + 1, line))
    }
}

/// Parse one manifest line; `None` for lines that are skipped
fn parse_row(line_no: usize, line: &str) -> Option<std::result::Result<TestCase, RowError>> {
    let raw = line.trim_end_matches('\r');
    if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
        return None;
    }

    let parts: Vec<String> = raw.split(';').map(|p| p.trim().to_string()).collect();
    let id = parts[0].clone();
    if id.is_empty() {
        return None;
    }
    let name = parts.get(1).cloned().unwrap_or_default();

    let fail = |reason: String| -> Option<std::result::Result<TestCase, RowError>> {
        Some(Err(RowError {
            line: line_no,
            id: Some(id.clone()),
            name: (!name.is_empty()).then(|| name.clone()),
            reason,
        }))
    };

    let Some(mode_token) = parts.get(2).filter(|m| !m.is_empty()) else {
        return fail("missing mode field".to_string());
    };
    let Some(mode) = Mode::parse(mode_token) else {
        return fail(format!("unknown mode '{}'", mode_token));
    };
    if parts.len() < mode.required_fields() {
        return fail(format!(
            "{} rows need at least {} fields, found {}",
            mode,
            mode.required_fields(),
            parts.len()
        ));
    }

    let fields = parts[3..].to_vec();
    let non_empty = |idx: usize| fields.get(idx).filter(|f| !f.is_empty()).cloned();

    let spec = match mode {
        Mode::Offline => CaseSpec::Offline,
        Mode::Live => {
            let Some(input) = non_empty(0) else {
                return fail("live row has an empty input field".to_string());
            };
            let Some(expected) = non_empty(2) else {
                return fail("live row has an empty expected field".to_string());
            };
            CaseSpec::Live {
                input,
                html: non_empty(1),
                expected,
                series_id: non_empty(3),
            }
        }
        Mode::RunLight => {
            let Some(dir) = non_empty(0) else {
                return fail("run-light row has an empty case directory".to_string());
            };
            CaseSpec::RunLight {
                case_dir: PathBuf::from(dir),
            }
        }
    };

    Some(Ok(TestCase {
        id,
        name,
        spec,
        line: line_no,
        raw: raw.to_string(),
    }))
}

/// Restricts a run to cases whose id or name matches one of the terms
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    terms: Vec<String>,
}

impl CaseFilter {
    /// Build a filter from CLI arguments; each argument may hold several
    /// space-separated ids or names
    pub fn new<S: AsRef<str>>(args: &[S]) -> Self {
        let terms = args
            .iter()
            .flat_map(|a| a.as_ref().split_whitespace())
            .map(str::to_string)
            .collect();
        Self { terms }
    }

    pub fn matches(&self, id: &str, name: &str) -> bool {
        self.terms.is_empty() || self.terms.iter().any(|t| t == id || t == name)
    }

    pub fn matches_case(&self, case: &TestCase) -> bool {
        self.matches(&case.id, &case.name)
    }

    pub fn matches_row_error(&self, err: &RowError) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        self.matches(
            err.id.as_deref().unwrap_or_default(),
            err.name.as_deref().unwrap_or_default(),
        )
    }

    /// Apply the filter to manifest entries, keeping their order
    pub fn apply<I>(&self, entries: I) -> Vec<std::result::Result<TestCase, RowError>>
    where
        I: IntoIterator<Item = std::result::Result<TestCase, RowError>>,
    {
        entries
            .into_iter()
            .filter(|entry| match entry {
                Ok(case) => self.matches_case(case),
                Err(err) => self.matches_row_error(err),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
# id;name;mode;...
1;BasicFetch;offline;;;;;

2;BadInput;offline;;;;;
;NoId;offline
3;Crash;offline;;;;;
7;LightUpdate;live;series.csv;overview.html;series_expected.csv;18805
9;Tc3Replay;run-light;TC3
";

    fn cases(content: &str) -> Vec<std::result::Result<TestCase, RowError>> {
        Manifest::parse("tests/test_cases.txt", content).entries().collect()
    }

    #[test]
    fn test_skips_comments_blank_and_empty_id() {
        let ids: Vec<String> = cases(MANIFEST)
            .into_iter()
            .map(|c| c.unwrap().id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "7", "9"]);
    }

    #[test]
    fn test_parses_live_row() {
        let case = cases("7;LightUpdate;live;series.csv;;series_expected.csv\r\n")
            .remove(0)
            .unwrap();
        assert_eq!(case.mode(), Mode::Live);
        assert_eq!(
            case.spec,
            CaseSpec::Live {
                input: "series.csv".to_string(),
                html: None,
                expected: "series_expected.csv".to_string(),
                series_id: None,
            }
        );
        assert_eq!(case.raw, "7;LightUpdate;live;series.csv;;series_expected.csv");
    }

    #[test]
    fn test_short_live_row_is_row_error() {
        let err = cases("4;Short;live;input.csv").remove(0).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.id.as_deref(), Some("4"));
        assert_eq!(err.name.as_deref(), Some("Short"));
        assert!(err.reason.contains("at least 6"));
    }

    #[test]
    fn test_unknown_mode_is_row_error() {
        let err = cases("5;Weird;sideways").remove(0).unwrap_err();
        assert!(err.reason.contains("unknown mode"));
    }

    #[test]
    fn test_mode_tokens() {
        assert_eq!(Mode::parse("PLAIN"), Some(Mode::Offline));
        assert_eq!(Mode::parse("live-update"), Some(Mode::Live));
        assert_eq!(Mode::parse("run_light"), Some(Mode::RunLight));
        assert_eq!(Mode::parse(""), None);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = CaseFilter::new::<&str>(&[]);
        assert_eq!(filter.apply(cases(MANIFEST)).len(), 5);
    }

    #[test]
    fn test_filter_by_id_and_name() {
        let filter = CaseFilter::new(&["3 LightUpdate"]);
        let ids: Vec<String> = filter
            .apply(cases(MANIFEST))
            .into_iter()
            .map(|c| c.unwrap().id)
            .collect();
        assert_eq!(ids, vec!["3", "7"]);
    }

    #[test]
    fn test_filter_with_no_match_is_empty() {
        let filter = CaseFilter::new(&["nope"]);
        assert!(filter.apply(cases(MANIFEST)).is_empty());
    }

    #[test]
    fn test_filter_matches_row_errors_by_id() {
        let entries = cases("4;Short;live\n5;Other;offline\n");
        let kept = CaseFilter::new(&["4"]).apply(entries);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].is_err());
    }

    #[test]
    fn test_filtered_set_is_exact_subset() {
        let all: Vec<TestCase> = cases(MANIFEST).into_iter().map(|c| c.unwrap()).collect();
        let filter = CaseFilter::new(&["1", "Crash", "missing"]);
        let kept: Vec<String> = filter
            .apply(all.iter().cloned().map(Ok))
            .into_iter()
            .map(|c| c.unwrap().id)
            .collect();
        let expected: Vec<String> = all
            .iter()
            .filter(|c| c.id == "1" || c.name == "Crash")
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(kept, expected);
    }
}
