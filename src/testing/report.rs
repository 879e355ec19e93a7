//! Run results and the summary table

use serde::Serialize;
use std::fmt;

use super::manifest::{RowError, TestCase};

/// Outcome of a single case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Exact match and zero exit code
    Pass,
    /// Comparison mismatch or a FAIL reported by the program
    Fail,
    /// Missing fixture, bad manifest row, crash or unexpected exit code
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a test run
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub id: String,
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TestResult {
    pub fn new(case: &TestCase, status: Status, detail: Option<String>) -> Self {
        Self {
            id: case.id.clone(),
            name: case.name.clone(),
            status,
            detail,
        }
    }

    /// ERROR result for a manifest row that failed to parse
    pub fn from_row_error(err: &RowError) -> Self {
        Self {
            id: err.id.clone().unwrap_or_else(|| format!("line {}", err.line)),
            name: err.name.clone().unwrap_or_default(),
            status: Status::Error,
            detail: Some(err.to_string()),
        }
    }
}

/// Totals by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
}

/// All results of one harness invocation, in execution order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<TestResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    pub fn totals(&self) -> Totals {
        let mut totals = Totals {
            total: self.results.len(),
            ..Totals::default()
        };
        for result in &self.results {
            match result.status {
                Status::Pass => totals.pass += 1,
                Status::Fail => totals.fail += 1,
                Status::Error => totals.error += 1,
            }
        }
        totals
    }

    /// 0 only when nothing failed or errored
    pub fn exit_code(&self) -> i32 {
        let totals = self.totals();
        if totals.fail == 0 && totals.error == 0 {
            0
        } else {
            1
        }
    }

    /// JSON document with the results and totals
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&serde_json::json!({
            "results": self.results,
            "totals": self.totals(),
            "exit_code": self.exit_code(),
        }))
    }

    /// Fixed-width ID/NAME/RESULT table followed by the totals
    pub fn render_table(&self) -> String {
        let id_width = self
            .results
            .iter()
            .map(|r| r.id.chars().count())
            .max()
            .unwrap_or(0)
            .max("ID".len());
        let name_width = self
            .results
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("NAME".len());

        let mut out = String::new();
        out.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  RESULT\n",
            "ID", "NAME"
        ));
        out.push_str(&format!(
            "{}  {}  {}\n",
            "-".repeat(id_width),
            "-".repeat(name_width),
            "-".repeat("RESULT".len())
        ));
        for result in &self.results {
            out.push_str(&format!(
                "{:<id_width$}  {:<name_width$}  {}\n",
                result.id, result.name, result.status
            ));
        }

        let totals = self.totals();
        out.push('\n');
        out.push_str(&format!("TOTAL: {}\n", totals.total));
        out.push_str(&format!("PASS:  {}\n", totals.pass));
        out.push_str(&format!("FAIL:  {}\n", totals.fail));
        out.push_str(&format!("ERROR: {}\n", totals.error));
        out
    }
}
