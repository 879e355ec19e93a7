//! End-to-end tests for the harness CLI
//!
//! These tests run the built `harness` binary inside a scratch working
//! directory with small shell scripts standing in for the scraping programs.

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::process::Command;

const OFFLINE_SCRIPT: &str = r#"
row=$(cat "$2")
case "$row" in
  1\;*) echo "fetched 12 games"; exit 0 ;;
  2\;*) echo "ASSERTION FAIL: mismatch"; exit 2 ;;
  *) echo "python3: can't open file" >&2; exit 127 ;;
esac
"#;

const LIVE_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --input) src="$2"; shift 2 ;;
    --output) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
sort -r "$src" > "$out"
"#;

const RUN_LIGHT_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --series-live-file) live="$2"; shift 2 ;;
    --hash-dir) hashes="$2"; shift 2 ;;
    --now) now="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "18805;$now;0" >> "$live"
printf '%s;f00d\n' "$(date +%s)" > "$hashes/series_live_18805.hash"
"#;

/// Test context with a scratch working directory
struct TestContext {
    /// Working directory the harness runs in
    work_dir: PathBuf,
    /// Isolated XDG config home so user configuration is never picked up
    config_home: PathBuf,
    _temp: tempfile::TempDir,
}

impl TestContext {
    /// Create a working directory with the fixture layout and stub programs
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let work_dir = temp.path().join("work");
        let config_home = temp.path().join("config");
        let bin = work_dir.join("bin");

        for dir in [
            bin.clone(),
            config_home.clone(),
            work_dir.join("tests/input"),
            work_dir.join("tests/expected"),
            work_dir.join("tests/run_light"),
        ] {
            fs::create_dir_all(dir).expect("Failed to create dir");
        }

        fs::write(bin.join("offline.sh"), OFFLINE_SCRIPT).unwrap();
        fs::write(bin.join("live.sh"), LIVE_SCRIPT).unwrap();
        fs::write(bin.join("run_light.sh"), RUN_LIGHT_SCRIPT).unwrap();
        fs::write(
            work_dir.join("harness.toml"),
            r#"
[programs]
interpreter = "sh"
offline = "bin/offline.sh"
live = "bin/live.sh"
run_light = "bin/run_light.sh"
"#,
        )
        .unwrap();

        Self {
            work_dir,
            config_home,
            _temp: temp,
        }
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.work_dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.work_dir.join(relative)
    }

    /// Run the harness with the given arguments
    fn run_harness(&self, args: &[&str]) -> HarnessOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_harness"))
            .args(args)
            .current_dir(&self.work_dir)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run harness");

        HarnessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        }
    }
}

/// Output from a harness invocation
#[derive(Debug)]
struct HarnessOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

fn result_line<'a>(stdout: &'a str, id: &str) -> &'a str {
    stdout
        .lines()
        .find(|l| l.split_whitespace().next() == Some(id) && !l.starts_with('['))
        .unwrap_or_else(|| panic!("no table row for {id} in:\n{stdout}"))
}

const OFFLINE_MANIFEST: &str = "\
# id;name;mode;startdate;enddate;arenahost;file
1;BasicFetch;offline;;;;;
2;BadInput;offline;;;;;
3;Crash;offline;;;;;
";

#[test]
fn test_offline_run_reports_each_status() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);

    let out = ctx.run_harness(&["run"]);
    assert_eq!(out.code, Some(1), "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert!(result_line(&out.stdout, "1").ends_with("PASS"));
    assert!(result_line(&out.stdout, "2").ends_with("FAIL"));
    assert!(result_line(&out.stdout, "3").ends_with("ERROR"));
    assert!(out.stdout.contains("TOTAL: 3"));
    assert!(out.stdout.contains("ASSERTION FAIL: mismatch"));
}

#[test]
fn test_filter_selects_single_case() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);

    let out = ctx.run_harness(&["run", "1"]);
    assert_eq!(out.code, Some(0), "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert!(out.stdout.contains("TOTAL: 1"));
    assert!(out.stdout.contains("PASS:  1"));
}

#[test]
fn test_filter_accepts_space_separated_names() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);

    let out = ctx.run_harness(&["run", "BasicFetch Crash"]);
    assert_eq!(out.code, Some(1));
    assert!(out.stdout.contains("TOTAL: 2"));
    assert!(out.stdout.contains("ERROR: 1"));
}

#[test]
fn test_filter_without_matches_is_empty_run() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);

    let out = ctx.run_harness(&["run", "99"]);
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("TOTAL: 0"));
}

#[test]
fn test_short_tf_flag_overrides_manifest() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);
    ctx.write("tests/only_pass.txt", "1;BasicFetch;offline;;;;;\n");

    let out = ctx.run_harness(&["run", "-tf", "tests/only_pass.txt"]);
    assert_eq!(out.code, Some(0), "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert!(out.stdout.contains("TOTAL: 1"));
}

#[test]
fn test_missing_manifest_is_harness_error() {
    let ctx = TestContext::new();

    let out = ctx.run_harness(&["run", "--test-file", "tests/nope.txt"]);
    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("Error:"));
    assert!(out.stderr.contains("nope.txt"));
}

#[test]
fn test_live_case_sorted_comparison() {
    let ctx = TestContext::new();
    ctx.write("tests/input/series.csv", "18805001;A;B\n18805000;C;D\n");
    ctx.write(
        "tests/expected/series_expected.csv",
        "18805000;C;D\r\n18805001;A;B\r\n",
    );
    ctx.write(
        "tests/test_cases.txt",
        "7;LightUpdate;live;series.csv;;series_expected.csv;18805\n\
         8;NoExpected;live;series.csv;;missing.csv;18805\n",
    );

    let out = ctx.run_harness(&["run"]);
    assert_eq!(out.code, Some(1));
    assert!(result_line(&out.stdout, "7").ends_with("PASS"));
    assert!(result_line(&out.stdout, "8").ends_with("ERROR"));
    assert!(out.stdout.contains("missing.csv"));
}

fn write_run_light_case(ctx: &TestContext, name: &str) {
    let base = format!("tests/run_light/{name}");
    ctx.write(&format!("{base}/pristine/series_live.csv"), "series_id;last_polled;done\n");
    ctx.write(&format!("{base}/pristine/games.csv"), "1;A;B\n");
    fs::create_dir_all(ctx.path(&format!("{base}/pristine/hashes"))).unwrap();
    ctx.write(&format!("{base}/now.txt"), "2025-11-30 18:00\n");
    ctx.write(
        &format!("{base}/expected/series_live.csv"),
        "series_id;last_polled;done\n18805;2025-11-30 18:00;0\n",
    );
    ctx.write(&format!("{base}/expected/games.csv"), "1;A;B\n");
    ctx.write(
        &format!("{base}/expected/hashes/series_live_18805.hash"),
        "1600000000;f00d\n",
    );
}

#[test]
fn test_run_light_discovery_is_repeatable() {
    let ctx = TestContext::new();
    write_run_light_case(&ctx, "TC1");
    write_run_light_case(&ctx, "TC2");

    let first = ctx.run_harness(&["run-light"]);
    assert_eq!(first.code, Some(0), "stdout: {}\nstderr: {}", first.stdout, first.stderr);
    assert!(first.stdout.contains("TOTAL: 2"));

    let second = ctx.run_harness(&["run-light", "TC2"]);
    assert_eq!(second.code, Some(0));
    assert!(second.stdout.contains("TOTAL: 1"));
    assert!(!ctx.path("tests/run_light/TC2/live_html").exists());
}

#[test]
fn test_run_light_manifest_row_passes() {
    let ctx = TestContext::new();
    write_run_light_case(&ctx, "TC1");
    ctx.write("tests/test_cases.txt", "TC1;Replay;run-light;TC1\n");

    for _ in 0..2 {
        let out = ctx.run_harness(&["run"]);
        assert_eq!(out.code, Some(0), "stdout: {}\nstderr: {}", out.stdout, out.stderr);
        assert!(result_line(&out.stdout, "TC1").ends_with("PASS"));
        assert!(out.stdout.contains("TOTAL: 1"));
    }
    assert_eq!(
        fs::read_to_string(ctx.path("tests/run_light/TC1/series_live.csv")).unwrap(),
        "series_id;last_polled;done\n18805;2025-11-30 18:00;0\n"
    );
}

#[test]
fn test_json_report() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);

    let out = ctx.run_harness(&["run", "--json", "1 2"]);
    assert_eq!(out.code, Some(1));
    let json: serde_json::Value = serde_json::from_str(&out.stdout).expect("stdout is JSON");
    assert_eq!(json["totals"]["total"], 2);
    assert_eq!(json["totals"]["fail"], 1);
    assert_eq!(json["results"][0]["status"], "PASS");
}

#[test]
fn test_list_cases() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", "1;BasicFetch;offline\n4;Short;live\n");

    let out = ctx.run_harness(&["list"]);
    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("BasicFetch"));
    assert!(out.stdout.contains("invalid"));
}

#[test]
fn test_scratch_files_are_removed() {
    let ctx = TestContext::new();
    ctx.write("tests/test_cases.txt", OFFLINE_MANIFEST);

    ctx.run_harness(&["run"]);
    let tmp = ctx.path("tests/tmp");
    let leftovers: Vec<PathBuf> = fs::read_dir(&tmp)
        .map(|rd| rd.map(|e| e.unwrap().path()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
}
