//! Test-data layout and configuration paths
//!
//! The fixture tree is convention based and always lives under `tests/`
//! relative to the working directory:
//!
//! ```text
//! tests/
//!   test_cases.txt      default manifest
//!   input/              live-update inputs
//!   html/               live-update HTML snapshots
//!   expected/           live-update expected outputs
//!   tmp/                scratch area (filtered manifests, logs, outputs)
//!   run_light/TC*/      run-light fixture directories
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the platform configuration directory
const APP_NAME: &str = "scrape-harness";

/// Local configuration file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "harness.toml";

/// Resolved locations of the fixture tree
#[derive(Debug, Clone)]
pub struct TestLayout {
    root: PathBuf,
}

impl TestLayout {
    /// Layout rooted at `<base>/tests`
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            root: base.as_ref().join("tests"),
        }
    }

    /// Layout rooted at `./tests`
    pub fn current() -> Self {
        Self::new(".")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    pub fn html_dir(&self) -> PathBuf {
        self.root.join("html")
    }

    pub fn expected_dir(&self) -> PathBuf {
        self.root.join("expected")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn run_light_dir(&self) -> PathBuf {
        self.root.join("run_light")
    }

    /// Ensure the scratch directory exists
    pub fn ensure_tmp_dir(&self) -> io::Result<PathBuf> {
        let dir = self.tmp_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl Default for TestLayout {
    fn default() -> Self {
        Self::current()
    }
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/scrape-harness/`
/// - macOS: `~/Library/Application Support/scrape-harness/`
/// - Windows: `%APPDATA%\scrape-harness\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Turn an arbitrary case label into something safe for a file name
pub fn sanitize_file_stem(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "case".to_string()
    } else {
        stem
    }
}
