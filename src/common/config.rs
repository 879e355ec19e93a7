//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, LOCAL_CONFIG_FILE};
use super::{Error, Result};
use crate::testing::Mode;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// External programs driven by each mode
    #[serde(default)]
    pub programs: Programs,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,
}

/// The external programs under test
#[derive(Debug, Deserialize, Clone)]
pub struct Programs {
    /// Interpreter used to launch the programs; empty runs them directly
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Program for offline (plain) cases
    #[serde(default = "default_offline")]
    pub offline: PathBuf,

    /// Program for live-update cases
    #[serde(default = "default_live")]
    pub live: PathBuf,

    /// Program for run-light fixture cases
    #[serde(default = "default_run_light")]
    pub run_light: PathBuf,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            offline: default_offline(),
            live: default_live(),
            run_light: default_run_light(),
        }
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_offline() -> PathBuf {
    PathBuf::from("scripts/getGames.py")
}
fn default_live() -> PathBuf {
    PathBuf::from("scripts/updateLightSeriesResults.py")
}
fn default_run_light() -> PathBuf {
    PathBuf::from("scripts/runLightSeriesUpdates.py")
}

/// Default settings
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// Manifest used when no `-tf` is given
    #[serde(default = "default_test_file")]
    pub test_file: PathBuf,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            test_file: default_test_file(),
        }
    }
}

fn default_test_file() -> PathBuf {
    PathBuf::from("tests/test_cases.txt")
}

impl Programs {
    /// Program configured for a mode
    pub fn program_for(&self, mode: Mode) -> &Path {
        match mode {
            Mode::Offline => &self.offline,
            Mode::Live => &self.live,
            Mode::RunLight => &self.run_light,
        }
    }

    /// Interpreter, if one is configured
    pub fn interpreter(&self) -> Option<&str> {
        let trimmed = self.interpreter.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

impl Config {
    /// Load configuration
    ///
    /// Lookup order: the explicit path, `./harness.toml`, the user config
    /// file. Returns default configuration if none exists. An explicit path
    /// that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
