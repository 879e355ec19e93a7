//! Error types for the harness
//!
//! Only harness-level failures (unreadable manifest, bad config) abort a run.
//! Everything that goes wrong inside a single case is turned into an ERROR
//! result by the executor.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Manifest Errors ===
    #[error("Manifest line {line}: {reason}")]
    ManifestParse { line: usize, reason: String },

    // === Fixture Errors ===
    #[error("Missing fixture '{}'", .path.display())]
    MissingFixture { path: PathBuf },

    // === Invocation Errors ===
    #[error("Program '{0}' not found. Check the [programs] section of harness.toml")]
    ProgramNotFound(String),

    #[error("Failed to run '{program}': {error}")]
    InvocationFailed { program: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing fixture error for a path
    pub fn missing_fixture(path: impl Into<PathBuf>) -> Self {
        Self::MissingFixture { path: path.into() }
    }

    /// Create a file read error from an IO error
    pub fn file_read(path: &Path, error: io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create an invocation error
    pub fn invocation_failed(program: &str, error: impl ToString) -> Self {
        Self::InvocationFailed {
            program: program.to_string(),
            error: error.to_string(),
        }
    }
}
