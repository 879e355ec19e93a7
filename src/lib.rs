//! Scrape harness - test runner for the scraping pipeline scripts
//!
//! Reads semicolon-delimited test manifests, invokes the external programs
//! under test and compares their output against expected fixtures.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{CaseFilter, Manifest, RunReport, Status, TestCase, TestResult};
