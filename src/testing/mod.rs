//! Manifest-driven test runner
//!
//! Loads cases from a semicolon-delimited manifest (or discovers run-light
//! fixture directories), runs the external program for each one and
//! collects PASS/FAIL/ERROR results into a report.

pub mod compare;
pub mod executor;
pub mod fixture;
mod manifest;
mod report;

pub use executor::{Executor, RunOptions};
pub use manifest::*;
pub use report::{RunReport, Status, TestResult, Totals};
