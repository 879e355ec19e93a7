//! Run-light fixture directories
//!
//! Each `tests/run_light/TC*` directory holds a `pristine/` snapshot of the
//! mutable state the program works on. Before every run the working copies
//! are restored from it, so running a case twice gives the same result.

use std::fs;
use std::path::{Path, PathBuf};

use super::manifest::{CaseSpec, TestCase};
use crate::common::{Error, Result};

pub const GAMES_FILE: &str = "games.csv";
pub const SERIES_LIVE_FILE: &str = "series_live.csv";
pub const HASH_DIR: &str = "hashes";
pub const HTML_ROOT: &str = "live_html";
pub const PRISTINE_DIR: &str = "pristine";
pub const NOW_FILE: &str = "now.txt";
const NAME_FILE: &str = "name.txt";

/// Find run-light case directories under `root`
///
/// Only directories with a `pristine/` snapshot are cases. They are
/// returned in natural order, so `TC2` comes before `TC10`, with absolute
/// case directories.
pub fn discover(root: &Path) -> Result<Vec<TestCase>> {
    if !root.is_dir() {
        tracing::warn!("Run-light directory {} does not exist", root.display());
        return Ok(Vec::new());
    }
    let root = root.canonicalize().map_err(|e| Error::file_read(root, e))?;

    let mut dirs = Vec::new();
    for entry in fs::read_dir(&root).map_err(|e| Error::file_read(&root, e))? {
        let path = entry?.path();
        if path.is_dir() && path.join(PRISTINE_DIR).is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort_by_key(|p| natural_key(&dir_name(p)));

    Ok(dirs
        .into_iter()
        .map(|dir| {
            let id = dir_name(&dir);
            let name = read_first_line(&dir.join(NAME_FILE)).unwrap_or_else(|| id.clone());
            TestCase {
                raw: format!("{};{};run-light;{}", id, name, dir.display()),
                id,
                name,
                spec: CaseSpec::RunLight { case_dir: dir },
                line: 0,
            }
        })
        .collect())
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sort key splitting a name into its text prefix and trailing number
fn natural_key(name: &str) -> (String, u64, String) {
    let digits_at = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    let (prefix, rest) = name.split_at(digits_at);
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    let number = digits.parse().unwrap_or(0);
    (prefix.to_string(), number, rest[digits.len()..].to_string())
}

fn read_first_line(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Scoped handle on a reset case directory
///
/// Acquiring restores the working copies from `pristine/`; dropping removes
/// the scratch HTML root whatever the outcome of the case was.
#[derive(Debug)]
pub struct FixtureWorkspace {
    dir: PathBuf,
    now: Option<String>,
}

impl FixtureWorkspace {
    /// Reset `dir` from its pristine snapshot
    pub fn acquire(dir: &Path) -> Result<Self> {
        let pristine = dir.join(PRISTINE_DIR);
        if !pristine.is_dir() {
            return Err(Error::missing_fixture(pristine));
        }

        for file in [GAMES_FILE, SERIES_LIVE_FILE] {
            let source = pristine.join(file);
            let target = dir.join(file);
            if source.is_file() {
                fs::copy(&source, &target)?;
            } else if target.exists() {
                fs::remove_file(&target)?;
            }
        }

        let hashes = dir.join(HASH_DIR);
        reset_dir(&hashes, Some(&pristine.join(HASH_DIR)))?;

        let html_root = dir.join(HTML_ROOT);
        reset_dir(&html_root, Some(&pristine.join(HTML_ROOT)))?;

        let now = read_first_line(&dir.join(NOW_FILE));
        tracing::debug!(
            "Reset {} from pristine (now override: {:?})",
            dir.display(),
            now
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            now,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn games_file(&self) -> PathBuf {
        self.dir.join(GAMES_FILE)
    }

    pub fn series_live_file(&self) -> PathBuf {
        self.dir.join(SERIES_LIVE_FILE)
    }

    pub fn hash_dir(&self) -> PathBuf {
        self.dir.join(HASH_DIR)
    }

    pub fn html_root(&self) -> PathBuf {
        self.dir.join(HTML_ROOT)
    }

    /// Current-time override from `now.txt`
    pub fn now(&self) -> Option<&str> {
        self.now.as_deref()
    }
}

impl Drop for FixtureWorkspace {
    fn drop(&mut self) {
        let html_root = self.html_root();
        if html_root.exists() {
            if let Err(e) = fs::remove_dir_all(&html_root) {
                tracing::warn!("Failed to remove {}: {}", html_root.display(), e);
            }
        }
    }
}

/// Replace `target` with a copy of `seed` (or an empty directory)
fn reset_dir(target: &Path, seed: Option<&Path>) -> Result<()> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;
    if let Some(seed) = seed.filter(|s| s.is_dir()) {
        copy_dir(seed, target)?;
    }
    Ok(())
}

fn copy_dir(source: &Path, target: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to walk '{}': {}",
                source.display(),
                e
            )))
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
