use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::testing::{Parameter, TestResult};

const RESULT_SUFFIX: &str = "-result.json";
const ENVIRONMENT_FILE: &str = "environment.json";

/// Directory the scenario writes into and the report generator reads from.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    path: PathBuf,
}

impl ResultsDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    pub fn write_result(&self, result: &TestResult) -> Result<PathBuf> {
        let file = self.path.join(format!("{}{RESULT_SUFFIX}", result.uuid));
        let raw = serde_json::to_string_pretty(result)?;
        fs::write(&file, raw)?;
        Ok(file)
    }

    pub fn write_environment(&self, environment: &[Parameter]) -> Result<()> {
        let raw = serde_json::to_string_pretty(environment)?;
        fs::write(self.path.join(ENVIRONMENT_FILE), raw)?;
        Ok(())
    }

    /// Every stored result, oldest first. A missing directory reads as empty;
    /// unparseable files are skipped with a warning.
    pub fn load_results(&self) -> Result<Vec<TestResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            let is_result = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(RESULT_SUFFIX));
            if !is_result {
                continue;
            }

            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str::<TestResult>(&raw) {
                Ok(result) => results.push(result),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable result"),
            }
        }

        results.sort_by_key(|r| r.start);
        debug!(count = results.len(), dir = %self.path.display(), "results loaded");
        Ok(results)
    }

    pub fn load_environment(&self) -> Result<Vec<Parameter>> {
        let file = self.path.join(ENVIRONMENT_FILE);
        if !file.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&file)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Remove `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}
