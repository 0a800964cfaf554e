//! Run metadata and the append-only run ledger.
//!
//! Every executed invocation leaves exactly one JSON line in the run log,
//! carrying its terminal [`RunMetadata`]. Automated runs consult the same
//! file to detect a previously completed run for the day and skip it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FarmError, FarmResult};

/// Service identifier written to every run record.
pub const SERVICE_NAME: &str = "farm-extract";

/// Invocation mode: scheduler-triggered (idempotent) or manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Auto,
    Man,
}

/// Terminal status of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Fail,
    Done,
}

/// Description of one pipeline invocation, mutated in place as the run
/// progresses and written to the run log in its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Run date, YYYYMMDD.
    pub time: String,
    pub service: String,
    pub run_name: String,
    pub model_name: String,
    pub grid_name: String,
    #[serde(rename = "type")]
    pub run_type: String,
    pub subtype: RunMode,
    pub status: RunStatus,
}

impl RunMetadata {
    /// A fresh record: nothing known yet, assume manual and failed.
    pub fn new() -> Self {
        Self {
            time: String::new(),
            service: SERVICE_NAME.to_string(),
            run_name: String::new(),
            model_name: String::new(),
            grid_name: String::new(),
            run_type: "run".to_string(),
            subtype: RunMode::Man,
            status: RunStatus::Fail,
        }
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of the run log.
#[derive(Debug, Serialize, Deserialize)]
struct RunRecord {
    #[serde(default)]
    logged_at: String,
    metadata: RunMetadata,
}

/// Lookup key for the automated-run idempotency check.
#[derive(Debug, Clone)]
pub struct RunKey {
    pub date_ymd: String,
    pub run_name: String,
    pub model_name: String,
    pub grid_name: String,
}

/// Append-only JSON-lines run history.
///
/// Writers only append; readers only scan forward. Each invocation is a
/// short-lived process, so no file locking is used.
pub struct RunLedger {
    path: PathBuf,
}

impl RunLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff some record shows a completed automated run for this key.
    ///
    /// A record matches only on exact equality of all compared fields:
    /// date, service, run name, model name, grid name, type "run",
    /// subtype "auto" and status "done". Lines that do not parse as run
    /// records are skipped; an unopenable file is an error (the caller
    /// decides how to treat an absent one).
    pub fn has_completed_auto_run(&self, key: &RunKey) -> FarmResult<bool> {
        let file = File::open(&self.path).map_err(|source| FarmError::LedgerRead {
            path: self.path.display().to_string(),
            source,
        })?;

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| FarmError::LedgerRead {
                path: self.path.display().to_string(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let record: RunRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(_) => continue,
            };

            let m = &record.metadata;
            if m.time == key.date_ymd
                && m.service == SERVICE_NAME
                && m.run_name == key.run_name
                && m.model_name == key.model_name
                && m.grid_name == key.grid_name
                && m.run_type == "run"
                && m.subtype == RunMode::Auto
                && m.status == RunStatus::Done
            {
                debug!(
                    date = %key.date_ymd,
                    run = %key.run_name,
                    "Found a completed automated run"
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Append the terminal metadata of one invocation as a single line.
    pub fn append(&self, metadata: &RunMetadata) -> FarmResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| FarmError::LedgerWrite {
                path: self.path.display().to_string(),
                source,
            })?;

        let record = RunRecord {
            logged_at: Utc::now().to_rfc3339(),
            metadata: metadata.clone(),
        };
        let line = serde_json::to_string(&record)?;

        writeln!(file, "{}", line).map_err(|source| FarmError::LedgerWrite {
            path: self.path.display().to_string(),
            source,
        })
    }
}
