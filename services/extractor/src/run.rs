//! Daily-run orchestration.
//!
//! Sequences the pipeline: idempotency check (automated runs only),
//! filename derivation, extraction, optional upload. Owns the single
//! [`RunMetadata`] instance for the process lifetime and appends its
//! terminal state to the run log — one line per executed invocation,
//! none for a skipped one.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{error, info, warn};

use farm_core::error::FarmError;
use farm_core::filenames;
use farm_core::ledger::{RunKey, RunLedger, RunMetadata, RunMode, RunStatus};

use crate::config::ExtractorConfig;
use crate::extract::Extractor;
use crate::transfer;

/// Terminal outcome of a successful invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Full pipeline executed, metadata logged as done.
    Done,
    /// A prior completed automated run was found; nothing to do.
    Skipped,
}

/// Parse and normalize the run date (`YYYY/MM/DD` -> `YYYYMMDD`).
pub fn build_ymd_day(day_with_slashes: &str) -> Result<String, FarmError> {
    NaiveDate::parse_from_str(day_with_slashes, "%Y/%m/%d")
        .map(|date| date.format("%Y%m%d").to_string())
        .map_err(|e| FarmError::InvalidDate {
            value: day_with_slashes.to_string(),
            message: e.to_string(),
        })
}

pub struct Orchestrator {
    config: ExtractorConfig,
    ledger: RunLedger,
    extractor: Extractor,
}

impl Orchestrator {
    pub fn new(config: ExtractorConfig) -> Self {
        let extractor = Extractor::new(config.model_data.out_value.clone());
        Self::with_extractor(config, extractor)
    }

    /// Use a pre-built extraction stage (tests, non-default tool paths).
    pub fn with_extractor(config: ExtractorConfig, extractor: Extractor) -> Self {
        let ledger = RunLedger::new(config.run_log.clone());
        Self {
            config,
            ledger,
            extractor,
        }
    }

    /// Execute one invocation for a validated config and date.
    ///
    /// Every executed run appends its terminal metadata line, done or fail.
    /// A skipped run leaves the log untouched: the "done" record that
    /// triggered the skip must not be refreshed or duplicated.
    pub fn execute(&self, date_ymd: &str, auto: bool) -> Result<RunOutcome> {
        let mut metadata = RunMetadata::new();
        metadata.time = date_ymd.to_string();
        metadata.run_name = self.config.model_data.run.clone();
        metadata.model_name = self.config.model_data.model_type.clone();
        metadata.grid_name = self.config.model_data.grid.clone();
        metadata.subtype = if auto { RunMode::Auto } else { RunMode::Man };

        match self.run_pipeline(&mut metadata, date_ymd, auto) {
            Ok(RunOutcome::Skipped) => {
                info!(
                    date = %date_ymd,
                    run = %metadata.run_name,
                    "Automated run already completed today, nothing to do"
                );
                Ok(RunOutcome::Skipped)
            }
            Ok(RunOutcome::Done) => {
                self.ledger
                    .append(&metadata)
                    .context("Failed to record completed run")?;
                info!(date = %date_ymd, run = %metadata.run_name, "Run completed");
                Ok(RunOutcome::Done)
            }
            Err(e) => {
                error!(error = %e, metadata = ?metadata, "Run failed");
                if let Err(log_err) = self.ledger.append(&metadata) {
                    warn!(error = %log_err, "Could not record failed run");
                }
                Err(e)
            }
        }
    }

    fn run_pipeline(
        &self,
        metadata: &mut RunMetadata,
        date_ymd: &str,
        auto: bool,
    ) -> Result<RunOutcome> {
        let model = &self.config.model_data;

        // A missing run log means no run has ever been recorded; anything
        // else unreadable is fatal.
        if auto && self.ledger.path().exists() {
            let key = RunKey {
                date_ymd: date_ymd.to_string(),
                run_name: model.run.clone(),
                model_name: model.model_type.clone(),
                grid_name: model.grid.clone(),
            };
            if self.ledger.has_completed_auto_run(&key)? {
                return Ok(RunOutcome::Skipped);
            }
        }

        let tasks = filenames::file_tasks(
            &model.model_type,
            &model.grid,
            date_ymd,
            model.timestep,
            &model.indir,
            &model.out_dir,
            &model.out_prefix,
        )?;

        info!(count = tasks.len(), "Checking model data existence");
        let outputs = self.extractor.run(&tasks, &model.out_dir)?;

        if self.config.ftp.enabled {
            info!(count = outputs.len(), server = %self.config.ftp.server, "FTP upload enabled");
            if !transfer::upload(&self.config.ftp, &outputs) {
                bail!("Something wrong with data transmission");
            }
        }

        metadata.status = RunStatus::Done;
        Ok(RunOutcome::Done)
    }
}
