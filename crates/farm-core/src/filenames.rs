//! Forecast-step calendar and FARM filename derivation.
//!
//! FARM concentration files are named `<type>_conc_<grid>_<date><step>.nc`
//! where `<step>` identifies one of five fixed 24-hour prediction windows.

use std::path::{Path, PathBuf};

use crate::error::{FarmError, FarmResult};

/// Allowed timestep range (inclusive).
pub const MIN_TIMESTEP: u32 = 1;
pub const MAX_TIMESTEP: u32 = 10;

/// FARM forecast-step suffixes, one per 24-hour prediction window.
pub const FARM_STEPS: [&str; 5] = ["+000-023", "+024-047", "+048-071", "+072-095", "+096-119"];

/// One extraction unit: a model input file and its extracted output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Derive the ordered input filenames for a run date.
///
/// Produces one name per forecast window, drawn from [`FARM_STEPS`] in
/// calendar order. A timestep beyond the calendar length is a configuration
/// error, not an index past the table.
pub fn concentration_filenames(
    model_type: &str,
    grid: &str,
    date_ymd: &str,
    timestep: u32,
) -> FarmResult<Vec<String>> {
    if !(MIN_TIMESTEP..=MAX_TIMESTEP).contains(&timestep) {
        return Err(FarmError::TimestepOutOfRange(timestep));
    }
    if timestep as usize > FARM_STEPS.len() {
        return Err(FarmError::TimestepBeyondCalendar {
            timestep,
            calendar_len: FARM_STEPS.len(),
        });
    }

    Ok(FARM_STEPS[..timestep as usize]
        .iter()
        .map(|step| format!("{}_conc_{}_{}{}.nc", model_type, grid, date_ymd, step))
        .collect())
}

/// Build the per-file extraction tasks for a run.
///
/// Inputs live under `indir`; each output is the input filename prefixed
/// with `out_prefix` and placed in `out_dir`.
pub fn file_tasks(
    model_type: &str,
    grid: &str,
    date_ymd: &str,
    timestep: u32,
    indir: &Path,
    out_dir: &Path,
    out_prefix: &str,
) -> FarmResult<Vec<FileTask>> {
    let names = concentration_filenames(model_type, grid, date_ymd, timestep)?;

    Ok(names
        .into_iter()
        .map(|name| FileTask {
            input_path: indir.join(&name),
            output_path: out_dir.join(format!("{}{}", out_prefix, name)),
        })
        .collect())
}
