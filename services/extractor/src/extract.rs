//! Extraction stage: existence checks plus external netCDF subsetting.
//!
//! The tool is an opaque command (NCO's `ncks` by default). Unlike the
//! transfer stage, this stage is fail-fast: a missing path or a tool failure
//! aborts the remaining tasks, since it indicates a corrupt pipeline run.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use farm_core::error::{FarmError, FarmResult};
use farm_core::filenames::FileTask;

/// Default extraction command.
pub const NCKS_BIN: &str = "ncks";

/// Invokes the extraction tool once per file task.
pub struct Extractor {
    tool: String,
    variable: String,
}

impl Extractor {
    pub fn new(variable: impl Into<String>) -> Self {
        Self::with_tool(NCKS_BIN, variable)
    }

    /// Use an alternate extraction command (tests, non-standard installs).
    pub fn with_tool(tool: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            variable: variable.into(),
        }
    }

    /// Run every task in order, returning the produced output paths.
    ///
    /// Per task: the input must exist and be a regular file, the output
    /// directory must exist, and the tool must exit successfully. The first
    /// violation aborts the whole stage.
    pub fn run(&self, tasks: &[FileTask], out_dir: &Path) -> FarmResult<Vec<PathBuf>> {
        let mut outputs = Vec::with_capacity(tasks.len());

        for task in tasks {
            if !task.input_path.is_file() {
                return Err(FarmError::MissingInput(task.input_path.clone()));
            }
            if !out_dir.is_dir() {
                return Err(FarmError::MissingOutputDir(out_dir.to_path_buf()));
            }

            info!(input = %task.input_path.display(), variable = %self.variable, "Parsing file");
            self.extract_one(task)?;
            outputs.push(task.output_path.clone());
        }

        Ok(outputs)
    }

    fn extract_one(&self, task: &FileTask) -> FarmResult<()> {
        let mut cmd = Command::new(&self.tool);
        cmd.arg("--no-abc")
            .arg("-O")
            .arg("-v")
            .arg(&self.variable)
            .arg(&task.input_path)
            .arg(&task.output_path);

        debug!(command = ?cmd, "Executing extraction tool");

        let status = cmd.status().map_err(|e| FarmError::ExtractionFailed {
            input: task.input_path.display().to_string(),
            message: e.to_string(),
        })?;

        if !status.success() {
            return Err(FarmError::ExtractionFailed {
                input: task.input_path.display().to_string(),
                message: format!("{} exited with {}", self.tool, status),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn task(input: &Path, output: &Path) -> FileTask {
        FileTask {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
        }
    }

    #[test]
    fn test_missing_input_aborts_before_tool_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.nc");
        fs::write(&present, b"x").unwrap();

        let tasks = vec![
            task(&dir.path().join("absent.nc"), &dir.path().join("out1.nc")),
            task(&present, &dir.path().join("out2.nc")),
        ];

        // The tool would fail loudly, but the first task's missing input
        // must abort the stage before any invocation.
        let extractor = Extractor::with_tool("false", "SO2");
        let err = extractor.run(&tasks, dir.path()).unwrap_err();
        assert!(matches!(err, FarmError::MissingInput(p) if p.ends_with("absent.nc")));
    }

    #[test]
    fn test_missing_output_dir_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.nc");
        fs::write(&input, b"x").unwrap();

        let missing_out = dir.path().join("no-such-dir");
        let tasks = vec![task(&input, &missing_out.join("out.nc"))];

        let extractor = Extractor::with_tool("true", "SO2");
        let err = extractor.run(&tasks, &missing_out).unwrap_err();
        assert!(matches!(err, FarmError::MissingOutputDir(p) if p == missing_out));
    }

    #[test]
    fn test_tool_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.nc");
        fs::write(&input, b"x").unwrap();

        let tasks = vec![task(&input, &dir.path().join("out.nc"))];

        let extractor = Extractor::with_tool("false", "SO2");
        assert!(matches!(
            extractor.run(&tasks, dir.path()),
            Err(FarmError::ExtractionFailed { .. })
        ));
    }

    #[test]
    fn test_outputs_collected_in_task_order() {
        let dir = tempfile::tempdir().unwrap();
        let in1 = dir.path().join("in1.nc");
        let in2 = dir.path().join("in2.nc");
        fs::write(&in1, b"x").unwrap();
        fs::write(&in2, b"x").unwrap();

        let out1 = dir.path().join("out1.nc");
        let out2 = dir.path().join("out2.nc");
        let tasks = vec![task(&in1, &out1), task(&in2, &out2)];

        let extractor = Extractor::with_tool("true", "SO2");
        let outputs = extractor.run(&tasks, dir.path()).unwrap();
        assert_eq!(outputs, vec![out1, out2]);
    }
}
