//! Extractor configuration: YAML loading and validation.
//!
//! The file carries a `model_data` mapping (model input/output parameters),
//! an `ftp` mapping (upload parameters) and the `run_log` path. Loading and
//! validation are separate passes: `load` only deserializes, `validate`
//! enumerates every rejected value as a typed error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use farm_core::error::{FarmError, FarmResult};
use farm_core::filenames::{MAX_TIMESTEP, MIN_TIMESTEP};

/// Root configuration for one extraction run.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    pub model_data: ModelDataConfig,
    pub ftp: FtpConfig,
    /// JSON-lines run history used for the automated-run idempotency check.
    pub run_log: PathBuf,
}

/// FARM model input/output parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDataConfig {
    /// Directory containing the model concentration files.
    pub indir: PathBuf,
    /// Model type, the first component of the input filename (e.g. "farm").
    #[serde(rename = "type")]
    pub model_type: String,
    /// Run name identifying the model run in the ledger.
    pub run: String,
    /// Grid identifier (e.g. "g4").
    pub grid: String,
    /// Number of forecast windows to extract.
    pub timestep: u32,
    /// Prefix prepended to extracted output filenames.
    pub out_prefix: String,
    /// Directory receiving the extracted files.
    pub out_dir: PathBuf,
    /// netCDF variable to subset.
    pub out_value: String,
}

/// FTP upload parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct FtpConfig {
    /// "y" enables the upload stage.
    #[serde(deserialize_with = "de_yes_no")]
    pub enabled: bool,
    pub server: String,
    pub username: String,
    pub password: String,
    pub remote_path: String,
}

/// Accept the historical y/n convention for boolean options.
fn de_yes_no<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected 'y' or 'n', got '{}'",
            other
        ))),
    }
}

impl ExtractorConfig {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ExtractorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject empty values and out-of-range options.
    ///
    /// FTP credentials are only required when the upload stage is enabled.
    pub fn validate(&self) -> FarmResult<()> {
        let model = &self.model_data;

        require_path("model_data.indir", &model.indir)?;
        require_str("model_data.type", &model.model_type)?;
        require_str("model_data.run", &model.run)?;
        require_str("model_data.grid", &model.grid)?;
        require_str("model_data.out_prefix", &model.out_prefix)?;
        require_path("model_data.out_dir", &model.out_dir)?;
        require_str("model_data.out_value", &model.out_value)?;
        require_path("run_log", &self.run_log)?;

        if !(MIN_TIMESTEP..=MAX_TIMESTEP).contains(&model.timestep) {
            return Err(FarmError::TimestepOutOfRange(model.timestep));
        }

        if self.ftp.enabled {
            if self.ftp.server.is_empty() {
                return Err(FarmError::MissingFtpValue("server".to_string()));
            }
            if self.ftp.remote_path.is_empty() {
                return Err(FarmError::MissingFtpValue("remote_path".to_string()));
            }
        }

        Ok(())
    }
}

fn require_str(name: &str, value: &str) -> FarmResult<()> {
    if value.is_empty() {
        return Err(FarmError::EmptyValue(name.to_string()));
    }
    Ok(())
}

fn require_path(name: &str, value: &Path) -> FarmResult<()> {
    if value.as_os_str().is_empty() {
        return Err(FarmError::EmptyValue(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> String {
        r#"
model_data:
  indir: /data/farm/in
  type: farm
  run: r1
  grid: g4
  timestep: 2
  out_prefix: ext_
  out_dir: /data/farm/out
  out_value: SO2

ftp:
  enabled: "n"
  server: ""
  username: ""
  password: ""
  remote_path: ""

run_log: /var/log/farm-extract/runs.jsonl
"#
        .to_string()
    }

    #[test]
    fn test_parse_sample_config() {
        let config: ExtractorConfig = serde_yaml::from_str(&sample_yaml()).unwrap();
        assert_eq!(config.model_data.model_type, "farm");
        assert_eq!(config.model_data.timestep, 2);
        assert!(!config.ftp.enabled);
        assert_eq!(config.run_log, PathBuf::from("/var/log/farm-extract/runs.jsonl"));
        config.validate().unwrap();
    }

    #[test]
    fn test_enabled_accepts_yes_no_convention() {
        let yaml = sample_yaml().replace("enabled: \"n\"", "enabled: \"y\"");
        let config: ExtractorConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.ftp.enabled);

        let yaml = sample_yaml().replace("enabled: \"n\"", "enabled: maybe");
        assert!(serde_yaml::from_str::<ExtractorConfig>(&yaml).is_err());
    }

    #[test]
    fn test_empty_required_value_is_rejected() {
        let yaml = sample_yaml().replace("out_value: SO2", "out_value: \"\"");
        let config: ExtractorConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(FarmError::EmptyValue(name)) if name == "model_data.out_value"
        ));
    }

    #[test]
    fn test_timestep_out_of_range_is_rejected() {
        for bad in ["0", "11"] {
            let yaml = sample_yaml().replace("timestep: 2", &format!("timestep: {}", bad));
            let config: ExtractorConfig = serde_yaml::from_str(&yaml).unwrap();
            assert!(matches!(
                config.validate(),
                Err(FarmError::TimestepOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_enabled_ftp_requires_server_and_remote_path() {
        let yaml = sample_yaml().replace("enabled: \"n\"", "enabled: \"y\"");
        let config: ExtractorConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(FarmError::MissingFtpValue(name)) if name == "server"
        ));

        let yaml = yaml.replace("server: \"\"", "server: ftp.example.org");
        let config: ExtractorConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(FarmError::MissingFtpValue(name)) if name == "remote_path"
        ));
    }

    #[test]
    fn test_missing_section_fails_to_parse() {
        let yaml = r#"
model_data:
  indir: /data/farm/in
  type: farm
  run: r1
  grid: g4
  timestep: 2
  out_prefix: ext_
  out_dir: /data/farm/out
  out_value: SO2

run_log: /var/log/farm-extract/runs.jsonl
"#;
        assert!(serde_yaml::from_str::<ExtractorConfig>(yaml).is_err());
    }
}
