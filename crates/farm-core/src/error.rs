//! Error types for the FARM extraction pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using FarmError.
pub type FarmResult<T> = Result<T, FarmError>;

/// Primary error type for extraction runs.
#[derive(Debug, Error)]
pub enum FarmError {
    // === Validation errors ===
    #[error("Invalid date '{value}': {message}")]
    InvalidDate { value: String, message: String },

    #[error("Timestep {0} is out of the allowed range 1..=10")]
    TimestepOutOfRange(u32),

    #[error("Timestep {timestep} exceeds the forecast window calendar ({calendar_len} windows)")]
    TimestepBeyondCalendar { timestep: u32, calendar_len: usize },

    // === Configuration errors ===
    #[error("Empty value for required option '{0}'")]
    EmptyValue(String),

    #[error("FTP upload is enabled but '{0}' is empty")]
    MissingFtpValue(String),

    // === Filesystem errors ===
    #[error("Input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Output directory does not exist: {}", .0.display())]
    MissingOutputDir(PathBuf),

    // === External extraction tool ===
    #[error("Extraction tool failed for {input}: {message}")]
    ExtractionFailed { input: String, message: String },

    // === Run ledger ===
    #[error("Cannot read run log {path}: {source}")]
    LedgerRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot write run log {path}: {source}")]
    LedgerWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot encode run record: {0}")]
    LedgerEncode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
