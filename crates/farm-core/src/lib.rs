//! Shared types for the FARM concentration extraction pipeline.
//!
//! - `error`: the pipeline error taxonomy
//! - `filenames`: forecast-step calendar and input/output filename derivation
//! - `ledger`: run metadata and the append-only JSON-lines run log

pub mod error;
pub mod filenames;
pub mod ledger;

pub use error::{FarmError, FarmResult};
pub use filenames::FileTask;
pub use ledger::{RunLedger, RunMetadata};
