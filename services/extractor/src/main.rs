//! FARM model concentration extraction service.
//!
//! Derives the expected daily FARM netCDF filenames, extracts a variable
//! subset from each via an external tool (ncks), and optionally uploads the
//! results over FTP. Automated runs are idempotent per
//! (date, run, model, grid) via a JSON-lines run log.

mod config;
mod extract;
mod run;
mod transfer;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ExtractorConfig;
use run::Orchestrator;

#[derive(Parser, Debug)]
#[command(name = "farm-extract")]
#[command(about = "Daily FARM model concentration extraction and upload", version)]
struct Args {
    /// Location of the configuration file
    config: PathBuf,

    /// Model data day YYYY/MM/DD (default: today)
    #[arg(short, long)]
    date: Option<String>,

    /// Automated mode: skip if a completed run is already logged for the day
    #[arg(long)]
    auto: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting FARM extraction run");

    let day = args
        .date
        .unwrap_or_else(|| Local::now().format("%Y/%m/%d").to_string());
    let date_ymd = run::build_ymd_day(&day)?;

    let config = ExtractorConfig::load(&args.config)?;
    config.validate()?;
    info!(
        model = %config.model_data.model_type,
        grid = %config.model_data.grid,
        date = %date_ymd,
        auto = args.auto,
        "Configuration validated"
    );

    let orchestrator = Orchestrator::new(config);
    orchestrator.execute(&date_ymd, args.auto)?;

    Ok(())
}
