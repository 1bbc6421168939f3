//! Merge every sensor log in the data directory into one CSV.
//!
//! Loads each `.csv` / `.xlsx` file (sorted by name), normalizes column
//! names, outer-joins them on `timestamp` and writes `merged_sensors.csv`.
//!
//! Usage:
//!   cargo run --bin merge-datasets
//!   cargo run --bin merge-datasets -- --data-dir logs/ --output logs/merged.csv

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use vehicle_diag::config::{self, AssistantConfig};
use vehicle_diag::dataset::merge_directory;

/// Merge vehicle sensor logs on timestamp.
#[derive(Parser)]
#[command(name = "merge-datasets")]
struct Args {
    /// Directory holding the sensor logs. Defaults to the configured data dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Output CSV path. Defaults to <data-dir>/merged_sensors.csv.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    config::init(AssistantConfig::load());
    let training = &config::get().training;

    let data_dir = args.data_dir.unwrap_or_else(|| training.data_dir.clone());
    let output = args
        .output
        .unwrap_or_else(|| data_dir.join(&training.merged_file));

    let summary = merge_directory(&data_dir, &output)
        .with_context(|| format!("Failed to merge datasets in {}", data_dir.display()))?;

    info!(
        files = summary.files.len(),
        rows = summary.rows,
        columns = summary.columns,
        "Final merged shape"
    );
    info!("Merged dataset saved to {}", summary.output.display());
    Ok(())
}
