//! Train the sensor anomaly detector from the merged dataset.
//!
//! Reads `merged_sensors.csv`, adds rolling-average features, standardizes
//! them and fits an isolation forest. The scaler and forest are written as
//! JSON artifacts next to the data.
//!
//! Usage:
//!   cargo run --bin merge-datasets && cargo run --bin train-anomaly
//!   cargo run --bin train-anomaly -- --input logs/merged.csv --contamination 0.02

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use vehicle_diag::anomaly::{self, save_forest, save_scaler, ForestParams};
use vehicle_diag::config::{self, AssistantConfig};
use vehicle_diag::dataset::csv::read_csv_file;
use vehicle_diag::features::build_feature_matrix;

/// Fit scaler + isolation forest on merged sensor data.
#[derive(Parser)]
#[command(name = "train-anomaly")]
struct Args {
    /// Merged dataset. Defaults to <data-dir>/merged_sensors.csv.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for the model and scaler artifacts. Defaults to the data dir.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the expected anomaly share.
    #[arg(long)]
    contamination: Option<f64>,

    /// Override the random seed.
    #[arg(long)]
    seed: Option<u64>,
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

    let input = args.input.unwrap_or_else(|| training.merged_path());
    if !input.exists() {
        bail!(
            "{} not found. Run merge-datasets first.",
            input.display()
        );
    }
    let output_dir = args.output_dir.unwrap_or_else(|| training.data_dir.clone());

    let mut params = ForestParams::from(training);
    if let Some(c) = args.contamination {
        params.contamination = c;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }

    let table = read_csv_file(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    info!(rows = table.len(), columns = table.width(), "Loaded merged dataset");

    let matrix = build_feature_matrix(&table, &training.base_columns, &training.rolling_windows)
        .context("Failed to build feature matrix")?;
    info!(features = ?matrix.columns, "Training anomaly detector");

    let model = anomaly::train(&matrix, params).context("Training failed")?;

    let model_path = output_dir.join(&training.model_file);
    let scaler_path = output_dir.join(&training.scaler_file);
    save_forest(&model.forest, &model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;
    save_scaler(&model.scaler, &scaler_path)
        .with_context(|| format!("Failed to save scaler to {}", scaler_path.display()))?;

    info!(
        rows = model.rows,
        anomalies = model.anomalies,
        "Model saved to {}, scaler saved to {}",
        model_path.display(),
        scaler_path.display()
    );
    Ok(())
}
