//! Offline Pipeline Integration Tests
//!
//! Merge → features → train → persist → reload, on temporary directories.

use std::path::Path;

use vehicle_diag::anomaly::{self, load_forest, load_scaler, save_forest, save_scaler, ForestParams};
use vehicle_diag::config::TrainingConfig;
use vehicle_diag::dataset::csv::read_csv_file;
use vehicle_diag::dataset::{merge_directory, DatasetError};
use vehicle_diag::features::build_feature_matrix;

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// Battery and motor logs over overlapping timestamps, one spike row.
fn write_sensor_logs(dir: &Path) {
    let mut battery = String::from("Timestamp,SOC,SOH,Battery_Temp\n");
    let mut motor = String::from("timestamp,Motor_RPM,Motor_Torque\n");
    for t in 0..80 {
        battery.push_str(&format!("{t},{}%,97,{}°C\n", 80 - t / 10, 30 + t % 3));
        let rpm = if t == 70 { 9000 } else { 1500 + (t % 5) * 10 };
        motor.push_str(&format!("{},{}RPM,{}\n", t + 5, rpm, 120 + t % 4));
    }
    // One malformed row that must be skipped, not fail the load
    battery.push_str("99,1,2,3,4,5\n");
    write(dir, "battery.csv", &battery);
    write(dir, "motor.csv", &motor);
}

#[test]
fn merge_keeps_every_row_and_writes_output() {
    let dir = tempfile::tempdir().unwrap();
    write_sensor_logs(dir.path());
    let output = dir.path().join("merged_sensors.csv");

    let summary = merge_directory(dir.path(), &output).unwrap();
    assert_eq!(summary.files.len(), 2);
    // Timestamps 0..80 and 5..85 → 85 distinct keys
    assert_eq!(summary.rows, 85);

    let merged = read_csv_file(&output).unwrap();
    assert_eq!(
        merged.columns,
        vec!["timestamp", "soc", "soh", "battery_temp", "motor_rpm", "motor_torque"]
    );
    let rpm = merged.column("motor_rpm").unwrap();
    assert!(rpm[..5].iter().all(Option::is_none));
    assert_eq!(rpm[84], Some("1540RPM"));
    let soc = merged.column("soc").unwrap();
    assert!(soc[80..].iter().all(Option::is_none));
}

#[test]
fn merged_output_reads_back_with_multiline_notes_and_float_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a_battery.csv",
        "timestamp,soc,note\n0.0,80,\"cell 3 warm\nrecheck\"\n1.0,81,\n",
    );
    // No timestamp column: keys 0 and 1 are synthesized and must meet 0.0 and 1.0
    write(dir.path(), "b_motor.csv", "motor_rpm\n900\n950\n");
    let output = dir.path().join("merged_sensors.csv");

    let summary = merge_directory(dir.path(), &output).unwrap();
    assert_eq!(summary.rows, 2);

    let merged = read_csv_file(&output).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.column("timestamp").unwrap(), vec![Some("0"), Some("1")]);
    assert_eq!(merged.column("note").unwrap()[0], Some("cell 3 warm\nrecheck"));
    assert_eq!(merged.column("soc").unwrap(), vec![Some("80"), Some("81")]);
    assert_eq!(merged.column("motor_rpm").unwrap(), vec![Some("900"), Some("950")]);
}

#[test]
fn merge_rejects_legacy_xls() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "old.xls", "binary");
    let err = merge_directory(dir.path(), &dir.path().join("out.csv")).unwrap_err();
    assert!(matches!(err, DatasetError::UnsupportedFormat(_)));
}

#[test]
fn train_and_reload_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_sensor_logs(dir.path());
    let cfg = TrainingConfig {
        data_dir: dir.path().to_path_buf(),
        ..TrainingConfig::default()
    };

    merge_directory(&cfg.data_dir, &cfg.merged_path()).unwrap();
    let table = read_csv_file(&cfg.merged_path()).unwrap();
    let matrix = build_feature_matrix(&table, &cfg.base_columns, &cfg.rolling_windows).unwrap();
    // 5 base columns, each with two moving averages
    assert_eq!(matrix.n_features(), 15);
    assert_eq!(matrix.n_rows(), 85);

    let model = anomaly::train(&matrix, ForestParams::from(&cfg)).unwrap();
    assert!(model.anomalies > 0);
    assert!(model.anomalies <= 5);

    save_forest(&model.forest, &cfg.model_path()).unwrap();
    save_scaler(&model.scaler, &cfg.scaler_path()).unwrap();
    assert!(cfg.model_path().ends_with("anomaly_model.json"));
    assert!(cfg.scaler_path().ends_with("scaler.json"));

    let forest = load_forest(&cfg.model_path()).unwrap();
    let scaler = load_scaler(&cfg.scaler_path()).unwrap();
    assert_eq!(scaler, model.scaler);

    let scaled = scaler.transform(&matrix).unwrap();
    assert_eq!(forest.predict(&scaled).unwrap(), model.forest.predict(&scaled).unwrap());
}
