//! Versioned JSON persistence for the fitted scaler and forest.
//!
//! Each file wraps its payload with a schema version, an artifact kind and
//! the training timestamp. Loading rejects files written with another schema
//! version or holding a different kind of artifact.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AnomalyError, IsolationForest, StandardScaler};

/// Schema version for persistence compatibility
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

pub const SCALER_KIND: &str = "standard_scaler";
pub const FOREST_KIND: &str = "isolation_forest";

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactFile<T> {
    schema_version: u32,
    kind: String,
    trained_at: DateTime<Utc>,
    payload: T,
}

fn save_artifact<T: Serialize>(kind: &str, payload: &T, path: &Path) -> Result<(), AnomalyError> {
    let file = ArtifactFile {
        schema_version: ARTIFACT_SCHEMA_VERSION,
        kind: kind.to_string(),
        trained_at: Utc::now(),
        payload,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), kind, "Artifact saved");
    Ok(())
}

fn load_artifact<T: DeserializeOwned>(kind: &str, path: &Path) -> Result<T, AnomalyError> {
    let json = std::fs::read_to_string(path)?;

    // Check the envelope first so a version bump reports as such rather
    // than as a payload parse failure
    #[derive(Deserialize)]
    struct Header {
        schema_version: u32,
        kind: String,
    }
    let header: Header = serde_json::from_str(&json)?;
    if header.schema_version != ARTIFACT_SCHEMA_VERSION {
        return Err(AnomalyError::SchemaMismatch(
            header.schema_version,
            ARTIFACT_SCHEMA_VERSION,
        ));
    }
    if header.kind != kind {
        return Err(AnomalyError::WrongArtifact {
            expected: kind.to_string(),
            found: header.kind,
        });
    }

    let file: ArtifactFile<T> = serde_json::from_str(&json)?;
    Ok(file.payload)
}

pub fn save_scaler(scaler: &StandardScaler, path: &Path) -> Result<(), AnomalyError> {
    save_artifact(SCALER_KIND, scaler, path)
}

pub fn load_scaler(path: &Path) -> Result<StandardScaler, AnomalyError> {
    load_artifact(SCALER_KIND, path)
}

pub fn save_forest(forest: &IsolationForest, path: &Path) -> Result<(), AnomalyError> {
    save_artifact(FOREST_KIND, forest, path)
}

pub fn load_forest(path: &Path) -> Result<IsolationForest, AnomalyError> {
    load_artifact(FOREST_KIND, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::ForestParams;

    fn scaler() -> StandardScaler {
        StandardScaler {
            feature_names: vec!["soc".into()],
            mean: vec![50.0],
            scale: vec![2.0],
        }
    }

    #[test]
    fn test_scaler_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scaler.json");
        save_scaler(&scaler(), &path).unwrap();
        assert_eq!(load_scaler(&path).unwrap(), scaler());
    }

    #[test]
    fn test_forest_persists_and_scores_identically() {
        let data: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i), f64::from(i % 7)]).collect();
        let forest = IsolationForest::fit(&data, ForestParams::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomaly_model.json");
        save_forest(&forest, &path).unwrap();

        let loaded = load_forest(&path).unwrap();
        assert_eq!(
            loaded.score_samples(&data).unwrap(),
            forest.score_samples(&data).unwrap()
        );
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        save_scaler(&scaler(), &path).unwrap();
        let text = std::fs::read_to_string(&path)
            .unwrap()
            .replace("\"schema_version\": 1", "\"schema_version\": 99");
        std::fs::write(&path, text).unwrap();

        assert!(matches!(
            load_scaler(&path),
            Err(AnomalyError::SchemaMismatch(99, ARTIFACT_SCHEMA_VERSION))
        ));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        save_scaler(&scaler(), &path).unwrap();
        assert!(matches!(
            load_forest(&path),
            Err(AnomalyError::WrongArtifact { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_scaler(Path::new("/nonexistent/scaler.json")),
            Err(AnomalyError::Io(_))
        ));
    }
}
