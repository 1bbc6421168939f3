//! Anomaly Model - standard scaler + isolation forest over sensor features
//!
//! The offline training step builds a [`FeatureMatrix`] from the merged
//! sensor table, standardizes it with a [`StandardScaler`] and fits an
//! [`IsolationForest`]. Both are persisted as versioned JSON artifacts next
//! to the data.
//!
//! ## Usage
//!
//! ```ignore
//! let model = train(&matrix, ForestParams::from(&cfg.training))?;
//! save_scaler(&model.scaler, &cfg.training.scaler_path())?;
//! save_forest(&model.forest, &cfg.training.model_path())?;
//! ```

pub mod artifacts;
pub mod isolation_forest;
pub mod scaler;

pub use artifacts::{load_forest, load_scaler, save_forest, save_scaler, ARTIFACT_SCHEMA_VERSION};
pub use isolation_forest::{ForestParams, IsolationForest};
pub use scaler::StandardScaler;

use thiserror::Error;
use tracing::info;

use crate::features::FeatureMatrix;

#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Feature count mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid forest parameters: {0}")]
    InvalidParams(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema version mismatch: file has v{0}, expected v{1}")]
    SchemaMismatch(u32, u32),

    #[error("Wrong artifact kind: expected {expected}, found {found}")]
    WrongArtifact { expected: String, found: String },
}

/// A fitted scaler/forest pair plus training-set statistics.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
    pub rows: usize,
    /// Training rows predicted as anomalies.
    pub anomalies: usize,
}

/// Standardize `matrix` and fit the forest on the scaled rows.
pub fn train(matrix: &FeatureMatrix, params: ForestParams) -> Result<TrainedModel, AnomalyError> {
    let (scaler, scaled) = StandardScaler::fit_transform(matrix)?;
    let forest = IsolationForest::fit(&scaled, params)?;
    let anomalies = forest.predict(&scaled)?.iter().filter(|&&l| l == -1).count();

    info!(
        rows = scaled.len(),
        features = scaler.n_features(),
        anomalies,
        "Anomaly detector trained"
    );
    Ok(TrainedModel {
        scaler,
        forest,
        rows: scaled.len(),
        anomalies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_end_to_end() {
        let mut rows: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![80.0 + f64::from(i % 5), 900.0 + f64::from(i % 3) * 10.0])
            .collect();
        rows.push(vec![5.0, 7000.0]);
        let matrix = FeatureMatrix {
            columns: vec!["soc".into(), "motor_rpm".into()],
            rows,
        };

        let model = train(&matrix, ForestParams::default()).unwrap();
        assert_eq!(model.rows, 61);
        assert!(model.anomalies >= 1);
        assert_eq!(model.scaler.feature_names, matrix.columns);

        let scaled = model.scaler.transform(&matrix).unwrap();
        assert_eq!(model.forest.predict(&scaled[60..]).unwrap(), vec![-1]);
    }

    #[test]
    fn test_train_empty_matrix() {
        assert!(matches!(
            train(&FeatureMatrix::default(), ForestParams::default()),
            Err(AnomalyError::EmptyTrainingSet)
        ));
    }
}
