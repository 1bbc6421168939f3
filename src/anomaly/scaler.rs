//! Per-feature standardization: `(x - mean) / scale`.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::AnomalyError;
use crate::features::FeatureMatrix;

/// Mean and population standard deviation learned per feature.
///
/// A feature with zero (or non-finite) deviation gets a scale of `1.0` so it
/// is centred but not divided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self, AnomalyError> {
        if matrix.n_rows() == 0 {
            return Err(AnomalyError::EmptyTrainingSet);
        }

        let mut mean = Vec::with_capacity(matrix.n_features());
        let mut scale = Vec::with_capacity(matrix.n_features());
        for j in 0..matrix.n_features() {
            let col = matrix.column(j);
            mean.push(col.iter().mean());
            let std = col.iter().population_std_dev();
            scale.push(if std.is_finite() && std > 0.0 { std } else { 1.0 });
        }

        Ok(Self {
            feature_names: matrix.columns.clone(),
            mean,
            scale,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, AnomalyError> {
        if row.len() != self.n_features() {
            return Err(AnomalyError::DimensionMismatch {
                expected: self.n_features(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<Vec<Vec<f64>>, AnomalyError> {
        matrix.rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn fit_transform(matrix: &FeatureMatrix) -> Result<(Self, Vec<Vec<f64>>), AnomalyError> {
        let scaler = Self::fit(matrix)?;
        let scaled = scaler.transform(matrix)?;
        Ok((scaler, scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let width = rows.first().map_or(0, Vec::len);
        FeatureMatrix {
            columns: (0..width).map(|i| format!("f{i}")).collect(),
            rows,
        }
    }

    #[test]
    fn test_fit_population_statistics() {
        let m = matrix(vec![vec![1.0, 5.0], vec![3.0, 5.0]]);
        let scaler = StandardScaler::fit(&m).unwrap();
        assert_eq!(scaler.mean, vec![2.0, 5.0]);
        assert!((scaler.scale[0] - 1.0).abs() < 1e-12);
        // Constant column keeps unit scale
        assert_eq!(scaler.scale[1], 1.0);
    }

    #[test]
    fn test_transform_centres_and_scales() {
        let m = matrix(vec![vec![0.0], vec![10.0]]);
        let (_, scaled) = StandardScaler::fit_transform(&m).unwrap();
        assert!((scaled[0][0] + 1.0).abs() < 1e-12);
        assert!((scaled[1][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let scaler = StandardScaler::fit(&matrix(vec![vec![1.0, 2.0]])).unwrap();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(AnomalyError::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_fit_empty() {
        assert!(matches!(
            StandardScaler::fit(&FeatureMatrix::default()),
            Err(AnomalyError::EmptyTrainingSet)
        ));
    }
}
