//! Feature Engineering - numeric cleanup and rolling averages
//!
//! Raw sensor exports mix units into values (`943RPM`, `36.5°C`) and
//! occasionally write exponents without the `e` (`1.23-10`). Cells are
//! cleaned into `f64`, then each base column gets trailing moving averages.
//!
//! The resulting [`FeatureMatrix`] is laid out as every base column present
//! in the table, followed by their moving averages in the same order
//! (`soc_ma_5`, `soc_ma_10`, `soh_ma_5`, ...). Missing values become `0.0`.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::dataset::DataTable;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("None of the feature columns are present (expected any of: {})", .0.join(", "))]
    NoFeatureColumns(Vec<String>),
    #[error("Dataset has no rows")]
    EmptyDataset,
}

// ============================================================================
// Cleaning
// ============================================================================

#[allow(clippy::expect_used)]
fn non_numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9eE.\-]").expect("valid regex literal"))
}

#[allow(clippy::expect_used)]
fn broken_exponent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9])-([0-9]+)$").expect("valid regex literal"))
}

/// Parse a raw cell into a number.
///
/// Everything except digits, `.`, `-`, `e` and `E` is stripped and a
/// trailing `d-d` is read as an exponent. A missing or fully stripped cell
/// is `0.0`; anything left that still does not parse is `NaN`.
pub fn clean_numeric(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let stripped = non_numeric_re().replace_all(raw, "");
    if stripped.is_empty() {
        return 0.0;
    }
    let repaired = broken_exponent_re().replace(&stripped, "${1}e-${2}");
    repaired.parse::<f64>().unwrap_or(f64::NAN)
}

/// Clean every cell of a column.
pub fn clean_column(cells: &[Option<&str>]) -> Vec<f64> {
    cells.iter().map(|c| clean_numeric(*c)).collect()
}

/// Trailing mean over `window` values, at least one observation required.
///
/// `NaN` values are skipped inside the window; a window with no finite
/// value yields `NaN`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect()
}

/// Name of the moving-average column for `column` over `window`.
pub fn moving_average_name(column: &str, window: usize) -> String {
    format!("{column}_ma_{window}")
}

// ============================================================================
// Feature Matrix
// ============================================================================

/// Dense row-major feature matrix with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Copy out one feature column.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[j]).collect()
    }
}

/// Add cleaned base columns and their moving averages to `table`.
///
/// Base columns are rewritten in place with their cleaned values; the
/// moving-average columns are appended (or replaced when they already
/// exist). Returns the names of the base columns that were found.
pub fn add_derived_features(
    table: &mut DataTable,
    base_columns: &[String],
    windows: &[usize],
) -> Vec<String> {
    let mut present = Vec::new();
    for name in base_columns {
        let Some(idx) = table.column_index(name) else {
            continue;
        };
        let cleaned = table.column(name).map(|c| clean_column(&c)).unwrap_or_default();
        table.set_column(idx, format_cells(&cleaned));

        for &w in windows {
            let ma = format_cells(&rolling_mean(&cleaned, w));
            let ma_name = moving_average_name(name, w);
            match table.column_index(&ma_name) {
                Some(existing) => table.set_column(existing, ma),
                None => table.add_column(ma_name, ma),
            }
        }
        present.push(name.clone());
    }
    present
}

fn format_cells(values: &[f64]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| if v.is_nan() { None } else { Some(v.to_string()) })
        .collect()
}

/// Build the training matrix from a merged table.
///
/// Base columns missing from the table are skipped with a warning; at least
/// one must be present.
pub fn build_feature_matrix(
    table: &DataTable,
    base_columns: &[String],
    windows: &[usize],
) -> Result<FeatureMatrix, FeatureError> {
    if table.is_empty() {
        return Err(FeatureError::EmptyDataset);
    }

    let mut bases: Vec<(&str, Vec<f64>)> = Vec::new();
    for name in base_columns {
        match table.column(name) {
            Some(cells) => bases.push((name.as_str(), clean_column(&cells))),
            None => warn!(column = %name, "Feature column missing from dataset, skipping"),
        }
    }
    if bases.is_empty() {
        return Err(FeatureError::NoFeatureColumns(base_columns.to_vec()));
    }

    let mut columns: Vec<String> = bases.iter().map(|(n, _)| (*n).to_string()).collect();
    let mut series: Vec<Vec<f64>> = bases.iter().map(|(_, v)| v.clone()).collect();
    for (name, values) in &bases {
        for &w in windows {
            columns.push(moving_average_name(name, w));
            series.push(rolling_mean(values, w));
        }
    }

    let n = table.len();
    let rows = (0..n)
        .map(|i| {
            series
                .iter()
                .map(|s| if s[i].is_finite() { s[i] } else { 0.0 })
                .collect()
        })
        .collect();

    debug!(rows = n, features = columns.len(), "Feature matrix built");
    Ok(FeatureMatrix { columns, rows })
}
