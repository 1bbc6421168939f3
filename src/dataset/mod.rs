//! Sensor Dataset Module
//!
//! Offline ingestion of vehicle sensor logs:
//!
//! - `csv`: quote-aware CSV reading (malformed rows skipped) and writing
//! - `xlsx`: first-worksheet reader for Excel workbooks
//! - `loader`: extension dispatch plus empty-row cleanup
//! - `merge`: column normalization and outer join on `timestamp`
//!
//! All tables are held as [`DataTable`]: ordered column names and rows of
//! optional string cells. Numeric interpretation happens later, in
//! `crate::features`.

pub mod csv;
pub mod loader;
pub mod merge;
pub mod xlsx;

pub use loader::load_dataset;
pub use merge::{merge_datasets, merge_directory, merge_tables, MergeSummary, TIMESTAMP_COLUMN};

use std::path::PathBuf;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("No header row in {}", .0.display())]
    EmptyFile(PathBuf),
    #[error("Workbook error ({}): {message}", .path.display())]
    Xlsx { path: PathBuf, message: String },
    #[error("No datasets found in {}", .0.display())]
    NoDatasets(PathBuf),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xlsx(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Xlsx {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

// ============================================================================
// Data Table
// ============================================================================

/// In-memory table of string cells; `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Borrow one column's cells by name.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Append a column; `values` shorter than the table are padded with `None`.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Option<String>>) {
        self.columns.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().flatten());
        }
    }

    /// Replace the cells of an existing column.
    pub fn set_column(&mut self, idx: usize, values: Vec<Option<String>>) {
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[idx] = values.next().flatten();
        }
    }

    /// Drop rows whose cells are all missing.
    pub fn drop_empty_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| r.iter().any(Option::is_some));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut t = DataTable::new(vec!["a".into(), "b".into(), "c".into()]);
        t.push_row(vec![cell("1")]);
        assert_eq!(t.rows[0], vec![cell("1"), None, None]);
    }

    #[test]
    fn test_column_lookup() {
        let mut t = DataTable::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![cell("1"), cell("2")]);
        t.push_row(vec![None, cell("4")]);
        assert_eq!(t.column("b"), Some(vec![Some("2"), Some("4")]));
        assert_eq!(t.column("a"), Some(vec![Some("1"), None]));
        assert!(t.column("z").is_none());
    }

    #[test]
    fn test_drop_empty_rows() {
        let mut t = DataTable::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![None, None]);
        t.push_row(vec![cell("x"), None]);
        assert_eq!(t.drop_empty_rows(), 1);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_add_column_pads() {
        let mut t = DataTable::new(vec!["a".into()]);
        t.push_row(vec![cell("1")]);
        t.push_row(vec![cell("2")]);
        t.add_column("b", vec![cell("x")]);
        assert_eq!(t.columns, vec!["a", "b"]);
        assert_eq!(t.rows[1], vec![cell("2"), None]);
    }
}
