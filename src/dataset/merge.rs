//! Outer join of sensor tables on `timestamp`.
//!
//! Each table has its column names trimmed and lower-cased, and gets a
//! synthetic row-index `timestamp` when it has none. Tables are then joined
//! left to right: the key set is the union of all timestamps, rows sharing a
//! key are paired (every left row with every right row) and rows present on
//! only one side are padded with missing cells, so no input row is lost.
//!
//! Numeric timestamps are compared by value and written back in canonical
//! form (`1.0` becomes `1`).
//!
//! A right-hand column whose name is already taken is renamed `{name}_{i}`
//! where `i` is the zero-based position of its source file. Columns that
//! still share a name after that are dropped, keeping the first.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{csv, loader, DataTable, DatasetError};

/// Join key column present in every merged table.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Outcome of a directory merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub files: Vec<PathBuf>,
    pub rows: usize,
    pub columns: usize,
    pub output: PathBuf,
}

/// Trim and lower-case every column name.
pub fn normalize_columns(table: &mut DataTable) {
    for col in &mut table.columns {
        *col = col.trim().to_lowercase();
    }
}

/// Append a `0..n` timestamp column when the table has none.
pub fn ensure_timestamp(table: &mut DataTable) {
    if table.column_index(TIMESTAMP_COLUMN).is_some() {
        return;
    }
    let values = (0..table.len()).map(|i| Some(i.to_string())).collect();
    table.add_column(TIMESTAMP_COLUMN, values);
}

/// Join key for a timestamp cell. Numeric text is keyed by value so `1`,
/// `1.0` and ` 1e0` meet on the same row; other text is kept as is.
fn canonical_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return int.to_string();
    }
    match trimmed.parse::<f64>() {
        // `+ 0.0` folds -0.0 into 0
        Ok(value) if value.is_finite() => format!("{}", value + 0.0),
        _ => raw.to_string(),
    }
}

/// Order join keys: finite numbers first (numerically), then text.
fn compare_keys(a: &str, b: &str) -> Ordering {
    let num = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    match (num(a), num(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// A table split into its join key and the remaining cells.
struct Keyed {
    columns: Vec<String>,
    rows: Vec<(String, Vec<Option<String>>)>,
}

impl Keyed {
    fn from_table(mut table: DataTable) -> Self {
        normalize_columns(&mut table);
        ensure_timestamp(&mut table);
        // ensure_timestamp guarantees the column; position 0 is never hit
        let key_idx = table.column_index(TIMESTAMP_COLUMN).unwrap_or(0);

        let mut columns = table.columns;
        columns.remove(key_idx);
        let rows = table
            .rows
            .into_iter()
            .map(|mut row| {
                let key = row
                    .remove(key_idx)
                    .map(|cell| canonical_key(&cell))
                    .unwrap_or_default();
                (key, row)
            })
            .collect();
        Self { columns, rows }
    }

    fn groups(&self) -> HashMap<&str, Vec<usize>> {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, (key, _)) in self.rows.iter().enumerate() {
            groups.entry(key.as_str()).or_default().push(i);
        }
        groups
    }

    fn outer_join(self, right: Self, source_index: usize) -> Self {
        let left_width = self.columns.len();
        let right_width = right.columns.len();

        let mut columns = self.columns.clone();
        for col in &right.columns {
            if self.columns.contains(col) {
                columns.push(format!("{col}_{source_index}"));
            } else {
                columns.push(col.clone());
            }
        }

        let left_groups = self.groups();
        let right_groups = right.groups();

        let mut keys: Vec<&str> = left_groups.keys().chain(right_groups.keys()).copied().collect();
        keys.sort_by(|a, b| compare_keys(a, b));
        keys.dedup();

        let empty = Vec::new();
        let mut rows = Vec::new();
        for key in keys {
            let lefts = left_groups.get(key).unwrap_or(&empty);
            let rights = right_groups.get(key).unwrap_or(&empty);
            match (lefts.is_empty(), rights.is_empty()) {
                (false, false) => {
                    for &l in lefts {
                        for &r in rights {
                            let mut row = self.rows[l].1.clone();
                            row.extend(right.rows[r].1.iter().cloned());
                            rows.push((key.to_string(), row));
                        }
                    }
                }
                (false, true) => {
                    for &l in lefts {
                        let mut row = self.rows[l].1.clone();
                        row.resize(left_width + right_width, None);
                        rows.push((key.to_string(), row));
                    }
                }
                (true, false) => {
                    for &r in rights {
                        let mut row = vec![None; left_width];
                        row.extend(right.rows[r].1.iter().cloned());
                        rows.push((key.to_string(), row));
                    }
                }
                (true, true) => {}
            }
        }

        Self { columns, rows }
    }

    /// Back to a table with `timestamp` first and repeated names removed.
    fn into_table(self) -> DataTable {
        let mut seen: HashSet<&str> = HashSet::from([TIMESTAMP_COLUMN]);
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| seen.insert(c.as_str()))
            .map(|(i, _)| i)
            .collect();

        let dropped = self.columns.len() - keep.len();
        if dropped > 0 {
            info!(dropped, "Dropped duplicate columns");
        }

        let mut columns = vec![TIMESTAMP_COLUMN.to_string()];
        columns.extend(keep.iter().map(|&i| self.columns[i].clone()));

        let mut table = DataTable::new(columns);
        for (key, row) in self.rows {
            let mut out = Vec::with_capacity(keep.len() + 1);
            out.push(if key.is_empty() { None } else { Some(key) });
            out.extend(keep.iter().map(|&i| row[i].clone()));
            table.push_row(out);
        }
        table
    }
}

/// Outer-join already loaded tables in order.
pub fn merge_tables(tables: Vec<DataTable>) -> DataTable {
    let mut merged: Option<Keyed> = None;
    for (i, table) in tables.into_iter().enumerate() {
        let keyed = Keyed::from_table(table);
        merged = Some(match merged {
            None => keyed,
            Some(left) => left.outer_join(keyed, i),
        });
    }
    merged.map_or_else(
        || DataTable::new(vec![TIMESTAMP_COLUMN.to_string()]),
        Keyed::into_table,
    )
}

/// Load every file and outer-join them in the given order.
pub fn merge_datasets(paths: &[PathBuf]) -> Result<DataTable, DatasetError> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        info!(path = %path.display(), "Processing dataset");
        tables.push(loader::load_dataset(path)?);
    }
    Ok(merge_tables(tables))
}

/// Sorted list of dataset files in `dir`, leaving out `exclude`.
fn list_dataset_files(dir: &Path, exclude: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let excluded = std::fs::canonicalize(exclude).ok();
    let entries = std::fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DatasetError::io(dir, e))?.path();
        if !path.is_file() || !loader::is_dataset_file(&path) {
            continue;
        }
        if excluded.is_some() && std::fs::canonicalize(&path).ok() == excluded {
            warn!(path = %path.display(), "Skipping previous merge output");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Merge every CSV/Excel file in `data_dir` and write the result to `output`.
pub fn merge_directory(data_dir: &Path, output: &Path) -> Result<MergeSummary, DatasetError> {
    let files = list_dataset_files(data_dir, output)?;
    if files.is_empty() {
        return Err(DatasetError::NoDatasets(data_dir.to_path_buf()));
    }
    info!(count = files.len(), dir = %data_dir.display(), "Found dataset files");

    let merged = merge_datasets(&files)?;
    csv::write_csv_file(&merged, output)?;
    info!(
        rows = merged.len(),
        columns = merged.width(),
        output = %output.display(),
        "Merged dataset saved"
    );

    Ok(MergeSummary {
        files,
        rows: merged.len(),
        columns: merged.width(),
        output: output.to_path_buf(),
    })
}
