//! Load one sensor file into a [`DataTable`], dispatching on extension.

use std::path::Path;

use tracing::{debug, info};

use super::{csv, xlsx, DataTable, DatasetError};

/// Extensions picked up when scanning a data directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xls", "xlsx"];

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Whether a path has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_dataset_file(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

/// Load a CSV or Excel file. Rows whose cells are all empty are dropped.
///
/// Legacy `.xls` workbooks are recognised but rejected; convert them to
/// `.xlsx` first.
pub fn load_dataset(path: &Path) -> Result<DataTable, DatasetError> {
    let mut table = match extension(path).as_str() {
        "csv" => csv::read_csv_file(path)?,
        "xlsx" => xlsx::read_xlsx(path)?,
        "xls" => {
            return Err(DatasetError::UnsupportedFormat(format!(
                ".xls (legacy binary workbook, convert to .xlsx): {}",
                path.display()
            )))
        }
        other => {
            return Err(DatasetError::UnsupportedFormat(format!(
                ".{other}: {}",
                path.display()
            )))
        }
    };

    let dropped = table.drop_empty_rows();
    if dropped > 0 {
        debug!(path = %path.display(), dropped, "Dropped empty rows");
    }
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.width(),
        "Loaded dataset"
    );
    Ok(table)
}
