//! DTC Lookup - static trouble-code table loaded once at startup
//!
//! The table is a CSV file whose header names vary between sources, so each
//! field is located through a list of accepted names (trimmed, compared
//! case-insensitively). Only the code column is required; a missing
//! descriptive column yields empty strings.
//!
//! Keys are normalized with [`normalize_code`] both at load and at lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dataset::csv::parse_csv;
use crate::dataset::DataTable;
use crate::types::{normalize_code, DtcRecord};

/// Accepted header names per field, in priority order.
pub const CODE_COLUMNS: &[&str] = &["code", "dtc", "error code", "error_code"];
pub const MEANING_COLUMNS: &[&str] = &["meaning", "meaning of code", "description"];
pub const CAUSE_COLUMNS: &[&str] = &["possible causes", "possible cause", "possible_cause", "cause"];
pub const FIX_COLUMNS: &[&str] = &["fix suggestion", "fix", "action", "recommended action"];
pub const URGENCY_COLUMNS: &[&str] = &["urgency", "priority"];

#[derive(Debug, thiserror::Error)]
pub enum DtcError {
    #[error("DTC file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read DTC file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("DTC table {source_name} has no header row")]
    Empty { source_name: String },

    #[error("DTC table {source_name} must contain a 'Code' or 'DTC' column (found: {})", .found.join(", "))]
    MissingCodeColumn {
        source_name: String,
        found: Vec<String>,
    },
}

/// First column whose trimmed, lower-cased name is one of `candidates`.
///
/// Candidates are tried in order so `Possible Causes` beats `Cause` when a
/// table has both.
fn find_column(columns: &[String], candidates: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = columns.iter().map(|c| c.trim().to_lowercase()).collect();
    candidates
        .iter()
        .find_map(|cand| normalized.iter().position(|c| c == cand))
}

/// Immutable code → record table.
#[derive(Debug, Clone, Default)]
pub struct DtcTable {
    records: HashMap<String, DtcRecord>,
}

impl DtcTable {
    /// Load the table from a CSV file, failing fast on a missing file or
    /// code column.
    pub fn load(path: &Path) -> Result<Self, DtcError> {
        if !path.exists() {
            return Err(DtcError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| DtcError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let table = Self::from_csv_text(&text, &path.display().to_string())?;
        info!(path = %path.display(), codes = table.len(), "DTC table loaded");
        Ok(table)
    }

    /// Build the table from CSV text; `source_name` labels errors and logs.
    pub fn from_csv_text(text: &str, source_name: &str) -> Result<Self, DtcError> {
        let (data, stats) = parse_csv(text).ok_or_else(|| DtcError::Empty {
            source_name: source_name.to_string(),
        })?;
        if stats.malformed_skipped > 0 {
            warn!(
                source = source_name,
                skipped = stats.malformed_skipped,
                "Skipped malformed DTC rows"
            );
        }
        Self::from_data_table(&data, source_name)
    }

    fn from_data_table(data: &DataTable, source_name: &str) -> Result<Self, DtcError> {
        let code_col =
            find_column(&data.columns, CODE_COLUMNS).ok_or_else(|| DtcError::MissingCodeColumn {
                source_name: source_name.to_string(),
                found: data.columns.clone(),
            })?;
        let meaning_col = find_column(&data.columns, MEANING_COLUMNS);
        let cause_col = find_column(&data.columns, CAUSE_COLUMNS);
        let fix_col = find_column(&data.columns, FIX_COLUMNS);
        let urgency_col = find_column(&data.columns, URGENCY_COLUMNS);

        let mut records = HashMap::with_capacity(data.len());
        for row in &data.rows {
            let field = |col: Option<usize>| -> String {
                col.and_then(|i| row[i].as_deref())
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            };

            let code = normalize_code(&field(Some(code_col)));
            if code.is_empty() {
                continue;
            }
            if records.contains_key(&code) {
                warn!(source = source_name, code = %code, "Duplicate DTC code, keeping first entry");
                continue;
            }
            let record = DtcRecord {
                code: code.clone(),
                meaning: field(meaning_col),
                possible_cause: field(cause_col),
                fix_suggestion: field(fix_col),
                urgency: field(urgency_col),
            };
            records.insert(code, record);
        }

        Ok(Self { records })
    }

    /// Look up a code; surrounding whitespace and case are ignored.
    pub fn lookup(&self, code: &str) -> Option<&DtcRecord> {
        let key = normalize_code(code);
        if key.is_empty() {
            return None;
        }
        self.records.get(&key)
    }

    /// Code → meaning view used by the health predictor.
    pub fn meanings(&self) -> HashMap<String, String> {
        self.records
            .iter()
            .map(|(code, rec)| (code.clone(), rec.meaning.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.records.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}
