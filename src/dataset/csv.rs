//! Quote-aware CSV reading and writing.
//!
//! Reading is tolerant: a row with more fields than the header is malformed
//! and skipped, a row with fewer fields is padded with missing cells. Empty
//! cells are missing values. Quoted fields may span line breaks. Duplicate
//! header names are disambiguated as `name`, `name.1`, `name.2`, ...

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::{DataTable, DatasetError};

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Split text into records. A line break ends a record only outside quotes;
/// a trailing `\r` before the break is dropped.
fn split_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (idx, byte) in text.bytes().enumerate() {
        match byte {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                records.push(text[start..idx].trim_end_matches('\r'));
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        records.push(text[start..].trim_end_matches('\r'));
    }
    records
}

/// Rename repeated header names the way spreadsheet tools do.
pub(super) fn dedupe_header(columns: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    columns
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let out = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            out
        })
        .collect()
}

/// Counters from a tolerant read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub rows_read: usize,
    pub malformed_skipped: usize,
}

/// Parse CSV text. The first non-blank record is the header.
pub fn parse_csv(text: &str) -> Option<(DataTable, ReadStats)> {
    let mut records = split_records(text)
        .into_iter()
        .filter(|r| !r.trim().is_empty());

    let header = records.next()?;
    let header = header.trim_start_matches('\u{feff}');
    let columns = dedupe_header(csv_split(header));
    let width = columns.len();
    let mut table = DataTable::new(columns);
    let mut stats = ReadStats::default();

    for (record_no, record) in records.enumerate() {
        let fields = csv_split(record);
        if fields.len() > width {
            // Header is record 1, first data row is record 2
            debug!(
                record = record_no + 2,
                expected = width,
                found = fields.len(),
                "Skipping malformed CSV row"
            );
            stats.malformed_skipped += 1;
            continue;
        }
        let row = fields
            .into_iter()
            .map(|f| if f.is_empty() { None } else { Some(f) })
            .collect();
        table.push_row(row);
        stats.rows_read += 1;
    }

    Some((table, stats))
}

/// Read a CSV file, skipping malformed rows.
pub fn read_csv_file(path: &Path) -> Result<DataTable, DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    // Sensor exports are not always clean UTF-8
    let text = String::from_utf8_lossy(&bytes);

    let (table, stats) =
        parse_csv(&text).ok_or_else(|| DatasetError::EmptyFile(path.to_path_buf()))?;
    if stats.malformed_skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = stats.malformed_skipped,
            "Skipped malformed CSV rows"
        );
    }
    Ok(table)
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write a table as CSV; missing cells become empty fields.
pub fn write_csv_file(table: &DataTable, path: &Path) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }
    }
    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let header: Vec<String> = table.columns.iter().map(|c| csv_escape(c)).collect();
    writeln!(writer, "{}", header.join(",")).map_err(|e| DatasetError::io(path, e))?;

    for row in &table.rows {
        let line: Vec<String> = row
            .iter()
            .map(|cell| cell.as_deref().map(csv_escape).unwrap_or_default())
            .collect();
        writeln!(writer, "{}", line.join(",")).map_err(|e| DatasetError::io(path, e))?;
    }

    writer.flush().map_err(|e| DatasetError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_split_quoted_comma() {
        let fields = csv_split(r#"P0141,"O2 sensor, bank 1",High"#);
        assert_eq!(fields, vec!["P0141", "O2 sensor, bank 1", "High"]);
    }

    #[test]
    fn test_csv_split_escaped_quote() {
        let fields = csv_split(r#"a,"say ""hi""",c"#);
        assert_eq!(fields, vec!["a", r#"say "hi""#, "c"]);
    }

    #[test]
    fn test_csv_split_trailing_empty() {
        assert_eq!(csv_split("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_parse_skips_long_rows_and_pads_short_rows() {
        let text = "a,b,c\n1,2,3\n4,5,6,7\n8,9\n";
        let (table, stats) = parse_csv(text).unwrap();
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.malformed_skipped, 1);
        assert_eq!(table.rows[1], vec![Some("8".into()), Some("9".into()), None]);
    }

    #[test]
    fn test_parse_blank_lines_and_bom() {
        let text = "\u{feff}x,y\r\n\r\n1,2\r\n";
        let (table, _) = parse_csv(text).unwrap();
        assert_eq!(table.columns, vec!["x", "y"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parse_csv("").is_none());
        assert!(parse_csv("\n  \n").is_none());
    }

    #[test]
    fn test_duplicate_header_names() {
        let (table, _) = parse_csv("rpm,rpm,rpm\n1,2,3\n").unwrap();
        assert_eq!(table.columns, vec!["rpm", "rpm.1", "rpm.2"]);
    }

    #[test]
    fn test_write_then_read_preserves_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut table = DataTable::new(vec!["timestamp".into(), "note".into()]);
        table.push_row(vec![Some("0".into()), Some("hot, very \"hot\"".into())]);
        table.push_row(vec![Some("1".into()), None]);
        write_csv_file(&table, &path).unwrap();

        let back = read_csv_file(&path).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_quoted_line_break_stays_in_one_field() {
        let text = "code,possible causes,urgency\r\nP0141,\"Heater circuit open\r\nFaulty sensor\",High\r\nP0300,Misfire,Low\r\n";
        let (table, stats) = parse_csv(text).unwrap();
        assert_eq!(stats.rows_read, 2);
        assert_eq!(stats.malformed_skipped, 0);
        assert_eq!(
            table.rows[0],
            vec![
                Some("P0141".into()),
                Some("Heater circuit open\r\nFaulty sensor".into()),
                Some("High".into()),
            ]
        );
        assert_eq!(table.rows[1][0].as_deref(), Some("P0300"));
    }

    #[test]
    fn test_written_multiline_cell_reads_back_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.csv");
        let mut table = DataTable::new(vec!["timestamp".into(), "note".into(), "soc".into()]);
        table.push_row(vec![Some("0".into()), Some("line1\nline2".into()), Some("80".into())]);
        table.push_row(vec![Some("1".into()), None, Some("81".into())]);
        write_csv_file(&table, &path).unwrap();

        let back = read_csv_file(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back, table);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_csv_file(Path::new("/nonexistent/file.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
