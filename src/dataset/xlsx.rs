//! Excel (.xlsx) reader.
//!
//! An `.xlsx` workbook is a zip archive of XML parts. Only the first worksheet
//! (in workbook order) is read; its first row becomes the header. Shared
//! strings, inline strings, formula string results, booleans and numbers are
//! returned as text. Legacy binary `.xls` workbooks are not handled here.

use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use super::csv::dedupe_header;
use super::{DataTable, DatasetError};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FALLBACK_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Read the first worksheet of an `.xlsx` file.
pub fn read_xlsx(path: &Path) -> Result<DataTable, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| DatasetError::xlsx(path, e))?;

    let shared = match read_part(&mut archive, SHARED_STRINGS_PART).map_err(|e| DatasetError::xlsx(path, e))? {
        Some(xml) => parse_shared_strings(&xml).map_err(|e| DatasetError::xlsx(path, e))?,
        None => Vec::new(),
    };

    let sheet_part = first_sheet_part(&mut archive).map_err(|e| DatasetError::xlsx(path, e))?;
    debug!(path = %path.display(), sheet = %sheet_part, "Reading worksheet");

    let sheet_xml = read_part(&mut archive, &sheet_part)
        .map_err(|e| DatasetError::xlsx(path, e))?
        .ok_or_else(|| DatasetError::xlsx(path, format!("missing worksheet part {sheet_part}")))?;

    let grid = parse_sheet(&sheet_xml, &shared).map_err(|e| DatasetError::xlsx(path, e))?;
    grid_to_table(grid).ok_or_else(|| DatasetError::EmptyFile(path.to_path_buf()))
}

/// Read a zip entry as text; `Ok(None)` when the entry does not exist.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>, String> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut xml = String::new();
            entry
                .read_to_string(&mut xml)
                .map_err(|e| format!("{name}: {e}"))?;
            Ok(Some(xml))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(format!("{name}: {e}")),
    }
}

/// Resolve the zip path of the first worksheet via the workbook relationships.
fn first_sheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, String> {
    let Some(workbook) = read_part(archive, WORKBOOK_PART)? else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };
    let Some(rel_id) = first_sheet_rel_id(&workbook)? else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };
    let Some(rels) = read_part(archive, WORKBOOK_RELS_PART)? else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };

    Ok(relationship_target(&rels, &rel_id)?
        .map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{target}"),
        })
        .unwrap_or_else(|| FALLBACK_SHEET_PART.to_string()))
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(|err| err.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `r:id` of the first `<sheet>` in workbook.xml.
fn first_sheet_rel_id(xml: &str) -> Result<Option<String>, String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                return attr_value(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// `Target` of the relationship with the given `Id`.
fn relationship_target(xml: &str, rel_id: &str) -> Result<Option<String>, String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr_value(&e, b"Id")?.as_deref() == Some(rel_id) {
                    return attr_value(&e, b"Target");
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Parse the shared string table. Rich-text runs inside one `<si>` are
/// concatenated; phonetic hints (`<rPh>`) are ignored.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text && !in_phonetic => {
                current.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Zero-based column index from a cell reference such as `C7` or `AB12`.
fn column_from_ref(cell_ref: &str) -> Option<usize> {
    let letters: Vec<u8> = cell_ref
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let index = letters
        .iter()
        .fold(0usize, |acc, &b| acc * 26 + usize::from(b - b'A' + 1));
    Some(index - 1)
}

#[derive(Debug, Default)]
struct CellState {
    column: usize,
    kind: Option<String>,
    value: String,
}

/// Parse worksheet XML into rows of optional cells (sparse cells filled with `None`).
fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<Option<String>>>, String> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut row: Vec<Option<String>> = Vec::new();
    let mut cell: Option<CellState> = None;
    let mut capture = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    let column = attr_value(&e, b"r")?
                        .and_then(|r| column_from_ref(&r))
                        .unwrap_or(row.len());
                    cell = Some(CellState {
                        column,
                        kind: attr_value(&e, b"t")?,
                        value: String::new(),
                    });
                }
                b"v" | b"t" => capture = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"row" => rows.push(Vec::new()),
            Event::Text(t) if capture => {
                if let Some(c) = cell.as_mut() {
                    c.value.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let Some(c) = cell.take() {
                        let value = resolve_cell(&c, shared);
                        if row.len() <= c.column {
                            row.resize(c.column + 1, None);
                        }
                        row[c.column] = value;
                    }
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}

fn resolve_cell(cell: &CellState, shared: &[String]) -> Option<String> {
    let text = match cell.kind.as_deref() {
        Some("s") => cell
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i).cloned())?,
        Some("b") => match cell.value.trim() {
            "1" => "TRUE".to_string(),
            "0" => "FALSE".to_string(),
            other => other.to_string(),
        },
        _ => cell.value.clone(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First row is the header; unnamed header cells become `Unnamed: {i}` and
/// repeated names get `.1`, `.2`, ... like CSV headers.
fn grid_to_table(mut grid: Vec<Vec<Option<String>>>) -> Option<DataTable> {
    let first = grid.iter().position(|r| r.iter().any(Option::is_some))?;
    let body = grid.split_off(first + 1);
    let header = grid.pop()?;

    let width = body.iter().map(Vec::len).chain(std::iter::once(header.len())).max()?;
    let columns: Vec<String> = (0..width)
        .map(|i| {
            header
                .get(i)
                .cloned()
                .flatten()
                .unwrap_or_else(|| format!("Unnamed: {i}"))
        })
        .collect();

    let mut table = DataTable::new(dedupe_header(columns));
    for row in body {
        table.push_row(row);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"></Types>"#;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Log" sheetId="1" r:id="rId7"/></sheets>
</workbook>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/data.xml"/>
</Relationships>"#;

    const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Timestamp</t></si>
  <si><t>Motor_RPM</t></si>
  <si><r><t>Battery </t></r><r><t>Temp</t></r></si>
</sst>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
    <row r="2"><c r="A2"><v>1</v></c><c r="B2"><v>1500</v></c><c r="C2" t="inlineStr"><is><t>31 &amp; rising</t></is></c></row>
    <row r="3"><c r="A3"><v>2</v></c><c r="C3"><v>33.5</v></c></row>
  </sheetData>
</worksheet>"#;

    fn write_workbook(path: &Path, parts: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_column_from_ref() {
        assert_eq!(column_from_ref("A1"), Some(0));
        assert_eq!(column_from_ref("C7"), Some(2));
        assert_eq!(column_from_ref("Z3"), Some(25));
        assert_eq!(column_from_ref("AA10"), Some(26));
        assert_eq!(column_from_ref("12"), None);
    }

    #[test]
    fn test_shared_strings_concatenate_runs() {
        let strings = parse_shared_strings(SHARED).unwrap();
        assert_eq!(strings, vec!["Timestamp", "Motor_RPM", "Battery Temp"]);
    }

    #[test]
    fn test_read_workbook_via_relationships() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.xlsx");
        write_workbook(
            &path,
            &[
                ("[Content_Types].xml", CONTENT_TYPES),
                ("xl/workbook.xml", WORKBOOK),
                ("xl/_rels/workbook.xml.rels", RELS),
                ("xl/sharedStrings.xml", SHARED),
                ("xl/worksheets/data.xml", SHEET),
            ],
        );

        let table = read_xlsx(&path).unwrap();
        assert_eq!(table.columns, vec!["Timestamp", "Motor_RPM", "Battery Temp"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0],
            vec![Some("1".into()), Some("1500".into()), Some("31 & rising".into())]
        );
        // Sparse cell B3 is missing
        assert_eq!(table.rows[1], vec![Some("2".into()), None, Some("33.5".into())]);
    }

    #[test]
    fn test_read_workbook_without_workbook_part_uses_sheet1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.xlsx");
        let sheet = r#"<worksheet><sheetData>
            <row><c t="inlineStr"><is><t>soc</t></is></c></row>
            <row><c><v>88</v></c></row>
        </sheetData></worksheet>"#;
        write_workbook(&path, &[("xl/worksheets/sheet1.xml", sheet)]);

        let table = read_xlsx(&path).unwrap();
        assert_eq!(table.columns, vec!["soc"]);
        assert_eq!(table.rows, vec![vec![Some("88".to_string())]]);
    }

    #[test]
    fn test_repeated_header_names_are_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.xlsx");
        let sheet = r#"<worksheet><sheetData>
            <row>
              <c r="A1" t="inlineStr"><is><t>timestamp</t></is></c>
              <c r="B1" t="inlineStr"><is><t>soc</t></is></c>
              <c r="C1" t="inlineStr"><is><t>soc</t></is></c>
            </row>
            <row><c r="A2"><v>0</v></c><c r="B2"><v>80</v></c><c r="C2"><v>79</v></c></row>
        </sheetData></worksheet>"#;
        write_workbook(&path, &[("xl/worksheets/sheet1.xml", sheet)]);

        let table = read_xlsx(&path).unwrap();
        assert_eq!(table.columns, vec!["timestamp", "soc", "soc.1"]);
        assert_eq!(table.column("soc.1").unwrap(), vec![Some("79")]);
    }

    #[test]
    fn test_not_a_zip_is_workbook_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.xlsx");
        std::fs::write(&path, "timestamp,rpm\n1,2\n").unwrap();
        assert!(matches!(read_xlsx(&path), Err(DatasetError::Xlsx { .. })));
    }
}
