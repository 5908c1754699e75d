//! Spreadsheet loading for brand catalog tables.
//!
//! Brand tables arrive as `.xlsx` workbooks (one or more worksheets) or as
//! per-sheet CSV exports. The xlsx path walks the OOXML archive directly:
//! shared strings first, then each worksheet's cell grid, with cell
//! references mapped back to (row, column) positions so sparse rows keep
//! their column alignment. Numeric cells are rendered as integer-valued
//! strings, never scientific notation or a trailing ".0".

use std::io::Read;
use std::path::Path;

use crate::errors::AssistantError;

/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum worksheets processed per workbook.
const MAX_SHEETS: usize = 16;

/// One worksheet as a dense grid of string cells. Missing cells are empty
/// strings.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub rows: Vec<Vec<String>>,
}

/// Renders a raw numeric cell value the way the catalog expects: integral
/// values as plain integers, everything else truncated toward zero.
pub fn render_numeric(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => format!("{}", v.trunc() as i64),
        _ => raw.trim().to_string(),
    }
}

/// Loads every worksheet of an xlsx workbook, in sheet order.
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<RawSheet>, AssistantError> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_workbook(&bytes)
}

pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawSheet>, AssistantError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| AssistantError::CatalogError(e.to_string()))?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_names = list_worksheet_names(&mut archive);
    let mut sheets = Vec::new();
    for name in sheet_names.into_iter().take(MAX_SHEETS) {
        let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        sheets.push(parse_worksheet(&xml, &shared_strings)?);
    }
    if sheets.is_empty() {
        return Err(AssistantError::CatalogError(
            "workbook contains no worksheets".to_string(),
        ));
    }
    Ok(sheets)
}

/// Loads a single pre-exported CSV sheet. Rows may be ragged; cells are taken
/// verbatim (CSV exports carry no numeric typing to normalize).
pub fn load_csv_sheet<P: AsRef<Path>>(path: P) -> Result<RawSheet, AssistantError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_ref())?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(RawSheet { rows })
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, AssistantError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| AssistantError::CatalogError(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| AssistantError::CatalogError(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(AssistantError::CatalogError(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, AssistantError> {
    // Workbooks with only numeric/inline cells have no shared-strings part.
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut in_si = false;
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                    current.clear();
                } else if in_si && e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                    strings.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(AssistantError::CatalogError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn list_worksheet_names(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// Converts a cell reference like "B2" into a zero-based column index.
fn column_index(cell_ref: &str) -> usize {
    let mut index = 0usize;
    for c in cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()) {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    index.saturating_sub(1)
}

#[derive(PartialEq)]
enum CellKind {
    Number,
    SharedString,
    InlineOrStr,
}

fn parse_worksheet(xml: &[u8], shared_strings: &[String]) -> Result<RawSheet, AssistantError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut current_row: Vec<String> = Vec::new();
    let mut current_col = 0usize;
    let mut kind = CellKind::Number;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"row" => {
                        current_row = Vec::new();
                    }
                    b"c" => {
                        kind = CellKind::Number;
                        current_col = current_row.len();
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    let cell_ref = String::from_utf8_lossy(&attr.value);
                                    current_col = column_index(&cell_ref);
                                }
                                b"t" => {
                                    kind = match attr.value.as_ref() {
                                        b"s" => CellKind::SharedString,
                                        b"n" => CellKind::Number,
                                        _ => CellKind::InlineOrStr,
                                    };
                                }
                                _ => {}
                            }
                        }
                    }
                    b"v" | b"t" => {
                        in_value = true;
                    }
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_value => {
                let raw = te.unescape().unwrap_or_default();
                let value = match kind {
                    CellKind::SharedString => raw
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                        .unwrap_or_default(),
                    CellKind::Number => render_numeric(&raw),
                    CellKind::InlineOrStr => raw.into_owned(),
                };
                while current_row.len() < current_col {
                    current_row.push(String::new());
                }
                if current_row.len() == current_col {
                    current_row.push(value);
                } else {
                    current_row[current_col] = value;
                }
                in_value = false;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"row" => rows.push(std::mem::take(&mut current_row)),
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(AssistantError::CatalogError(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(RawSheet { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_test_xlsx() -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();

            writer.start_file("xl/sharedStrings.xml", options).unwrap();
            writer
                .write_all(
                    br#"<?xml version="1.0"?><sst><si><t>producto</t></si><si><t>ean</t></si><si><t>Crema X</t></si></sst>"#,
                )
                .unwrap();

            writer.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            writer
                .write_all(
                    br#"<?xml version="1.0"?><worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>7798008411011</v></c></row>
</sheetData></worksheet>"#,
                )
                .unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_parse_workbook() {
        let bytes = build_test_xlsx();
        let sheets = parse_workbook(&bytes).unwrap();
        assert_eq!(sheets.len(), 1);
        let rows = &sheets[0].rows;
        assert_eq!(rows[0], vec!["producto", "ean"]);
        assert_eq!(rows[1][0], "Crema X");
        assert_eq!(rows[1][1], "7798008411011");
    }

    #[test]
    fn test_render_numeric_no_scientific_notation() {
        assert_eq!(render_numeric("7.798008411011E12"), "7798008411011");
        assert_eq!(render_numeric("120"), "120");
        assert_eq!(render_numeric("1.5"), "1");
        assert_eq!(render_numeric("no numérico"), "no numérico");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), 0);
        assert_eq!(column_index("B2"), 1);
        assert_eq!(column_index("Z9"), 25);
        assert_eq!(column_index("AA3"), 26);
    }

    #[test]
    fn test_invalid_zip_is_catalog_error() {
        let err = parse_workbook(b"not a zip").unwrap_err();
        assert!(matches!(err, AssistantError::CatalogError(_)));
    }

    #[test]
    fn test_sparse_row_keeps_column_alignment() {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            writer
                .write_all(
                    br#"<worksheet><sheetData><row r="1"><c r="C1"><v>42</v></c></row></sheetData></worksheet>"#,
                )
                .unwrap();
            writer.finish().unwrap();
        }
        let sheets = parse_workbook(&cursor.into_inner()).unwrap();
        assert_eq!(sheets[0].rows[0], vec!["", "", "42"]);
    }
}
