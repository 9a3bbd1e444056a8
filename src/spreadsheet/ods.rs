use crate::error::ForceRunsError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use thiserror::Error;
use zip::ZipArchive;

/// ODS file MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// XML element name for spreadsheet root
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");

/// Grid limits; repeated rows or columns past them are never expanded
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Error types specific to ODS spreadsheet processing
#[derive(Error, Debug)]
pub enum OdsError {
    /// Invalid ODS MIME type detected in file
    #[error("Invalid ODS MIME type")]
    MimeTypeError,
}

/// OpenDocument spreadsheet reader
pub(crate) struct OdsSpreadsheet {
    zip: ZipArchive<UnifiedReader>,
    /// Top-level table names in document order
    sheets: Vec<String>,
}

impl OdsSpreadsheet {
    /// Validates the package and collects the table names from content.xml
    pub(crate) fn open(file_name: &str, mut zip: ZipArchive<UnifiedReader>) -> Result<Self, ForceRunsError> {
        check_mime(&mut zip)?;
        if is_password_protected(&mut zip)? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
        }
        let sheets = load_sheet_names(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }
        Ok(OdsSpreadsheet {
            zip,
            sheets,
        })
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, ForceRunsError> {
        let sheet_name = match self.sheets.iter().find(|name| criteria.accept(name)) {
            Some(name) => name.to_owned(),
            None => return Ok(None),
        };
        let mut found = false;
        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == SPREADSHEET => break,
            Event::Start(event) if event.name() == TABLE => {
                if event.get_attribute_value("table:name")?.map(|name| name == sheet_name).unwrap_or(false) {
                    found = true;
                    break;
                }
            }
        });
        if !found {
            return Ok(None);
        }

        let mut sheet = Sheet::new(&sheet_name);
        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 1usize;
        let mut col_count = 1usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut element_context = false; // inside a string cell
        let mut comment_context = false; // inside an annotation
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row = row.saturating_add(row_count);
                if row >= MAX_ROWS {
                    break;
                }
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = event.parse_attribute_value::<usize>("table:number-columns-repeated")?.unwrap_or(1);
                let value_type = event.get_attribute_value("office:value-type")?;
                kind = match value_type.as_deref() {
                    Some("boolean") => CellType::Boolean,
                    Some("date") => CellType::IsoDateTime,
                    Some("time") => CellType::IsoDuration,
                    Some("string") => {
                        let is_error = event.get_attribute_value("calcext:value-type")?
                            .map(|cow| cow == "error")
                            .unwrap_or(false);
                        if is_error { CellType::Error } else { CellType::Text }
                    }
                    Some(_) => CellType::Number,
                    None => CellType::Empty,
                };
                match kind {
                    CellType::Text | CellType::Error => element_context = true,
                    CellType::Boolean => {
                        let is_true = event.get_attribute_value("office:boolean-value")?
                            .map(|cow| cow != "false" && cow != "0")
                            .unwrap_or(false);
                        value.push_str(if is_true { "1" } else { "0" });
                    }
                    CellType::IsoDateTime => if let Some(data) = event.get_attribute_value("office:date-value")? {
                        value.push_str(&data);
                    }
                    CellType::IsoDuration => if let Some(data) = event.get_attribute_value("office:time-value")? {
                        value.push_str(&data);
                    }
                    CellType::Number => if let Some(data) = event.get_attribute_value("office:value")? {
                        value.push_str(&data);
                    }
                    _ => (),
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if kind != CellType::Empty && !value.is_empty() {
                    for row_number in row..row.saturating_add(row_count).min(MAX_ROWS) {
                        for col_number in col..col.saturating_add(col_count).min(MAX_COLS) {
                            sheet.push(Cell {
                                row: row_number,
                                col: col_number,
                                kind,
                                value: value.to_owned(),
                            });
                        }
                    }
                }
                col = col.saturating_add(col_count);
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == STRING => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1);
                for _ in 0..count {
                    value.push(' ');
                }
            }
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });
        sheet.finish();
        Ok(Some(sheet))
    }
}

/// Validates the MIME type entry when the package has one
fn check_mime(zip: &mut ZipArchive<UnifiedReader>) -> Result<(), ForceRunsError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::with_capacity(MIME_TYPE.len());
        file.take(MIME_TYPE.len() as u64 + 1).read_to_end(&mut buffer)?;
        if buffer.trim_ascii_end() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Checks the manifest for encrypted entries; packages without a manifest are not encrypted
fn is_password_protected(zip: &mut ZipArchive<UnifiedReader>) -> Result<bool, ForceRunsError> {
    let mut reader = match zip.xml_reader("META-INF/manifest.xml")? {
        Some(reader) => reader,
        None => return Ok(false),
    };
    let mut in_file_entry = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = true,
        Event::End(event) if event.name() == QName(b"manifest:file-entry") => in_file_entry = false,
        Event::Start(event) if in_file_entry && event.name() == QName(b"manifest:encryption-data") => {
            return Ok(true);
        }
    });
    Ok(false)
}

fn load_sheet_names(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, ForceRunsError> {
    let mut reader = zip
        .xml_reader("content.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
    let mut names = Vec::new();
    let mut depth = 0usize;
    match_xml_events!(reader => {
        Event::End(event) if event.name() == SPREADSHEET => break,
        Event::Start(event) if event.name() == TABLE => {
            if depth == 0 {
                if let Some(name) = event.get_attribute_value("table:name")? {
                    names.push(name.to_string());
                }
            }
            depth += 1;
        }
        Event::End(event) if event.name() == TABLE => depth = depth.saturating_sub(1),
    });
    Ok(names)
}

#[cfg(test)]
mod tests {
    use crate::fixtures;
    use crate::fixtures::Value;
    use crate::spreadsheet::cell::CellType;
    use crate::spreadsheet::criteria::Criteria;
    use crate::spreadsheet::open_spreadsheet_bytes;

    #[test]
    fn reads_named_table() {
        let bytes = fixtures::ods(&[
            ("Notes", vec![vec![Value::Text("skip me")]]),
            ("Raw Data", vec![
                vec![Value::Text("Position mm"), Value::Empty, Value::Text("Pull Force g")],
                vec![Value::Number(0.0), Value::Empty, Value::Number(2.25)],
                vec![Value::Boolean(true), Value::Error("#DIV/0!")],
            ]),
        ]);
        let mut spreadsheet = open_spreadsheet_bytes("pad.ods", bytes).unwrap();
        let sheet = spreadsheet.read_sheet(&Criteria::new("Raw Data")).unwrap().unwrap();

        assert_eq!(sheet.name, "Raw Data");
        assert_eq!(sheet.get(0, 0).unwrap().value, "Position mm");
        assert!(sheet.get(0, 1).is_none());
        assert_eq!(sheet.get(0, 2).unwrap().value, "Pull Force g");
        assert_eq!(sheet.get(1, 2).unwrap().to_number(), Some(2.25));
        assert_eq!(sheet.get(2, 0).unwrap().kind, CellType::Boolean);
        assert_eq!(sheet.get(2, 1).unwrap().kind, CellType::Error);
    }

    #[test]
    fn repeated_rows_and_columns_expand() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0">
<office:body><office:spreadsheet><table:table table:name="Raw Data">
<table:table-row><table:table-cell office:value-type="string"><text:p>Position<text:s/>mm</text:p></table:table-cell></table:table-row>
<table:table-row table:number-rows-repeated="2"><table:table-cell office:value-type="float" office:value="0" table:number-columns-repeated="2"/></table:table-row>
<table:table-row table:number-rows-repeated="1048570"><table:table-cell table:number-columns-repeated="1024"/></table:table-row>
</table:table></office:spreadsheet></office:body></office:document-content>"#;
        let bytes = fixtures::zip(&[
            ("mimetype", "application/vnd.oasis.opendocument.spreadsheet"),
            ("content.xml", content),
        ]);
        let mut spreadsheet = open_spreadsheet_bytes("pad.ods", bytes).unwrap();
        let sheet = spreadsheet.read_sheet(&Criteria::new("Raw*")).unwrap().unwrap();

        assert_eq!(sheet.get(0, 0).unwrap().value, "Position mm");
        assert_eq!(sheet.cells.len(), 5);
        assert_eq!(sheet.get(2, 1).unwrap().to_number(), Some(0.0));
        assert_eq!(sheet.rows().last().map(|(row, _)| row), Some(2));
    }

    #[test]
    fn rejects_wrong_mime_type() {
        let bytes = fixtures::zip(&[
            ("mimetype", "application/vnd.oasis.opendocument.text"),
            ("content.xml", "<office:document-content/>"),
        ]);
        let error = open_spreadsheet_bytes("letter.odt", bytes).err().unwrap();
        assert!(error.to_string().contains("MIME"), "{error}");
    }

    #[test]
    fn rejects_encrypted_packages() {
        let manifest = r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
<manifest:file-entry manifest:full-path="content.xml"><manifest:encryption-data/></manifest:file-entry>
</manifest:manifest>"#;
        let bytes = fixtures::zip(&[
            ("mimetype", "application/vnd.oasis.opendocument.spreadsheet"),
            ("content.xml", "<office:document-content/>"),
            ("META-INF/manifest.xml", manifest),
        ]);
        let error = open_spreadsheet_bytes("secret.ods", bytes).err().unwrap();
        assert!(error.to_string().contains("password protected"), "{error}");
    }
}
