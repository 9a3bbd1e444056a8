//! In-memory workbooks for unit tests.
use chrono::Duration;
use chrono::NaiveDate;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// One cell of a fixture row.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Value {
    Empty,
    /// Shared string in xlsx, string cell in ods
    Text(&'static str),
    /// Inline string in xlsx, string cell in ods
    Inline(&'static str),
    Number(f64),
    /// Serial day number styled as a date
    Date(f64),
    Boolean(bool),
    Error(&'static str),
}

pub(crate) type Rows = Vec<Vec<Value>>;

/// A "Raw Data" sheet with a title block above the header, three runs
/// starting at the zero positions and a missing pull force in the last run.
pub(crate) fn sample_rows() -> Rows {
    let mut rows = vec![
        vec![Value::Text("Pull test report")],
        vec![Value::Inline("Operator"), Value::Inline("QA")],
        vec![],
        vec![Value::Text("Position mm"), Value::Text("Pull Force g"), Value::Text("Clamp Force g")],
    ];
    let data = [
        (0.0, Some(1.0)),
        (5.0, Some(2.0)),
        (10.0, Some(3.0)),
        (0.0, Some(4.0)),
        (3.0, Some(5.0)),
        (8.0, Some(6.0)),
        (0.0, Some(7.0)),
        (4.0, None),
    ];
    for (position, force) in data {
        rows.push(vec![
            Value::Number(position),
            force.map(Value::Number).unwrap_or(Value::Empty),
            Value::Number(100.0),
        ]);
    }
    rows
}

/// Packs the given (path, content) entries into a ZIP archive.
pub(crate) fn zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        let options = if *name == "mimetype" {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
        };
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Builds an .xlsx workbook with one worksheet per (name, rows) pair.
pub(crate) fn xlsx(sheets: &[(&str, Rows)]) -> Vec<u8> {
    let mut shared_strings = Vec::<&str>::new();
    let mut worksheets = Vec::<String>::new();
    for (_, rows) in sheets {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (row, cells) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, value) in cells.iter().enumerate() {
                let reference = crate::spreadsheet::reference::index_to_reference(row, col);
                let cell = match value {
                    Value::Empty => continue,
                    Value::Text(text) => {
                        let index = match shared_strings.iter().position(|it| it == text) {
                            Some(index) => index,
                            None => {
                                shared_strings.push(*text);
                                shared_strings.len() - 1
                            }
                        };
                        format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
                    }
                    Value::Inline(text) => format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(text)),
                    Value::Number(number) => format!(r#"<c r="{reference}"><v>{number}</v></c>"#),
                    Value::Date(serial) => format!(r#"<c r="{reference}" s="1"><v>{serial}</v></c>"#),
                    Value::Boolean(flag) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*flag)),
                    Value::Error(code) => format!(r#"<c r="{reference}" t="e"><v>{}</v></c>"#, escape(code)),
                };
                xml.push_str(&cell);
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        worksheets.push(xml);
    }

    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr date1904="false"/><sheets>"#,
    );
    let mut relationships = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (index, (name, _)) in sheets.iter().enumerate() {
        let id = index + 1;
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#, escape(name)));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#,
        ));
    }
    relationships.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#,
        sheets.len() + 1,
    ));
    workbook.push_str("</sheets></workbook>");

    let styles = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

    let mut strings = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        shared_strings.len(),
    );
    for text in &shared_strings {
        strings.push_str(&format!("<si><t>{}</t></si>", escape(text)));
    }
    strings.push_str("</sst>");

    let paths: Vec<String> = (1..=sheets.len()).map(|id| format!("xl/worksheets/sheet{id}.xml")).collect();
    let mut entries = vec![
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", relationships.as_str()),
        ("xl/styles.xml", styles),
        ("xl/sharedStrings.xml", strings.as_str()),
    ];
    for (path, xml) in paths.iter().zip(worksheets.iter()) {
        entries.push((path.as_str(), xml.as_str()));
    }
    zip(&entries)
}

/// Builds an .ods workbook with one table per (name, rows) pair.
pub(crate) fn ods(sheets: &[(&str, Rows)]) -> Vec<u8> {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:calcext="urn:org:documentfoundation:names:experimental:calc:xmlns:calcext:1.0"><office:body><office:spreadsheet>"#,
    );
    for (name, rows) in sheets {
        content.push_str(&format!(r#"<table:table table:name="{}">"#, escape(name)));
        for cells in rows {
            content.push_str("<table:table-row>");
            for value in cells {
                let cell = match value {
                    Value::Empty => "<table:table-cell/>".to_owned(),
                    Value::Text(text) | Value::Inline(text) => format!(
                        r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#,
                        escape(text),
                    ),
                    Value::Number(number) => format!(
                        r#"<table:table-cell office:value-type="float" office:value="{number}"><text:p>{number}</text:p></table:table-cell>"#,
                    ),
                    Value::Date(serial) => {
                        let date = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap() + Duration::days(*serial as i64);
                        format!(r#"<table:table-cell office:value-type="date" office:date-value="{date}"/>"#)
                    }
                    Value::Boolean(flag) => format!(
                        r#"<table:table-cell office:value-type="boolean" office:boolean-value="{flag}"/>"#,
                    ),
                    Value::Error(code) => format!(
                        r#"<table:table-cell office:value-type="string" calcext:value-type="error"><text:p>{}</text:p></table:table-cell>"#,
                        escape(code),
                    ),
                };
                content.push_str(&cell);
            }
            content.push_str("</table:table-row>");
        }
        content.push_str("</table:table>");
    }
    content.push_str("</office:spreadsheet></office:body></office:document-content>");

    let manifest = r#"<?xml version="1.0" encoding="UTF-8"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

    zip(&[
        ("mimetype", "application/vnd.oasis.opendocument.spreadsheet"),
        ("content.xml", &content),
        ("META-INF/manifest.xml", manifest),
    ])
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
