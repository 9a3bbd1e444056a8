//! # Spreadsheet Reading Module
//!
//! Reads one sheet of an Office Open XML (.xlsx, .xlsm, .xlam) or OpenDocument
//! (.ods) workbook into a [`Sheet`]: a sparse, untyped grid of cells with no
//! assumed header. The container format is detected from the archive contents,
//! so uploads with arbitrary names are accepted.
use crate::error::ForceRunsError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;
use zip::ZipArchive;

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

/// Magic number of OLE compound files (legacy .xls and encrypted OOXML packages)
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Errors raised while opening a workbook or locating a sheet in it.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("'{0}' is missing from the workbook")]
    FileError(String),

    #[error("'{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("'{0}' is password protected or a legacy binary workbook")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Cannot detect spreadsheet format of '{0}'")]
    InvalidFileFormat(String),

    #[error("'{0}' has no sheet named '{1}'")]
    SheetNotFound(String, String),
}

/// Common interface of the workbook readers.
pub(crate) trait Spreadsheet {
    /// Reads the first sheet accepted by the criteria, `None` when no sheet matches
    fn read_sheet(&mut self, criteria: &Criteria) -> Result<Option<Sheet>, ForceRunsError>;
}

/// Opens a workbook from a local path or remote URL.
pub(crate) fn open_spreadsheet(file_name: &str) -> Result<Box<dyn Spreadsheet>, ForceRunsError> {
    open_spreadsheet_reader(file_name, UnifiedReader::new(file_name)?)
}

/// Opens a workbook whose bytes are already in memory.
pub(crate) fn open_spreadsheet_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Box<dyn Spreadsheet>, ForceRunsError> {
    open_spreadsheet_reader(file_name, UnifiedReader::from_bytes(bytes))
}

fn open_spreadsheet_reader(file_name: &str, mut reader: UnifiedReader) -> Result<Box<dyn Spreadsheet>, ForceRunsError> {
    if is_compound_file(&mut reader)? {
        Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
    }
    let mut zip = ZipArchive::new(reader)?;
    if zip.file("xl/workbook.xml")?.is_some() {
        Ok(Box::new(XlsxSpreadsheet::open(file_name, zip)?))
    } else if zip.file("content.xml")?.is_some() {
        Ok(Box::new(OdsSpreadsheet::open(file_name, zip)?))
    } else {
        Err(SpreadsheetError::InvalidFileFormat(file_name.to_owned()))?
    }
}

/// Checks for the OLE signature, leaving the reader at the start.
fn is_compound_file(reader: &mut UnifiedReader) -> Result<bool, ForceRunsError> {
    let mut signature = [0u8; 8];
    let matched = match reader.read_exact(&mut signature) {
        Ok(()) => signature == CFB_SIGNATURE,
        Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => false,
        Err(error) => Err(error)?,
    };
    reader.seek(SeekFrom::Start(0))?;
    Ok(matched)
}
