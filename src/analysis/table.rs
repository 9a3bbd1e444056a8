use crate::analysis::Source;
use crate::error::ForceRunsError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;
use tracing::trace;

/// Sheet read when the caller does not name one
pub const DEFAULT_SHEET_NAME: &str = "Raw Data";

pub(crate) const POSITION_LABEL: &str = "Position mm";
pub(crate) const PULL_FORCE_LABEL: &str = "Pull Force g";
pub(crate) const CLAMP_FORCE_LABEL: &str = "Clamp Force g";

static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Position\s*mm").expect("Hardcode regex pattern"));

/// Errors raised while turning a sheet into a measurement table.
#[derive(Error, Debug, PartialEq)]
pub enum LoadError {
    #[error("No row matching 'Position mm' found in '{file}'")]
    HeaderNotFound { file: String },

    #[error("Column '{column}' not found in header of '{file}'")]
    MissingColumn { file: String, column: String },
}

/// One data row of a recording.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    pub position_mm: f64,
    pub pull_force_g: Option<f64>,
    pub clamp_force_g: Option<f64>,
}

/// The data rows below the located header, in sheet order.
/// Rows without a usable position are not kept.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementTable {
    pub file_name: String,
    pub sheet_name: String,
    /// 0-based sheet row of the header
    pub header_row: usize,
    /// Trimmed header labels by column; absent header cells are empty
    pub labels: Vec<String>,
    pub records: Vec<Record>,
}

impl MeasurementTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest position in centimetres, `None` for an empty table.
    pub fn max_position_cm(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|record| record.position_mm / 10.0)
            .reduce(f64::max)
    }
}

/// Loads the measurement sheet of a workbook.
///
/// The header is the first row with a cell matching `Position\s*mm`; it may
/// sit below any number of title or metadata rows. Columns are picked by
/// exact label, and cells that do not hold a number become missing values.
pub fn load_table(source: &Source, sheet_name: &str) -> Result<MeasurementTable, ForceRunsError> {
    let criteria = Criteria::new(sheet_name);
    let mut spreadsheet = source.open()?;
    let sheet = spreadsheet
        .read_sheet(&criteria)?
        .ok_or_else(|| SpreadsheetError::SheetNotFound(source.name().to_owned(), sheet_name.to_owned()))?;
    Ok(normalize(source.name(), sheet)?)
}

/// Locates the header of a raw sheet and extracts the typed records below it.
pub(crate) fn normalize(file_name: &str, sheet: Sheet) -> Result<MeasurementTable, LoadError> {
    let (header_row, header) = sheet
        .rows()
        .find(|(_, cells)| cells.iter().any(|cell| HEADER_PATTERN.is_match(&cell.value)))
        .ok_or_else(|| LoadError::HeaderNotFound { file: file_name.to_owned() })?;
    debug!(file = file_name, sheet = %sheet.name, row = header_row + 1, "header located");

    let width = header.last().map(|cell| cell.col + 1).unwrap_or(0);
    let mut labels = vec![String::new(); width];
    for cell in header {
        labels[cell.col] = cell.to_string().trim().to_owned();
    }

    let column = |label: &str| labels.iter().position(|it| it == label);
    let missing = |label: &str| LoadError::MissingColumn {
        file: file_name.to_owned(),
        column: label.to_owned(),
    };
    let position_col = column(POSITION_LABEL).ok_or_else(|| missing(POSITION_LABEL))?;
    let pull_col = column(PULL_FORCE_LABEL).ok_or_else(|| missing(PULL_FORCE_LABEL))?;
    let clamp_col = column(CLAMP_FORCE_LABEL);

    let mut records = Vec::new();
    for (row, cells) in sheet.rows().filter(|(row, _)| *row > header_row) {
        let value = |col: usize| {
            let cell = cells
                .binary_search_by_key(&col, |cell| cell.col)
                .ok()
                .map(|index| &cells[index]);
            coerce(cell)
        };
        let Some(position_mm) = value(position_col) else {
            trace!(file = file_name, row = row + 1, "row without position dropped");
            continue;
        };
        records.push(Record {
            position_mm,
            pull_force_g: value(pull_col),
            clamp_force_g: clamp_col.and_then(value),
        });
    }
    debug!(file = file_name, records = records.len(), "measurement table loaded");

    Ok(MeasurementTable {
        file_name: file_name.to_owned(),
        sheet_name: sheet.name.to_owned(),
        header_row,
        labels,
        records,
    })
}

/// Converts a cell to a number; anything else becomes a missing value
fn coerce(cell: Option<&Cell>) -> Option<f64> {
    let cell = cell?;
    let number = cell.to_number();
    if number.is_none() {
        trace!(cell = %cell.reference(), value = %cell.value, "non-numeric cell read as missing");
    }
    number
}
