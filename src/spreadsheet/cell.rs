use crate::error::ForceRunsError;
use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use std::fmt::Display;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as "1"/"0"
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// ISO 8601 duration strings
    IsoDuration,
    /// Text, either inline or resolved from the shared string table
    Text,
    /// Error values ("#DIV/0!", "#N/A", ...)
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Literal text, escapes and bracketed sections ("[Red]") are skipped.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single non-empty cell with position, type, and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as stored in the workbook
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Coerces the cell to a real number.
    ///
    /// Plain numbers and numeric text convert, and booleans read as 1 or 0.
    /// Dates, errors and anything that does not parse to a finite value
    /// yield `None`.
    pub(crate) fn to_number(&self) -> Option<f64> {
        let value = match self.kind {
            CellType::Number => self.value.parse::<f64>().ok(),
            CellType::Boolean => Some(if self.value == "1" { 1.0 } else { 0.0 }),
            CellType::Text => self.value.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|number| number.is_finite())
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = match self.kind {
            CellType::Boolean => Some(if self.value == "1" { "True" } else { "False" }.to_owned()),
            CellType::NumberDateTime1900 => to_datetime_string(&self.value, false).ok(),
            CellType::NumberDateTime1904 => to_datetime_string(&self.value, true).ok(),
            CellType::NumberDate1900 => to_date_string(&self.value, false).ok(),
            CellType::NumberDate1904 => to_date_string(&self.value, true).ok(),
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_time_string(&self.value).ok(),
            CellType::IsoDateTime => Some(self.value.replace('T', " ")),
            CellType::IsoDuration => Some(
                self.value
                    .replace("PT", "")
                    .replace('H', ":")
                    .replace('M', ":")
                    .replace('S', ""),
            ),
            _ => None,
        };
        // Unparseable serial dates fall back to the stored text
        write!(f, "{}", rendered.as_deref().unwrap_or(&self.value))
    }
}

/// Converts Excel numeric date to ISO date string.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, ForceRunsError> {
    let days = value.parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).ok_or_else(|| ForceRunsError::WithContextError("invalid epoch".to_owned()))?;
    Ok((epoch + Duration::days(days + offset)).format("%Y-%m-%d").to_string())
}

/// Converts the fractional part of an Excel serial number to an ISO time string.
fn to_time_string(value: &str) -> Result<String, ForceRunsError> {
    let fraction = value.parse::<f64>()?.fract();
    let mut rest = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = rest % 1_000;
    rest /= 1_000;
    let seconds = rest % 60;
    rest /= 60;
    let minutes = rest % 60;
    let hours = rest / 60;
    if milliseconds > 0 {
        Ok(format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}"))
    } else {
        Ok(format!("{hours:02}:{minutes:02}:{seconds:02}"))
    }
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, ForceRunsError> {
    Ok(format!("{} {}", to_date_string(value, is_1904)?, to_time_string(value)?))
}
