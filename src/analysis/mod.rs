//! # Run Analysis
//!
//! Turns one sheet of a force-vs-position recording into per-run summaries.
//! A recording holds several pull/clamp cycles ("runs") back to back; every
//! run starts where the position returns to exactly zero.
//!
//! The pipeline per file is [`load_table`] → [`segment_runs`] →
//! [`aggregate_window`], wrapped by [`process_file`] and [`process_batch`],
//! which isolate failures so one malformed file never stops the others.
use crate::error::ForceRunsError;
use crate::error::ResultMessage;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::open_spreadsheet_bytes;
use crate::spreadsheet::Spreadsheet;

pub(crate) mod batch;
pub(crate) mod chart;
pub(crate) mod segment;
pub(crate) mod table;
pub(crate) mod window;

pub use batch::max_position_cm;
pub use batch::process_batch;
pub use batch::process_file;
pub use batch::process_table;
pub use batch::survey_file;
pub use batch::try_process_file;
pub use batch::FileReport;
pub use batch::Survey;
pub use chart::combine_runs;
pub use chart::run_coverage;
pub use chart::y_axis_ceiling;
pub use chart::DEFAULT_BUFFER_G;
pub use segment::segment_runs;
pub use table::load_table;
pub use table::LoadError;
pub use table::MeasurementTable;
pub use table::Record;
pub use table::DEFAULT_SHEET_NAME;
pub use window::aggregate_window;
pub use window::RunResult;
pub use window::Window;
pub use window::WindowError;

/// A workbook to analyse: a local path or remote URL, or bytes already in memory.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Path(String),
    Bytes { name: String, bytes: Vec<u8> },
}

impl Source {
    /// Label used in results and log lines.
    pub fn name(&self) -> &str {
        match self {
            Source::Path(path) => path,
            Source::Bytes { name, .. } => name,
        }
    }

    pub(crate) fn open(&self) -> Result<Box<dyn Spreadsheet>, ForceRunsError> {
        let result = match self {
            Source::Path(path) => open_spreadsheet(path),
            Source::Bytes { name, bytes } => open_spreadsheet_bytes(name, bytes.to_owned()),
        };
        result.with_prefix(self.name())
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(path.to_owned())
    }
}

impl From<String> for Source {
    fn from(path: String) -> Self {
        Source::Path(path)
    }
}

impl<N: Into<String>> From<(N, Vec<u8>)> for Source {
    fn from((name, bytes): (N, Vec<u8>)) -> Self {
        Source::Bytes { name: name.into(), bytes }
    }
}

/// Settings shared by every file of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Sheet holding the measurements, matched as a glob pattern
    pub sheet_name: String,
    pub window: Window,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sheet_name: DEFAULT_SHEET_NAME.to_owned(),
            window: Window::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn sources_convert_from_paths_and_bytes() {
        assert_eq!(Source::from("data/pad.xlsx").name(), "data/pad.xlsx");
        let source = Source::from(("upload.ods", vec![1u8, 2, 3]));
        assert_eq!(source.name(), "upload.ods");
    }

    #[test]
    fn open_errors_name_the_source() {
        let error = Source::from(("broken.xlsx", b"not a workbook".to_vec())).open().err().unwrap();
        assert!(error.to_string().starts_with("broken.xlsx: "), "{error}");
        let bytes = fixtures::xlsx(&[(DEFAULT_SHEET_NAME, fixtures::sample_rows())]);
        assert!(Source::from(("pad.xlsx", bytes)).open().is_ok());
    }

    #[test]
    fn default_options_read_raw_data_over_full_range() {
        let options = Options::default();
        assert_eq!(options.sheet_name, "Raw Data");
        assert_eq!(options.window.cm_lo, 0.0);
        assert!(options.window.cm_hi.is_infinite());
    }
}
