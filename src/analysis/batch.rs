use crate::analysis::segment::segment_runs;
use crate::analysis::table::load_table;
use crate::analysis::table::MeasurementTable;
use crate::analysis::window::aggregate_window;
use crate::analysis::window::RunResult;
use crate::analysis::window::Window;
use crate::analysis::Options;
use crate::analysis::Source;
use crate::error::ForceRunsError;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Outcome of one file of a batch.
#[derive(Debug)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: Result<Vec<RunResult>, ForceRunsError>,
}

impl FileReport {
    /// Results of the file, empty when it failed to load.
    pub fn results(&self) -> &[RunResult] {
        self.outcome.as_deref().unwrap_or_default()
    }
}

/// Shape of a recording, without any window applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Survey {
    pub file_name: String,
    pub sheet_name: String,
    /// 0-based sheet row of the header
    pub header_row: usize,
    pub rows: usize,
    pub runs: usize,
    /// Largest position inside any run, in centimetres
    pub max_position_cm: Option<f64>,
}

/// Aggregates every run of a loaded table, in row order.
pub fn process_table(table: &MeasurementTable, window: &Window) -> Vec<RunResult> {
    let runs = segment_runs(table);
    if runs.is_empty() {
        info!(file = %table.file_name, "no usable data: no row with position 0");
        return Vec::new();
    }
    debug!(file = %table.file_name, runs = runs.len(), "runs detected");
    if table.max_position_cm().map(|max| window.cm_hi > max).unwrap_or(false) {
        debug!(file = %table.file_name, cm_hi = window.cm_hi, "window ends past the recorded positions");
    }
    runs.into_iter()
        .map(|range| aggregate_window(table, range, window))
        .collect()
}

/// Loads, segments and aggregates one file, propagating load failures.
pub fn try_process_file(source: &Source, options: &Options) -> Result<Vec<RunResult>, ForceRunsError> {
    let table = load_table(source, &options.sheet_name)?;
    Ok(process_table(&table, &options.window))
}

/// Loads, segments and aggregates one file.
///
/// A file that cannot be loaded is logged and yields no results, so callers
/// looping over many files never stop at a bad one.
pub fn process_file(source: &Source, options: &Options) -> Vec<RunResult> {
    match try_process_file(source, options) {
        Ok(results) => results,
        Err(error) => {
            warn!(file = source.name(), %error, "file skipped");
            Vec::new()
        }
    }
}

/// Processes every file in input order, one report per file.
pub fn process_batch(sources: &[Source], options: &Options) -> Vec<FileReport> {
    sources
        .iter()
        .map(|source| {
            let outcome = try_process_file(source, options);
            if let Err(error) = &outcome {
                warn!(file = source.name(), %error, "file skipped");
            }
            FileReport {
                file_name: source.name().to_owned(),
                outcome,
            }
        })
        .collect()
}

/// Largest position inside any run of the table, in centimetres.
pub(crate) fn run_max_position_cm(table: &MeasurementTable) -> Option<f64> {
    segment_runs(table)
        .into_iter()
        .flat_map(|range| table.records[range].iter())
        .map(|record| record.position_mm / 10.0)
        .reduce(f64::max)
}

/// Describes the header, rows and runs of one file.
pub fn survey_file(source: &Source, sheet_name: &str) -> Result<Survey, ForceRunsError> {
    let table = load_table(source, sheet_name)?;
    Ok(survey_table(&table))
}

pub(crate) fn survey_table(table: &MeasurementTable) -> Survey {
    Survey {
        file_name: table.file_name.to_owned(),
        sheet_name: table.sheet_name.to_owned(),
        header_row: table.header_row,
        rows: table.len(),
        runs: segment_runs(table).len(),
        max_position_cm: run_max_position_cm(table),
    }
}

/// Largest run position across all files that load; the natural upper
/// bound of a window covering every run.
pub fn max_position_cm(sources: &[Source], sheet_name: &str) -> Option<f64> {
    sources
        .iter()
        .filter_map(|source| match survey_file(source, sheet_name) {
            Ok(survey) => survey.max_position_cm,
            Err(error) => {
                warn!(file = source.name(), %error, "file skipped");
                None
            }
        })
        .reduce(f64::max)
}
