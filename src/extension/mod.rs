//! # Table Functions
//!
//! SQL surface of the run analysis: parameter handling shared by the table
//! functions, and loading of the requested files during bind.
use crate::analysis::load_table;
use crate::analysis::MeasurementTable;
use crate::analysis::Source;
use crate::analysis::Window;
use crate::analysis::DEFAULT_SHEET_NAME;
use crate::database::bridge::ValueBridge;
use crate::error::ForceRunsError;
use crate::helpers::reader::UnifiedReader;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

pub(crate) mod analyze_runs;
pub(crate) mod combine_runs;
pub(crate) mod read_runs;
pub(crate) mod writer;

/// Errors raised while binding or scanning a table function.
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// Invalid parameter provided to a table function
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("No file matches '{0}'")]
    NoFilesMatched(String),

    #[error("Value does not fit column '{0}'")]
    ColumnTypeMismatch(String),
}

/// A positional parameter of a table function.
pub(crate) trait Param<T> {
    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Extracts and validates the parameter at `index`
    fn read(bind: &BindInfo, index: u64) -> Result<T, ForceRunsError>;
}

/// A named parameter of a table function.
pub(crate) trait NamedParam<T> {
    /// Returns the parameter name as used in SQL
    fn name() -> &'static str;

    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Returns the complete parameter definition (name and type)
    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_string(), Self::kind())
    }

    /// Extracts the parameter value, `None` when not provided
    fn read(bind: &BindInfo) -> Result<Option<T>, ForceRunsError>;
}

/// Workbooks to process: a path, a glob pattern or a remote URL
pub(crate) struct FilesParam;

/// Sheet holding the measurements: an exact name or a glob pattern
pub(crate) struct SheetNameParam;

/// Window start in centimetres
pub(crate) struct CmLoParam;

/// Window end in centimetres
pub(crate) struct CmHiParam;

impl Param<Vec<Source>> for FilesParam {
    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo, index: u64) -> Result<Vec<Source>, ForceRunsError> {
        expand_files(&bind.get_parameter(index).to_varchar())
    }
}

impl NamedParam<String> for SheetNameParam {
    fn name() -> &'static str {
        "sheet_name"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, ForceRunsError> {
        Ok(bind.get_named_parameter(Self::name()).map(|value| value.to_varchar()))
    }
}

impl NamedParam<f64> for CmLoParam {
    fn name() -> &'static str {
        "cm_lo"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Double)
    }

    fn read(bind: &BindInfo) -> Result<Option<f64>, ForceRunsError> {
        Ok(bind.get_named_parameter(Self::name()).map(|value| value.to_double()))
    }
}

impl NamedParam<f64> for CmHiParam {
    fn name() -> &'static str {
        "cm_hi"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Double)
    }

    fn read(bind: &BindInfo) -> Result<Option<f64>, ForceRunsError> {
        Ok(bind.get_named_parameter(Self::name()).map(|value| value.to_double()))
    }
}

/// Expands a file argument into sources.
///
/// Remote URLs are passed through untouched. Local arguments containing glob
/// characters must match at least one file; plain paths are kept as given so
/// an unreadable file is reported like any other per-file failure.
pub(crate) fn expand_files(argument: &str) -> Result<Vec<Source>, ForceRunsError> {
    let argument = argument.trim();
    if argument.is_empty() {
        Err(ExtensionError::InvalidParameter {
            name: "files".to_owned(),
            message: "file name must not be empty".to_owned(),
        })?;
    }
    if UnifiedReader::is_remote_url(argument) || !argument.contains(['*', '?', '[']) {
        return Ok(vec![Source::from(argument)]);
    }
    let mut files = Vec::new();
    for entry in glob::glob(argument)? {
        let path = entry?;
        if path.is_file() {
            files.push(Source::from(path.to_string_lossy().to_string()));
        }
    }
    if files.is_empty() {
        Err(ExtensionError::NoFilesMatched(argument.to_owned()))?;
    }
    debug!(pattern = argument, files = files.len(), "file pattern expanded");
    Ok(files)
}

/// Resolves the window of a query. The end defaults to the largest run
/// position of the batch so the default window covers every run.
pub(crate) fn resolve_window(cm_lo: Option<f64>, cm_hi: Option<f64>, max_position_cm: Option<f64>) -> Result<Window, ForceRunsError> {
    let cm_lo = cm_lo.unwrap_or(0.0);
    let cm_hi = match cm_hi {
        Some(cm_hi) => cm_hi,
        None => max_position_cm.filter(|max| *max > cm_lo).unwrap_or(f64::INFINITY),
    };
    let window = Window::new(cm_lo, cm_hi).map_err(|error| ExtensionError::InvalidParameter {
        name: format!("{}/{}", CmLoParam::name(), CmHiParam::name()),
        message: error.to_string(),
    })?;
    if max_position_cm.map(|max| window.cm_hi > max).unwrap_or(false) {
        debug!(cm_hi = window.cm_hi, max_position_cm, "window ends past the recorded positions");
    }
    Ok(window)
}

/// Loads every source; failures are logged and kept next to the file name.
pub(crate) fn load_tables(sources: &[Source], sheet_name: Option<&str>) -> Vec<(String, Result<MeasurementTable, ForceRunsError>)> {
    let sheet_name = sheet_name.unwrap_or(DEFAULT_SHEET_NAME);
    sources
        .iter()
        .map(|source| {
            let table = load_table(source, sheet_name);
            if let Err(error) = &table {
                warn!(file = source.name(), %error, "file skipped");
            }
            (source.name().to_owned(), table)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::fs;

    #[test]
    fn plain_paths_and_urls_pass_through() {
        assert_eq!(expand_files("missing.xlsx").unwrap(), vec![Source::from("missing.xlsx")]);
        assert_eq!(
            expand_files("https://example.com/data/*.xlsx").unwrap(),
            vec![Source::from("https://example.com/data/*.xlsx")]
        );
        assert!(expand_files("  ").is_err());
    }

    #[test]
    fn glob_patterns_expand_to_sorted_files() {
        let directory = tempfile::tempdir().unwrap();
        for name in ["pad_b.xlsx", "pad_a.xlsx", "notes.txt"] {
            fs::write(directory.path().join(name), b"").unwrap();
        }
        fs::create_dir(directory.path().join("pad_c.xlsx")).unwrap();

        let pattern = directory.path().join("pad_*.xlsx").to_string_lossy().to_string();
        let names: Vec<String> = expand_files(&pattern)
            .unwrap()
            .iter()
            .map(|source| source.name().rsplit(['/', '\\']).next().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(names, vec!["pad_a.xlsx", "pad_b.xlsx"]);

        let nothing = directory.path().join("*.ods").to_string_lossy().to_string();
        assert!(expand_files(&nothing).err().unwrap().to_string().starts_with("No file matches"));
    }

    #[test]
    fn window_defaults_to_observed_range() {
        assert_eq!(resolve_window(None, None, Some(2.5)).unwrap(), Window::new(0.0, 2.5).unwrap());
        assert_eq!(resolve_window(Some(1.0), None, Some(2.5)).unwrap(), Window::new(1.0, 2.5).unwrap());
        assert_eq!(resolve_window(None, None, None).unwrap().cm_hi, f64::INFINITY);
        assert_eq!(resolve_window(Some(3.0), None, Some(2.5)).unwrap().cm_hi, f64::INFINITY);
        assert_eq!(resolve_window(None, Some(9.0), Some(2.5)).unwrap().cm_hi, 9.0);
    }

    #[test]
    fn invalid_windows_fail() {
        let error = resolve_window(Some(-1.0), Some(2.0), None).err().unwrap();
        assert!(error.to_string().starts_with("Invalid parameter 'cm_lo/cm_hi'"), "{error}");
        assert!(resolve_window(Some(2.0), Some(1.0), None).is_err());
    }

    #[test]
    fn failed_loads_stay_next_to_their_file() {
        let good = Source::from(("good.xlsx", fixtures::xlsx(&[(DEFAULT_SHEET_NAME, fixtures::sample_rows())])));
        let bad = Source::from(("bad.xlsx", b"garbage".to_vec()));
        let tables = load_tables(&[bad, good], None);
        assert_eq!(tables[0].0, "bad.xlsx");
        assert!(tables[0].1.is_err());
        assert_eq!(tables[1].0, "good.xlsx");
        assert_eq!(tables[1].1.as_ref().map(|table| table.len()).unwrap_or(0), 8);
    }
}
