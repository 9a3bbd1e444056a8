use crate::analysis::batch::run_max_position_cm;
use crate::analysis::process_table;
use crate::analysis::MeasurementTable;
use crate::analysis::RunResult;
use crate::analysis::Source;
use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::column::Datum;
use crate::error::ForceRunsError;
use crate::extension::load_tables;
use crate::extension::resolve_window;
use crate::extension::writer::write_rows;
use crate::extension::writer::RowsBindData;
use crate::extension::writer::RowsInitData;
use crate::extension::CmHiParam;
use crate::extension::CmLoParam;
use crate::extension::FilesParam;
use crate::extension::NamedParam;
use crate::extension::Param;
use crate::extension::SheetNameParam;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;

/// Parameters shared by `read_runs` and `combine_runs`
pub(super) struct RunsParameters {
    pub(super) files: Vec<Source>,
    pub(super) sheet_name: Option<String>,
    pub(super) cm_lo: Option<f64>,
    pub(super) cm_hi: Option<f64>,
}

impl TryFrom<&BindInfo> for RunsParameters {
    type Error = ForceRunsError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(RunsParameters {
            files: FilesParam::read(bind, 0)?,
            sheet_name: SheetNameParam::read(bind)?,
            cm_lo: CmLoParam::read(bind)?,
            cm_hi: CmHiParam::read(bind)?,
        })
    }
}

impl RunsParameters {
    /// Loads every file and aggregates the runs of those that load.
    /// The default window end is taken over all loaded files.
    pub(super) fn process(&self) -> Result<Vec<(String, Vec<RunResult>)>, ForceRunsError> {
        let tables: Vec<(String, MeasurementTable)> = load_tables(&self.files, self.sheet_name.as_deref())
            .into_iter()
            .filter_map(|(file_name, table)| table.ok().map(|table| (file_name, table)))
            .collect();
        let max_position_cm = tables
            .iter()
            .filter_map(|(_, table)| run_max_position_cm(table))
            .reduce(f64::max);
        let window = resolve_window(self.cm_lo, self.cm_hi, max_position_cm)?;
        Ok(tables
            .iter()
            .map(|(file_name, table)| (file_name.to_owned(), process_table(table, &window)))
            .collect())
    }
}

/// Builds one row per run: file name, 1-based run number, average and peak.
fn runs_rows(results: &[(String, Vec<RunResult>)]) -> Vec<Vec<Datum>> {
    results
        .iter()
        .flat_map(|(file_name, runs)| {
            runs.iter().enumerate().map(move |(index, result)| {
                vec![
                    Datum::from(file_name.as_str()),
                    Datum::from(index + 1),
                    Datum::from(result.average()),
                    Datum::from(result.peak()),
                ]
            })
        })
        .collect()
}

/// `read_runs(files, cm_lo := , cm_hi := , sheet_name := )`
pub(crate) struct ReadRunsTableFunction;

impl VTab for ReadRunsTableFunction {
    type InitData = RowsInitData;
    type BindData = RowsBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = RunsParameters::try_from(bind)?;
        let data = RowsBindData {
            columns: vec![
                Column::new("file_name", ColumnType::Varchar),
                Column::new("run", ColumnType::BigInt),
                Column::new("average_force", ColumnType::Double),
                Column::new("peak_force", ColumnType::Double),
            ],
            rows: runs_rows(&parameters.process()?),
        };
        for column in &data.columns {
            bind.add_result_column(column.name.as_str(), column.logical_type());
        }
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(RowsInitData::new())
    }

    fn func(func: &TableFunctionInfo<Self>, output: &mut DataChunkHandle) -> Result<(), Box<dyn Error>> {
        write_rows(func.get_bind_data(), func.get_init_data(), output)?;
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![FilesParam::kind()])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            CmLoParam::definition(),
            CmHiParam::definition(),
            SheetNameParam::definition(),
        ])
    }
}
