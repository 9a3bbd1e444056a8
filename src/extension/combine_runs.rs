use crate::analysis::combine_runs;
use crate::analysis::run_coverage;
use crate::analysis::RunResult;
use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::column::Datum;
use crate::extension::read_runs::RunsParameters;
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

/// One row per run index across the group of files.
fn combined_rows(per_file: &[Vec<RunResult>]) -> Vec<Vec<Datum>> {
    combine_runs(per_file)
        .iter()
        .zip(run_coverage(per_file))
        .enumerate()
        .map(|(index, (result, files))| {
            vec![
                Datum::from(index + 1),
                Datum::from(files),
                Datum::from(result.average()),
                Datum::from(result.peak()),
            ]
        })
        .collect()
}

/// `combine_runs(files, cm_lo := , cm_hi := , sheet_name := )`
pub(crate) struct CombineRunsTableFunction;

impl VTab for CombineRunsTableFunction {
    type InitData = RowsInitData;
    type BindData = RowsBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = RunsParameters::try_from(bind)?;
        let per_file: Vec<Vec<RunResult>> = parameters
            .process()?
            .into_iter()
            .map(|(_, results)| results)
            .collect();
        let data = RowsBindData {
            columns: vec![
                Column::new("run", ColumnType::BigInt),
                Column::new("files", ColumnType::BigInt),
                Column::new("average_force", ColumnType::Double),
                Column::new("peak_force", ColumnType::Double),
            ],
            rows: combined_rows(&per_file),
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
