use crate::analysis::batch::survey_table;
use crate::analysis::MeasurementTable;
use crate::analysis::Source;
use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::column::Datum;
use crate::error::ForceRunsError;
use crate::extension::load_tables;
use crate::extension::writer::write_rows;
use crate::extension::writer::RowsBindData;
use crate::extension::writer::RowsInitData;
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

/// Parameters for surveying recordings
struct AnalyzeRunsParameters {
    files: Vec<Source>,
    sheet_name: Option<String>,
}

impl TryFrom<&BindInfo> for AnalyzeRunsParameters {
    type Error = ForceRunsError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(AnalyzeRunsParameters {
            files: FilesParam::read(bind, 0)?,
            sheet_name: SheetNameParam::read(bind)?,
        })
    }
}

/// One row per file. Files that fail to load keep their row, with the
/// failure in `error` and every other column NULL.
fn survey_rows(tables: &[(String, Result<MeasurementTable, ForceRunsError>)]) -> Vec<Vec<Datum>> {
    tables
        .iter()
        .map(|(file_name, table)| match table {
            Ok(table) => {
                let survey = survey_table(table);
                vec![
                    Datum::from(file_name.as_str()),
                    Datum::from(survey.sheet_name.as_str()),
                    Datum::from(survey.header_row + 1),
                    Datum::from(survey.rows),
                    Datum::from(survey.runs),
                    Datum::from(survey.max_position_cm),
                    Datum::Null,
                ]
            }
            Err(error) => vec![
                Datum::from(file_name.as_str()),
                Datum::Null,
                Datum::Null,
                Datum::Null,
                Datum::Null,
                Datum::Null,
                Datum::Varchar(error.to_string()),
            ],
        })
        .collect()
}

/// `analyze_runs(files, sheet_name := )`
pub(crate) struct AnalyzeRunsTableFunction;

impl VTab for AnalyzeRunsTableFunction {
    type InitData = RowsInitData;
    type BindData = RowsBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = AnalyzeRunsParameters::try_from(bind)?;
        let tables = load_tables(&parameters.files, parameters.sheet_name.as_deref());
        let data = RowsBindData {
            columns: vec![
                Column::new("file_name", ColumnType::Varchar),
                Column::new("sheet_name", ColumnType::Varchar),
                Column::new("header_row", ColumnType::BigInt),
                Column::new("rows", ColumnType::BigInt),
                Column::new("runs", ColumnType::BigInt),
                Column::new("max_position_cm", ColumnType::Double),
                Column::new("error", ColumnType::Varchar),
            ],
            rows: survey_rows(&tables),
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
        Some(vec![SheetNameParam::definition()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DEFAULT_SHEET_NAME;
    use crate::fixtures;
    use crate::fixtures::Value;

    #[test]
    fn every_file_gets_a_row() {
        let headless = vec![vec![Value::Text("Force")], vec![Value::Number(1.0)]];
        let sources = [
            Source::from(("pad.ods", fixtures::ods(&[(DEFAULT_SHEET_NAME, fixtures::sample_rows())]))),
            Source::from(("headless.xlsx", fixtures::xlsx(&[(DEFAULT_SHEET_NAME, headless)]))),
        ];
        let rows = survey_rows(&load_tables(&sources, None));

        assert_eq!(rows[0], vec![
            Datum::from("pad.ods"),
            Datum::from("Raw Data"),
            Datum::BigInt(4),
            Datum::BigInt(8),
            Datum::BigInt(3),
            Datum::Double(1.0),
            Datum::Null,
        ]);
        assert_eq!(rows[1][0], Datum::from("headless.xlsx"));
        assert_eq!(rows[1][1..6], vec![Datum::Null; 5][..]);
        assert_eq!(rows[1][6], Datum::from("No row matching 'Position mm' found in 'headless.xlsx'"));
    }
}
