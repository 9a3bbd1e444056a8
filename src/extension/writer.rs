//! Writes pre-computed result rows into DuckDB vectors.

use crate::database::column::Column;
use crate::database::column::Datum;
use crate::error::ForceRunsError;
use crate::extension::ExtensionError;
use duckdb::core::DataChunkHandle;
use duckdb::core::FlatVector;
use duckdb::core::Inserter;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Rows handed out per call of a table function
const CHUNK_SIZE: usize = 2048;

/// Columns and rows computed while binding a table function.
pub(crate) struct RowsBindData {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<Datum>>,
}

/// Position of the next row to hand out.
pub(crate) struct RowsInitData {
    index: AtomicUsize,
}

impl RowsInitData {
    pub(crate) fn new() -> Self {
        RowsInitData { index: AtomicUsize::new(0) }
    }
}

/// Fills `output` with the next chunk of rows; an empty chunk ends the scan.
pub(crate) fn write_rows(bind: &RowsBindData, init: &RowsInitData, output: &mut DataChunkHandle) -> Result<(), ForceRunsError> {
    let lower = init.index.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
    let upper = bind.rows.len().min(lower.saturating_add(CHUNK_SIZE));
    if lower < upper {
        let mut vectors: Vec<FlatVector> = (0..bind.columns.len()).map(|index| output.flat_vector(index)).collect();
        for (row, record) in bind.rows[lower..upper].iter().enumerate() {
            for ((column, datum), vector) in bind.columns.iter().zip(record).zip(vectors.iter_mut()) {
                write_to_vector(column, datum, vector, row)?;
            }
        }
        output.set_len(upper - lower);
    } else {
        output.set_len(0);
    }
    Ok(())
}

/// Writes one datum, checking it against the column type.
fn write_to_vector(column: &Column, datum: &Datum, vector: &mut FlatVector, row: usize) -> Result<(), ForceRunsError> {
    if !column.kind.accepts(datum) {
        Err(ExtensionError::ColumnTypeMismatch(column.name.to_owned()))?;
    }
    match datum {
        Datum::Null => vector.set_null(row),
        Datum::BigInt(value) => write_primitive(vector, row, *value),
        Datum::Double(value) => write_primitive(vector, row, *value),
        Datum::Varchar(value) => vector.insert(row, value.as_str()),
    }
    Ok(())
}

/// Writes a primitive value directly to a vector using pointer arithmetic.
fn write_primitive<T>(vector: &mut FlatVector, index: usize, value: T) {
    unsafe {
        let pointer: *mut T = vector.as_mut_ptr();
        std::ptr::write(pointer.add(index), value);
    }
}
