use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;

/// Column types produced by the table functions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ColumnType {
    /// 64-bit signed integers
    BigInt,
    /// Double-precision floating point numbers
    Double,
    /// Variable-length strings
    Varchar,
}

/// A result column with name and data type.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnType,
}

/// A single value of a result row; `Null` fits every column.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Datum {
    Null,
    BigInt(i64),
    Double(f64),
    Varchar(String),
}

impl Column {
    pub(crate) fn new(name: &str, kind: ColumnType) -> Self {
        Column {
            name: name.to_owned(),
            kind,
        }
    }

    pub(crate) fn logical_type(&self) -> LogicalTypeHandle {
        LogicalTypeHandle::from(self.kind.to_logical_type_id())
    }
}

impl ColumnType {
    /// Converts column type to DuckDB's logical type ID.
    pub(crate) const fn to_logical_type_id(&self) -> LogicalTypeId {
        match self {
            Self::BigInt => LogicalTypeId::Bigint,
            Self::Double => LogicalTypeId::Double,
            Self::Varchar => LogicalTypeId::Varchar,
        }
    }

    /// Returns true if the datum can be stored in a column of this type.
    pub(crate) fn accepts(&self, datum: &Datum) -> bool {
        matches!(
            (self, datum),
            (_, Datum::Null)
                | (ColumnType::BigInt, Datum::BigInt(_))
                | (ColumnType::Double, Datum::Double(_))
                | (ColumnType::Varchar, Datum::Varchar(_))
        )
    }
}

impl From<Option<f64>> for Datum {
    fn from(value: Option<f64>) -> Self {
        value.map(Datum::Double).unwrap_or(Datum::Null)
    }
}

impl From<usize> for Datum {
    fn from(value: usize) -> Self {
        i64::try_from(value).map(Datum::BigInt).unwrap_or(Datum::Null)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Varchar(value.to_owned())
    }
}
