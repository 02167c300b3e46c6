use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::SalesDashboardError;

/// Values read from a result row or bound as query parameters.
///
/// ```rust
/// use sales_dashboard::types::SqlValue;
///
/// let values = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// `bit`
    Bool(bool),
    /// `tinyint`, `smallint`, `int` and `bigint`, widened to 64 bits
    Int(i64),
    /// `float`, `real`, `money` and `smallmoney`
    Float(f64),
    /// `numeric` / `decimal`
    Decimal(Decimal),
    /// Character data; unique identifiers and XML are also surfaced as text
    Text(String),
    /// `binary`, `varbinary`, `image`
    Binary(Vec<u8>),
    /// `date`
    Date(NaiveDate),
    /// `time`
    Time(NaiveTime),
    /// `smalldatetime`, `datetime`, `datetime2`
    DateTime(NaiveDateTime),
    /// `datetimeoffset`
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(value) => Some(*value),
            SqlValue::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    /// Numeric view of integer, float and decimal values.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(value) => Some(*value as f64),
            SqlValue::Float(value) => Some(*value),
            SqlValue::Decimal(value) => value.to_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(value) => Some(*value),
            SqlValue::Int(1) => Some(true),
            SqlValue::Int(0) => Some(false),
            _ => None,
        }
    }

    /// Calendar date of any date-bearing value (offset values use their local date).
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(value) => Some(*value),
            SqlValue::DateTime(value) => Some(value.date()),
            SqlValue::DateTimeOffset(value) => Some(value.date_naive()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::DateTime(value) => Some(*value),
            SqlValue::Date(value) => value.and_hms_opt(0, 0, 0),
            SqlValue::DateTimeOffset(value) => Some(value.naive_local()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Binary(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Decimal(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Binary(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(value: NaiveTime) -> Self {
        SqlValue::Time(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for SqlValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        SqlValue::DateTimeOffset(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Length of a variable-length character or binary type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Chars(u16),
    Max,
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Chars(n) => write!(f, "{n}"),
            Length::Max => f.write_str("max"),
        }
    }
}

/// Declared SQL Server type of a query parameter.
///
/// The legacy `text`, `ntext` and `image` types cannot be declared as local
/// variables, so they are declared through their `(max)` successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Numeric { precision: u8, scale: u8 },
    Decimal { precision: u8, scale: u8 },
    SmallMoney,
    Money,
    Float,
    Real,
    SmallDateTime,
    DateTime,
    DateTime2,
    DateTimeOffset,
    Time,
    Date,
    Char(u16),
    VarChar(Length),
    Text,
    NChar(u16),
    NVarChar(Length),
    NText,
    Binary(u16),
    VarBinary(Length),
    Image,
    UniqueIdentifier,
    Variant,
    Xml,
}

const MAX_PRECISION: u8 = 38;
const MAX_BYTES: u16 = 8000;
const MAX_WIDE_CHARS: u16 = 4000;

impl SqlType {
    /// `nvarchar(max)`, the usual choice for free text.
    #[must_use]
    pub fn nvarchar() -> Self {
        SqlType::NVarChar(Length::Max)
    }

    /// Check precision, scale and length bounds.
    ///
    /// # Errors
    ///
    /// Returns `SalesDashboardError::ParameterError` when a bound is exceeded.
    pub fn validate(&self) -> Result<(), SalesDashboardError> {
        match *self {
            SqlType::Numeric { precision, scale } | SqlType::Decimal { precision, scale } => {
                if precision == 0 || precision > MAX_PRECISION {
                    return Err(SalesDashboardError::ParameterError(format!(
                        "precision {precision} is outside 1..={MAX_PRECISION}"
                    )));
                }
                if scale > precision {
                    return Err(SalesDashboardError::ParameterError(format!(
                        "scale {scale} exceeds precision {precision}"
                    )));
                }
                Ok(())
            }
            SqlType::Char(n) | SqlType::Binary(n) => check_length(n, MAX_BYTES),
            SqlType::VarChar(Length::Chars(n)) | SqlType::VarBinary(Length::Chars(n)) => {
                check_length(n, MAX_BYTES)
            }
            SqlType::NChar(n) | SqlType::NVarChar(Length::Chars(n)) => {
                check_length(n, MAX_WIDE_CHARS)
            }
            _ => Ok(()),
        }
    }

    /// T-SQL type name used when declaring the parameter.
    #[must_use]
    pub fn declaration(&self) -> String {
        match self {
            SqlType::Bit => "bit".into(),
            SqlType::TinyInt => "tinyint".into(),
            SqlType::SmallInt => "smallint".into(),
            SqlType::Int => "int".into(),
            SqlType::BigInt => "bigint".into(),
            SqlType::Numeric { precision, scale } => format!("numeric({precision},{scale})"),
            SqlType::Decimal { precision, scale } => format!("decimal({precision},{scale})"),
            SqlType::SmallMoney => "smallmoney".into(),
            SqlType::Money => "money".into(),
            SqlType::Float => "float".into(),
            SqlType::Real => "real".into(),
            SqlType::SmallDateTime => "smalldatetime".into(),
            SqlType::DateTime => "datetime".into(),
            SqlType::DateTime2 => "datetime2".into(),
            SqlType::DateTimeOffset => "datetimeoffset".into(),
            SqlType::Time => "time".into(),
            SqlType::Date => "date".into(),
            SqlType::Char(n) => format!("char({n})"),
            SqlType::VarChar(len) => format!("varchar({len})"),
            SqlType::Text => "varchar(max)".into(),
            SqlType::NChar(n) => format!("nchar({n})"),
            SqlType::NVarChar(len) => format!("nvarchar({len})"),
            SqlType::NText => "nvarchar(max)".into(),
            SqlType::Binary(n) => format!("binary({n})"),
            SqlType::VarBinary(len) => format!("varbinary({len})"),
            SqlType::Image => "varbinary(max)".into(),
            SqlType::UniqueIdentifier => "uniqueidentifier".into(),
            SqlType::Variant => "sql_variant".into(),
            SqlType::Xml => "xml".into(),
        }
    }
}

fn check_length(n: u16, max: u16) -> Result<(), SalesDashboardError> {
    if n == 0 || n > max {
        return Err(SalesDashboardError::ParameterError(format!(
            "length {n} is outside 1..={max}"
        )));
    }
    Ok(())
}

/// A named, typed query parameter.
///
/// Referenced in the batch as `@name`; a leading `@` in `name` is accepted and ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub sql_type: SqlType,
    pub value: SqlValue,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType, value: impl Into<SqlValue>) -> Self {
        Self {
            name: name.into(),
            sql_type,
            value: value.into(),
        }
    }

    /// Name without the leading `@`.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.strip_prefix('@').unwrap_or(&self.name)
    }
}

/// Transaction isolation levels, passed through to the server unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

impl IsolationLevel {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
            IsolationLevel::Snapshot => "SNAPSHOT",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
