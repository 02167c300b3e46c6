use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;
use tiberius::Query;
use tiberius::numeric::Numeric;

use crate::results::{ErrorDescriptor, ErrorKind};
use crate::types::{Param, SqlType, SqlValue};

static PARAM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_#][A-Za-z0-9_#$@]{0,127}$").expect("parameter name pattern is valid")
});

/// A batch rewritten for named binding, ready to be bound positionally.
///
/// Every parameter is sent as `@P<n>` and re-declared under its own name in a
/// prelude on the batch's first line, so `@UserName` in the caller's SQL
/// refers to a local variable of the parameter's declared type. Keeping the
/// prelude on line one leaves server-reported line numbers unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatch<'a> {
    pub(crate) sql: String,
    pub(crate) params: &'a [Param],
}

impl<'a> PreparedBatch<'a> {
    /// Validate parameter names and types and build the prelude.
    ///
    /// # Errors
    ///
    /// Returns a `Parameter` descriptor for an invalid name or type bound.
    pub fn new(sql: &str, params: &'a [Param]) -> Result<Self, ErrorDescriptor> {
        if params.is_empty() {
            return Ok(Self {
                sql: sql.to_string(),
                params,
            });
        }

        let mut prelude = String::with_capacity(params.len() * 48 + sql.len());
        for (idx, param) in params.iter().enumerate() {
            let name = param.bare_name();
            if !PARAM_NAME.is_match(name) {
                return Err(ErrorDescriptor::new(
                    ErrorKind::Parameter,
                    format!("invalid parameter name '{}'", param.name),
                ));
            }
            param.sql_type.validate().map_err(|e| {
                ErrorDescriptor::new(ErrorKind::Parameter, format!("parameter @{name}: {e}"))
            })?;
            let _ = write!(
                prelude,
                "DECLARE @{name} {} = @P{}; ",
                param.sql_type.declaration(),
                idx + 1
            );
        }
        prelude.push_str(sql);

        Ok(Self {
            sql: prelude,
            params,
        })
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Build the tiberius query with every parameter bound in declaration order.
    #[must_use]
    pub fn into_query(self) -> Query<'a> {
        let mut query = Query::new(self.sql);
        for param in self.params {
            bind_param(&mut query, param);
        }
        query
    }
}

fn bind_param(query: &mut Query<'_>, param: &Param) {
    match &param.value {
        SqlValue::Null => bind_null(query, param.sql_type),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Decimal(d) => query.bind(numeric(d)),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Binary(bytes) => query.bind(bytes.clone()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::Time(t) => query.bind(*t),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::DateTimeOffset(dt) => query.bind(*dt),
    }
}

/// The driver only binds its own `Numeric`; a `Decimal` scale is at most 28.
#[allow(clippy::cast_possible_truncation)]
fn numeric(value: &Decimal) -> Numeric {
    Numeric::new_with_scale(value.mantissa(), value.scale() as u8)
}

/// NULLs are sent with a type that converts implicitly to the declared one.
fn bind_null(query: &mut Query<'_>, sql_type: SqlType) {
    match sql_type {
        SqlType::Bit => query.bind(Option::<bool>::None),
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt => {
            query.bind(Option::<i64>::None);
        }
        SqlType::Numeric { .. }
        | SqlType::Decimal { .. }
        | SqlType::SmallMoney
        | SqlType::Money => query.bind(Option::<Numeric>::None),
        SqlType::Float | SqlType::Real => query.bind(Option::<f64>::None),
        SqlType::SmallDateTime | SqlType::DateTime | SqlType::DateTime2 => {
            query.bind(Option::<NaiveDateTime>::None);
        }
        SqlType::Date => query.bind(Option::<NaiveDate>::None),
        SqlType::Time => query.bind(Option::<NaiveTime>::None),
        SqlType::DateTimeOffset => query.bind(Option::<DateTime<FixedOffset>>::None),
        SqlType::Binary(_) | SqlType::VarBinary(_) | SqlType::Image => {
            query.bind(Option::<Vec<u8>>::None);
        }
        _ => query.bind(Option::<String>::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Length;

    #[test]
    fn batch_without_parameters_is_sent_unchanged() {
        let batch = PreparedBatch::new("SELECT 1 AS One;", &[]).unwrap();
        assert_eq!(batch.sql(), "SELECT 1 AS One;");
    }

    #[test]
    fn parameters_are_declared_in_order_on_the_first_line() {
        let params = [
            Param::new("UserName", SqlType::nvarchar(), "alice"),
            Param::new(
                "@Amount",
                SqlType::Decimal {
                    precision: 19,
                    scale: 4,
                },
                Decimal::new(125, 1),
            ),
        ];
        let batch = PreparedBatch::new("SELECT @UserName AS U;\nSELECT @Amount AS A;", &params)
            .unwrap();
        assert_eq!(
            batch.sql(),
            "DECLARE @UserName nvarchar(max) = @P1; DECLARE @Amount decimal(19,4) = @P2; \
             SELECT @UserName AS U;\nSELECT @Amount AS A;"
        );
        assert_eq!(batch.sql().lines().count(), 2);
    }

    #[test]
    fn names_that_could_inject_sql_are_rejected() {
        let params = [Param::new(
            "x int; DROP TABLE dbo.SalesAgents; --",
            SqlType::Int,
            1,
        )];
        let err = PreparedBatch::new("SELECT 1;", &params).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parameter);
    }

    #[test]
    fn out_of_range_types_are_rejected_before_sending() {
        let params = [Param::new("Code", SqlType::VarChar(Length::Chars(9000)), "x")];
        let err = PreparedBatch::new("SELECT @Code;", &params).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parameter);
        assert!(err.message.contains("@Code"));
    }

    fn bound(params: &[Param]) -> String {
        let batch = PreparedBatch::new("SELECT 1;", params).unwrap();
        format!("{:?}", batch.into_query())
    }

    #[test]
    fn every_value_kind_binds_in_declaration_order() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let stamp = day.and_hms_opt(13, 45, 0).unwrap();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let params = [
            Param::new("Flag", SqlType::Bit, true),
            Param::new("Count", SqlType::BigInt, 7_i64),
            Param::new("Ratio", SqlType::Float, 0.5),
            Param::new(
                "Amount",
                SqlType::Decimal {
                    precision: 19,
                    scale: 2,
                },
                Decimal::new(-123_456, 2),
            ),
            Param::new("Name", SqlType::nvarchar(), "alice"),
            Param::new("Blob", SqlType::VarBinary(Length::Max), vec![1_u8, 2]),
            Param::new("Day", SqlType::Date, day),
            Param::new("At", SqlType::Time, stamp.time()),
            Param::new("Stamp", SqlType::DateTime2, stamp),
            Param::new(
                "Zoned",
                SqlType::DateTimeOffset,
                stamp.and_local_timezone(offset).single().unwrap(),
            ),
        ];
        let debug = bound(&params);
        let expected = [
            "Bit(Some(true))",
            "I64(Some(7))",
            "F64(Some(0.5))",
            "Numeric(Some(",
            r#"String(Some("alice"))"#,
            "Binary(Some([1, 2]))",
            "Date(Some(",
            "Time(Some(",
            "DateTime2(Some(",
            "DateTimeOffset(Some(",
        ];
        let mut from = 0;
        for needle in expected {
            let at = debug[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("{needle} missing after offset {from} in {debug}"));
            from += at + needle.len();
        }
    }

    #[test]
    fn decimals_keep_mantissa_and_scale() {
        let value = numeric(&Decimal::new(-123_456, 2));
        assert_eq!(value.value(), -123_456);
        assert_eq!(value.scale(), 2);
        let widest = numeric(&Decimal::MAX);
        assert_eq!(widest.value(), Decimal::MAX.mantissa());
        assert_eq!(widest.scale(), 0);
    }

    #[test]
    fn null_parameters_bind_with_their_declared_type() {
        let params = [
            Param::new("Blob", SqlType::VarBinary(Length::Max), SqlValue::Null),
            Param::new("When", SqlType::DateTimeOffset, SqlValue::Null),
            Param::new(
                "Amount",
                SqlType::Decimal {
                    precision: 38,
                    scale: 10,
                },
                SqlValue::Null,
            ),
            Param::new("Count", SqlType::Int, SqlValue::Null),
            Param::new("Name", SqlType::nvarchar(), SqlValue::Null),
        ];
        let debug = bound(&params);
        for needle in [
            "Binary(None)",
            "DateTimeOffset(None)",
            "Numeric(None)",
            "I64(None)",
            "String(None)",
        ] {
            assert!(debug.contains(needle), "{needle} missing in {debug}");
        }
    }
}
