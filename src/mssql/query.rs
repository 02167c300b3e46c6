use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, FromSql, QueryItem};

use super::collector::{BatchCollector, BatchEvent};
use super::config::MssqlClient;
use super::params::PreparedBatch;
use crate::results::{ErrorDescriptor, QueryResult, Row};
use crate::types::{Param, SqlValue};

/// Run one batch and normalize everything it produces into a [`QueryResult`].
///
/// Never fails: server and transport errors come back as
/// [`QueryResult::Failure`]. Result-set metadata marks the boundary between
/// statements, so statements that return no rows contribute no result set.
pub async fn run_batch(client: &mut MssqlClient, sql: &str, params: &[Param]) -> QueryResult {
    let mut collector = BatchCollector::new();

    let batch = match PreparedBatch::new(sql, params) {
        Ok(batch) => batch,
        Err(error) => {
            tracing::warn!(%error, "batch rejected before submission");
            collector.apply(BatchEvent::Error(error));
            return collector.into_result();
        }
    };
    tracing::debug!(
        sql = batch.sql(),
        params = ?params.iter().map(Param::bare_name).collect::<Vec<_>>(),
        "submitting batch"
    );

    match batch.into_query().query(client).await {
        Ok(mut stream) => {
            let mut columns: Arc<Vec<String>> = Arc::default();
            loop {
                match stream.try_next().await {
                    Ok(Some(QueryItem::Metadata(meta))) => {
                        collector.apply(BatchEvent::Boundary);
                        columns = Arc::new(
                            meta.columns()
                                .iter()
                                .map(|col| col.name().to_string())
                                .collect(),
                        );
                    }
                    Ok(Some(QueryItem::Row(row))) => {
                        let values = row.into_iter().map(|data| column_value(&data)).collect();
                        collector.apply(BatchEvent::Row(Row::new(Arc::clone(&columns), values)));
                    }
                    Ok(None) => {
                        collector.apply(BatchEvent::Done);
                        break;
                    }
                    Err(e) => {
                        collector.apply(BatchEvent::Error(ErrorDescriptor::from_driver_error(&e)));
                        break;
                    }
                }
            }
        }
        Err(e) => collector.apply(BatchEvent::Error(ErrorDescriptor::from_driver_error(&e))),
    }

    let outcome = collector.into_result();
    match &outcome {
        QueryResult::Success(sets) => {
            tracing::debug!(result_sets = sets.len(), "batch completed");
        }
        QueryResult::Failure(error) => tracing::warn!(%error, "batch failed"),
    }
    outcome
}

/// Convert one column of a driver row into a [`SqlValue`].
pub(crate) fn column_value(data: &ColumnData<'static>) -> SqlValue {
    match data {
        ColumnData::U8(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(SqlValue::Null, SqlValue::Int),
        ColumnData::F32(v) => v.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(SqlValue::Null, SqlValue::Float),
        ColumnData::Bit(v) => v.map_or(SqlValue::Null, SqlValue::Bool),
        ColumnData::String(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map_or(SqlValue::Null, |g| {
            SqlValue::Text(g.to_string().to_uppercase())
        }),
        ColumnData::Binary(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |b| SqlValue::Binary(b.to_vec())),
        ColumnData::Numeric(v) => v.map_or(SqlValue::Null, numeric_value),
        ColumnData::Xml(v) => v.as_ref().map_or(SqlValue::Null, |xml| {
            SqlValue::Text(xml.clone().into_owned().into_string())
        }),
        _ => temporal_value(data),
    }
}

/// `Decimal` holds 96 bits and a scale of at most 28; wider numerics
/// (e.g. `numeric(38,30)`) are approximated as `f64`.
fn numeric_value(n: Numeric) -> SqlValue {
    Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale()))
        .map_or_else(|_| SqlValue::Float(f64::from(n)), SqlValue::Decimal)
}

fn temporal_value(data: &ColumnData<'static>) -> SqlValue {
    if let Ok(value) = NaiveDateTime::from_sql(data) {
        return value.map_or(SqlValue::Null, SqlValue::DateTime);
    }
    if let Ok(value) = NaiveDate::from_sql(data) {
        return value.map_or(SqlValue::Null, SqlValue::Date);
    }
    if let Ok(value) = NaiveTime::from_sql(data) {
        return value.map_or(SqlValue::Null, SqlValue::Time);
    }
    if let Ok(value) = DateTime::<FixedOffset>::from_sql(data) {
        return value.map_or(SqlValue::Null, SqlValue::DateTimeOffset);
    }
    tracing::debug!(?data, "unsupported column type read as NULL");
    SqlValue::Null
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use tiberius::IntoSql;

    use super::*;

    #[test]
    fn integers_widen_to_i64() {
        assert_eq!(column_value(&ColumnData::U8(Some(7))), SqlValue::Int(7));
        assert_eq!(column_value(&ColumnData::I16(Some(-3))), SqlValue::Int(-3));
        assert_eq!(column_value(&ColumnData::I32(None)), SqlValue::Null);
        assert_eq!(
            column_value(&ColumnData::I64(Some(9_007_199_254_740_993))),
            SqlValue::Int(9_007_199_254_740_993)
        );
    }

    #[test]
    fn floats_and_bits_convert() {
        assert_eq!(
            column_value(&ColumnData::F32(Some(1.5))),
            SqlValue::Float(1.5)
        );
        assert_eq!(
            column_value(&ColumnData::F64(Some(2.25))),
            SqlValue::Float(2.25)
        );
        assert_eq!(
            column_value(&ColumnData::Bit(Some(true))),
            SqlValue::Bool(true)
        );
    }

    #[test]
    fn text_and_binary_are_owned() {
        assert_eq!(
            column_value(&ColumnData::String(Some(Cow::Owned("Widget".into())))),
            SqlValue::Text("Widget".into())
        );
        assert_eq!(
            column_value(&ColumnData::Binary(Some(Cow::Owned(vec![1, 2, 3])))),
            SqlValue::Binary(vec![1, 2, 3])
        );
        assert_eq!(column_value(&ColumnData::String(None)), SqlValue::Null);
    }

    #[test]
    fn unique_identifiers_render_as_upper_case_hex() {
        let guid = tiberius::Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        assert_eq!(
            column_value(&ColumnData::Guid(Some(guid))),
            SqlValue::Text("6F9619FF-8B86-D011-B42D-00C04FC964FF".into())
        );
    }

    #[test]
    fn numerics_become_decimals() {
        assert_eq!(
            column_value(&ColumnData::Numeric(Some(Numeric::new_with_scale(12345, 2)))),
            SqlValue::Decimal(Decimal::new(12345, 2))
        );
        assert_eq!(
            column_value(&ColumnData::Numeric(Some(Numeric::new_with_scale(-987_654, 4)))),
            SqlValue::Decimal(Decimal::new(-987_654, 4))
        );
        assert_eq!(column_value(&ColumnData::Numeric(None)), SqlValue::Null);
    }

    #[test]
    fn numerics_wider_than_decimal_fall_back_to_float() {
        let tiny_scale = Numeric::new_with_scale(10_i128.pow(30), 30);
        assert_eq!(
            column_value(&ColumnData::Numeric(Some(tiny_scale))),
            SqlValue::Float(1.0)
        );

        let huge = Numeric::new_with_scale(-(10_i128.pow(30)), 0);
        match column_value(&ColumnData::Numeric(Some(huge))) {
            SqlValue::Float(f) => assert!((f + 1e30).abs() < 1e15, "got {f}"),
            other => panic!("expected a float, got {other:?}"),
        }
    }

    #[test]
    fn temporal_columns_map_to_chrono_values() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let stamp = day.and_hms_opt(13, 45, 30).unwrap();
        let offset = FixedOffset::east_opt(-5 * 3600).unwrap();
        let zoned = stamp.and_local_timezone(offset).single().unwrap();

        assert_eq!(column_value(&day.into_sql()), SqlValue::Date(day));
        assert_eq!(
            column_value(&stamp.time().into_sql()),
            SqlValue::Time(stamp.time())
        );
        assert_eq!(column_value(&stamp.into_sql()), SqlValue::DateTime(stamp));
        assert_eq!(
            column_value(&zoned.into_sql()),
            SqlValue::DateTimeOffset(zoned)
        );
        assert_eq!(
            column_value(&ColumnData::DateTimeOffset(None)),
            SqlValue::Null
        );
        assert_eq!(column_value(&ColumnData::Time(None)), SqlValue::Null);
    }

    #[test]
    fn legacy_datetime_columns_read_as_datetime() {
        let data = ColumnData::DateTime(Some(tiberius::time::DateTime::new(0, 300)));
        let expected = NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        assert_eq!(column_value(&data), SqlValue::DateTime(expected));
    }

    #[test]
    fn xml_reads_as_text() {
        let xml = tiberius::xml::XmlData::new("<a>1</a>");
        let data = ColumnData::Xml(Some(Cow::Owned(xml)));
        assert_eq!(column_value(&data), SqlValue::Text("<a>1</a>".into()));
        assert_eq!(column_value(&ColumnData::Xml(None)), SqlValue::Null);
    }

    #[test]
    fn two_statement_batch_yields_two_result_sets() {
        let params = [Param::new("UserName", crate::types::SqlType::nvarchar(), "alice")];
        let batch = PreparedBatch::new(
            "SELECT @UserName AS UserName;\nSELECT LEN(@UserName) AS NameLength;",
            &params,
        )
        .unwrap();
        assert!(batch.sql().starts_with("DECLARE @UserName nvarchar(max) = @P1; SELECT"));

        let first = Arc::new(vec!["UserName".to_string()]);
        let second = Arc::new(vec!["NameLength".to_string()]);
        let user = "alice".to_string().into_sql();
        let mut collector = BatchCollector::new();
        for event in [
            BatchEvent::Boundary,
            BatchEvent::Row(Row::new(first, vec![column_value(&user)])),
            BatchEvent::Boundary,
            BatchEvent::Row(Row::new(second, vec![column_value(&ColumnData::I32(Some(5)))])),
            BatchEvent::Done,
        ] {
            collector.apply(event);
        }

        let sets = collector.into_result().into_result().unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(
            sets[0][0].get("UserName"),
            Some(&SqlValue::Text("alice".into()))
        );
        assert_eq!(sets[1][0].get("NameLength"), Some(&SqlValue::Int(5)));
    }
}
