//! Coercion of TDS column values into [`Value`].
//!
//! Numbers become their decimal text, bit becomes `Bool`, dates and times
//! become ISO-8601 text, binary is decoded as lossy UTF-8.

use super::Value;
use tiberius::{ColumnData, FromSql};

pub(crate) fn coerce(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(|n| n.to_string()).into(),
        ColumnData::I16(v) => v.map(|n| n.to_string()).into(),
        ColumnData::I32(v) => v.map(|n| n.to_string()).into(),
        ColumnData::I64(v) => v.map(|n| n.to_string()).into(),
        ColumnData::F32(v) => v.map(|n| n.to_string()).into(),
        ColumnData::F64(v) => v.map(|n| n.to_string()).into(),
        ColumnData::Bit(v) => v.map_or(Value::Null, Value::Bool),
        ColumnData::String(v) => v.map(|s| s.into_owned()).into(),
        ColumnData::Guid(v) => v.map(|g| g.to_string()).into(),
        ColumnData::Binary(v) => v
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .into(),
        ColumnData::Numeric(v) => v.map(|n| n.to_string()).into(),
        ColumnData::Xml(v) => v.map(|x| x.into_owned().into_string()).into(),
        other @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => render::<chrono::NaiveDateTime>(&other, |d| {
            d.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
        }),
        other @ ColumnData::Date(_) => {
            render::<chrono::NaiveDate>(&other, |d| d.format("%Y-%m-%d").to_string())
        }
        other @ ColumnData::Time(_) => {
            render::<chrono::NaiveTime>(&other, |t| t.format("%H:%M:%S%.3f").to_string())
        }
        other @ ColumnData::DateTimeOffset(_) => {
            render::<chrono::DateTime<chrono::FixedOffset>>(&other, |d| d.to_rfc3339())
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

fn render<'a, T>(data: &'a ColumnData<'static>, format: impl Fn(T) -> String) -> Value
where
    T: FromSql<'a>,
{
    match T::from_sql(data) {
        Ok(Some(v)) => Value::Text(format(v)),
        Ok(None) => Value::Null,
        Err(e) => {
            tracing::warn!("Unsupported temporal value: {}", e);
            Value::Null
        }
    }
}
