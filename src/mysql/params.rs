use chrono::{Datelike, NaiveDateTime, Timelike};
use mysql_async::Value;

use crate::types::SqlValue;

/// Convert a single `SqlValue` to a mysql_async `Value`.
#[must_use]
pub fn sql_value_to_mysql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(b) => Value::from(*b),
        SqlValue::Int(i) => Value::Int(*i),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Text(s) => Value::from(s.as_str()),
        SqlValue::Bytes(b) => Value::Bytes(b.clone()),
        SqlValue::Uuid(u) => Value::from(u.hyphenated().to_string()),
        SqlValue::Json(j) => Value::from(j.to_string()),
        SqlValue::Timestamp(dt) => datetime_value(dt),
    }
}

fn datetime_value(dt: &NaiveDateTime) -> Value {
    match u16::try_from(dt.year()) {
        Ok(year) => Value::Date(
            year,
            u8::try_from(dt.month()).unwrap_or_default(),
            u8::try_from(dt.day()).unwrap_or_default(),
            u8::try_from(dt.hour()).unwrap_or_default(),
            u8::try_from(dt.minute()).unwrap_or_default(),
            u8::try_from(dt.second()).unwrap_or_default(),
            dt.nanosecond() / 1_000,
        ),
        Err(_) => Value::from(dt.format("%F %T%.f").to_string()),
    }
}

/// Positional mysql_async parameters.
#[derive(Debug, Clone)]
pub struct Params(pub Vec<Value>);

impl Params {
    #[must_use]
    pub fn convert(params: &[SqlValue]) -> Self {
        Params(params.iter().map(sql_value_to_mysql).collect())
    }

    #[must_use]
    pub fn into_params(self) -> mysql_async::Params {
        if self.0.is_empty() {
            mysql_async::Params::Empty
        } else {
            mysql_async::Params::Positional(self.0)
        }
    }
}
