use rusqlite::types::Value;

use crate::types::SqlValue;

const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Convert a single `SqlValue` to a rusqlite `Value`.
///
/// SQLite has no uuid, json, timestamp or boolean storage class: those bind as text and integer.
#[must_use]
pub fn sql_value_to_sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        SqlValue::Uuid(id) => Value::Text(id.hyphenated().to_string()),
        SqlValue::Json(j) => Value::Text(j.to_string()),
        SqlValue::Bytes(bytes) => Value::Blob(bytes.clone()),
        SqlValue::Null => Value::Null,
    }
}

/// Owned `SQLite` parameters, movable into a blocking task.
#[derive(Debug, Clone)]
pub struct Params(pub Vec<Value>);

impl Params {
    #[must_use]
    pub fn convert(params: &[SqlValue]) -> Self {
        Params(params.iter().map(sql_value_to_sqlite_value).collect())
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}
