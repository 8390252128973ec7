use std::sync::Arc;

use chrono::NaiveDate;
use mysql_async::{Row, Value};

use crate::results::ResultSet;
use crate::types::SqlValue;

/// Map a driver value into a `SqlValue`.
///
/// Text arrives as bytes; valid UTF-8 becomes `Text`. Dates become timestamps, times become
/// their `HH:MM:SS` text.
#[must_use]
pub fn mysql_extract_value(value: &Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => SqlValue::Text(text.to_string()),
            Err(_) => SqlValue::Bytes(bytes.clone()),
        },
        Value::Int(i) => SqlValue::Int(*i),
        Value::UInt(u) => match i64::try_from(*u) {
            Ok(i) => SqlValue::Int(i),
            Err(_) => SqlValue::Text(u.to_string()),
        },
        Value::Float(f) => SqlValue::Float(f64::from(*f)),
        Value::Double(d) => SqlValue::Float(*d),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(*hour),
                        u32::from(*minute),
                        u32::from(*second),
                        *micros,
                    )
                })
                .map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        Value::Time(negative, days, hours, minutes, seconds, _) => {
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            let sign = if *negative { "-" } else { "" };
            SqlValue::Text(format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}

/// Collect driver rows under `column_names`.
#[must_use]
pub fn build_result_set(column_names: Vec<String>, rows: &[Row]) -> ResultSet {
    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let values = (0..row.len())
            .map(|i| row.as_ref(i).map_or(SqlValue::Null, mysql_extract_value))
            .collect();
        result_set.add_row_values(values);
    }
    result_set
}
