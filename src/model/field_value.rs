use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::OrmError;
use crate::types::{JsonShape, SqlValue, ValueKind};

/// Conversion between a Rust field type and the bound/scanned [`SqlValue`].
///
/// `is_zero` drives the "skip unset fields" policy of the introspector: a field whose value is
/// the zero value of its type is left out of INSERT columns and delete/update predicates.
pub trait FieldValue: Sized {
    const KIND: ValueKind;
    const NULLABLE: bool = false;

    fn to_sql_value(&self) -> SqlValue;

    /// # Errors
    /// Returns `OrmError::ExecutionError` when the scanned value cannot become `Self`.
    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError>;

    fn is_zero(&self) -> bool;
}

fn mismatch(expected: &str, got: &SqlValue) -> OrmError {
    OrmError::ExecutionError(format!(
        "cannot scan {} value into {expected}",
        got.variant_name()
    ))
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            SqlValue::Null => Ok(String::new()),
            SqlValue::Bytes(b) => String::from_utf8(b)
                .map_err(|e| OrmError::ExecutionError(format!("text column is not utf-8: {e}"))),
            SqlValue::Uuid(id) => Ok(id.to_string()),
            SqlValue::Int(i) => Ok(i.to_string()),
            SqlValue::Float(f) => Ok(f.to_string()),
            SqlValue::Json(j) => Ok(j.to_string()),
            other => Err(mismatch("String", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl FieldValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match value {
            SqlValue::Int(i) => Ok(i),
            SqlValue::Bool(b) => Ok(i64::from(b)),
            SqlValue::Null => Ok(0),
            SqlValue::Text(ref s) => s.trim().parse().map_err(|_| mismatch("i64", &value)),
            other => Err(mismatch("i64", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }
}

macro_rules! narrow_int_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: ValueKind = ValueKind::Int;

                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::Int(i64::from(*self))
                }

                fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
                    let wide = i64::from_sql_value(value)?;
                    <$ty>::try_from(wide).map_err(|e| {
                        OrmError::ExecutionError(format!(
                            "value {wide} out of range for {}: {e}",
                            stringify!($ty)
                        ))
                    })
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

narrow_int_field!(i32, i16, i8, u32, u16, u8);

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match value {
            SqlValue::Null => Ok(0.0),
            SqlValue::Text(ref s) => s.trim().parse().map_err(|_| mismatch("f64", &value)),
            other => other.as_float().ok_or_else(|| mismatch("f64", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        f64::from_sql_value(value).map(|f| f as f32)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(i) => Ok(i != 0),
            SqlValue::Null => Ok(false),
            SqlValue::Text(ref s) => match s.trim() {
                "1" | "t" | "true" | "TRUE" => Ok(true),
                "0" | "f" | "false" | "FALSE" | "" => Ok(false),
                _ => Err(mismatch("bool", &value)),
            },
            other => Err(mismatch("bool", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl FieldValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bytes(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match value {
            SqlValue::Bytes(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            SqlValue::Null => Ok(Vec::new()),
            other => Err(mismatch("Vec<u8>", &other)),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl FieldValue for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Uuid(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        if value.is_null() {
            return Ok(Uuid::nil());
        }
        value.as_uuid().ok_or_else(|| mismatch("Uuid", &value))
    }

    fn is_zero(&self) -> bool {
        self.is_nil()
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Timestamp(*self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        if value.is_null() {
            return Ok(NaiveDateTime::default());
        }
        value
            .as_timestamp()
            .ok_or_else(|| mismatch("NaiveDateTime", &value))
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDateTime::default()
    }
}

/// Parse a scanned JSON column, which arrives natively on Postgres and as text elsewhere.
pub(crate) fn json_from_sql_value(value: SqlValue) -> Result<JsonValue, OrmError> {
    match value {
        SqlValue::Json(j) => Ok(j),
        SqlValue::Null => Ok(JsonValue::Null),
        SqlValue::Text(s) => serde_json::from_str(&s)
            .map_err(|e| OrmError::ExecutionError(format!("invalid json column: {e}"))),
        SqlValue::Bytes(b) => serde_json::from_slice(&b)
            .map_err(|e| OrmError::ExecutionError(format!("invalid json column: {e}"))),
        other => Err(mismatch("json", &other)),
    }
}

impl FieldValue for JsonValue {
    const KIND: ValueKind = ValueKind::Json(JsonShape::Object);

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        json_from_sql_value(value)
    }

    fn is_zero(&self) -> bool {
        match self {
            JsonValue::Null => true,
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_sql_value(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, FieldValue::to_sql_value)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }

    // `Some(0)` is set; only `None` is unset.
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_detected() {
        assert!(String::new().is_zero());
        assert!(!"x".to_string().is_zero());
        assert!(0_i64.is_zero());
        assert!(0_i32.is_zero());
        assert!(!false.to_sql_value().is_null());
        assert!(Uuid::nil().is_zero());
        assert!(!Uuid::new_v4().is_zero());
        assert!(None::<i64>.is_zero());
        assert!(!Some(0_i64).is_zero());
    }

    #[test]
    fn lenient_scanning() {
        assert!(bool::from_sql_value(SqlValue::Int(1)).unwrap());
        assert_eq!(i32::from_sql_value(SqlValue::Int(7)).unwrap(), 7);
        assert!(i8::from_sql_value(SqlValue::Int(1000)).is_err());
        assert_eq!(
            String::from_sql_value(SqlValue::Bytes(b"abc".to_vec())).unwrap(),
            "abc"
        );
        let json = JsonValue::from_sql_value(SqlValue::Text("{\"a\":1}".into())).unwrap();
        assert_eq!(json["a"], 1);
        assert_eq!(Option::<i64>::from_sql_value(SqlValue::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_sql_value(SqlValue::Int(0)).unwrap(),
            Some(0)
        );
    }
}
