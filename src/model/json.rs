use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::OrmError;
use crate::types::{JsonShape, SqlValue, ValueKind};

use super::field_value::{FieldValue, json_from_sql_value};

/// A JSON object column (`jsonb` on Postgres, JSON text elsewhere).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonMap(pub Map<String, JsonValue>);

impl JsonMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn delete(&mut self, key: &str) -> Option<JsonValue> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn values(&self) -> &Map<String, JsonValue> {
        &self.0
    }
}

impl FieldValue for JsonMap {
    const KIND: ValueKind = ValueKind::Json(JsonShape::Object);

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Json(JsonValue::Object(self.0.clone()))
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match json_from_sql_value(value)? {
            JsonValue::Object(map) => Ok(JsonMap(map)),
            JsonValue::Null => Ok(JsonMap::default()),
            other => Err(OrmError::ExecutionError(format!(
                "expected a json object, got {other}"
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

/// A JSON array column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonList(pub Vec<JsonValue>);

impl JsonList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        self.0.extend(values.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn values(&self) -> &[JsonValue] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FieldValue for JsonList {
    const KIND: ValueKind = ValueKind::Json(JsonShape::Array);

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Json(JsonValue::Array(self.0.clone()))
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, OrmError> {
        match json_from_sql_value(value)? {
            JsonValue::Array(items) => Ok(JsonList(items)),
            JsonValue::Null => Ok(JsonList::default()),
            other => Err(OrmError::ExecutionError(format!(
                "expected a json array, got {other}"
            ))),
        }
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_helpers() {
        let mut map = JsonMap::new();
        map.add("theme", "dark");
        map.add("volume", 7);
        assert_eq!(map.get("volume"), Some(&json!(7)));
        assert_eq!(map.delete("theme"), Some(json!("dark")));
        assert_eq!(map.values().len(), 1);
    }

    #[test]
    fn list_scans_from_text() {
        let list = JsonList::from_sql_value(SqlValue::Text("[1,\"two\"]".into())).unwrap();
        assert_eq!(list.len(), 2);
        assert!(JsonList::from_sql_value(SqlValue::Text("{}".into())).is_err());

        let mut appended = JsonList::new();
        appended.append([1, 2, 3]);
        assert_eq!(appended.values(), &[json!(1), json!(2), json!(3)]);
    }
}
