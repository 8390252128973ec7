use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::OrmError;

/// Values bound as statement arguments or read back from a result row.
///
/// One enum serves every backend so the compiler and the materializer never branch on
/// driver types:
/// ```rust
/// use tiny_orm::prelude::*;
///
/// let args = vec![
///     SqlValue::Text("alice".into()),
///     SqlValue::Int(42),
///     SqlValue::Bool(true),
/// ];
/// # let _ = args;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Text/string value
    Text(String),
    /// Integer value (64-bit)
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// Floating point value (64-bit)
    Float(f64),
    /// Binary data
    Bytes(Vec<u8>),
    /// 128-bit unique identifier
    Uuid(Uuid),
    /// JSON document
    Json(JsonValue),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
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

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let SqlValue::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// UUID view of the value; hyphenated text and 16 raw bytes are accepted too.
    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            SqlValue::Uuid(id) => Some(*id),
            SqlValue::Text(s) => Uuid::parse_str(s).ok(),
            SqlValue::Bytes(b) if b.len() == 16 => Uuid::from_slice(b).ok(),
            SqlValue::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| Uuid::parse_str(s).ok()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(value) => Some(*value),
            SqlValue::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in conversion errors.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            SqlValue::Text(_) => "text",
            SqlValue::Int(_) => "int",
            SqlValue::Bool(_) => "bool",
            SqlValue::Float(_) => "float",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Json(_) => "json",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Null => "null",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Text(value) => f.write_str(value),
            SqlValue::Int(value) => write!(f, "{value}"),
            SqlValue::Bool(value) => write!(f, "{value}"),
            SqlValue::Float(value) => write!(f, "{value}"),
            SqlValue::Bytes(value) => write!(f, "<{} bytes>", value.len()),
            SqlValue::Uuid(value) => write!(f, "{value}"),
            SqlValue::Json(value) => write!(f, "{value}"),
            SqlValue::Timestamp(value) => write!(f, "{value}"),
            SqlValue::Null => f.write_str("NULL"),
        }
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    // Try "YYYY-MM-DD HH:MM:SS"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    // Try "YYYY-MM-DD HH:MM:SS.SSS"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(value: JsonValue) -> Self {
        SqlValue::Json(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Shape of a JSON column, which decides its coalescing default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

/// Semantic type tag carried by every column description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Int,
    Float,
    Bool,
    Bytes,
    Uuid,
    Json(JsonShape),
    Timestamp,
}

/// The relational backends this crate can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `PostgreSQL`, numbered `$n` placeholders
    #[serde(alias = "psql", alias = "postgresql")]
    Postgres,
    /// `MySQL`, positional `?` placeholders
    Mysql,
    /// `SQLite`, positional `?` placeholders
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl Dialect {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Whether placeholders carry their position (`$1`) rather than being bare `?`.
    #[must_use]
    pub fn numbered_placeholders(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Placeholder text for the 1-based argument position `n`.
    #[must_use]
    pub fn placeholder(self, n: usize) -> String {
        if self.numbered_placeholders() {
            format!("${n}")
        } else {
            "?".to_string()
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "psql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(OrmError::ConfigurationError(format!(
                "unknown dialect: {other}"
            ))),
        }
    }
}
