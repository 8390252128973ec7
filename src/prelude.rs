//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::compiler::{CompiledQuery, Operation, compile};
pub use crate::config::{Config, DialectConfig};
pub use crate::error::{ErrorKind, OrmError};
pub use crate::handler::DialectHandler;
pub use crate::model::{
    FieldValue, JsonList, JsonMap, Model, PRIMARY_KEY, Record, Schema, Shape, Target,
};
pub use crate::raw::RawQuery;
pub use crate::registry::{MultiTenant, Registry};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::translation::translate_placeholders;
pub use crate::types::{Dialect, SqlValue};

pub use chrono::NaiveDateTime;
pub use uuid::Uuid;

#[cfg(feature = "mysql")]
pub use crate::mysql::MysqlHandler;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresHandler;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteHandler;
