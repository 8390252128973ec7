//! A small async object-relational mapper over Postgres, MySQL and SQLite.
//!
//! Records are plain structs declared through [`model!`]; the crate derives each record's table
//! from its type name, compiles create/update/delete/find/where statements for the connected
//! dialect and materializes rows back into the caller's record or `Vec`.
//!
//! ```rust,no_run
//! use tiny_orm::prelude::*;
//!
//! tiny_orm::model! {
//!     #[derive(Debug, Clone, Default)]
//!     pub struct User {
//!         pub id: Uuid,
//!         pub name: String,
//!         pub age: i64,
//!     }
//! }
//!
//! # async fn demo() -> Result<(), OrmError> {
//! let registry = Registry::discover()?;
//! let db = registry.connect("development").await?;
//!
//! let mut user = User { name: "ada".into(), age: 36, ..User::default() };
//! db.create(&mut user).await?;
//!
//! let mut adults: Vec<User> = Vec::new();
//! db.find_where(&mut adults, "age >= ?", 0, &[SqlValue::Int(18)]).await?;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod handler;
pub mod introspect;
pub mod logging;
pub mod model;
pub mod naming;
pub mod prelude;
pub mod raw;
pub mod registry;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use compiler::{CompiledQuery, Operation, compile};
pub use config::{Config, DialectConfig};
pub use error::{ErrorKind, OrmError};
pub use handler::DialectHandler;
pub use model::{
    ColumnDef, Field, FieldValue, JsonList, JsonMap, Model, PRIMARY_KEY, Record, Schema, Shape,
    Target,
};
pub use raw::RawQuery;
pub use registry::{MultiTenant, Registry};
pub use results::{CustomDbRow, ResultSet};
pub use types::{Dialect, JsonShape, SqlValue, ValueKind};
