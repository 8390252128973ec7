//! SQL generation for the write operations and the metadata reads build on.
//!
//! The compiler is pure: it turns introspected record data into SQL text plus positional
//! arguments and never touches a connection.
//! ```rust
//! use tiny_orm::prelude::*;
//! use tiny_orm::compiler::{Operation, compile};
//! use tiny_orm::introspect::ModelData;
//!
//! tiny_orm::model! {
//!     #[derive(Debug, Default)]
//!     pub struct User {
//!         pub id: Uuid,
//!         pub name: String,
//!     }
//! }
//!
//! let user = User { id: Uuid::new_v4(), name: "carl".into() };
//! let data = ModelData::from_record(&user).unwrap();
//! let query = compile(Operation::Delete, data, Dialect::Postgres).unwrap();
//! assert_eq!(query.sql, "DELETE FROM users WHERE id = $1");
//! assert_eq!(query.args, vec![SqlValue::Uuid(user.id)]);
//! ```

pub mod select;

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::OrmError;
use crate::introspect::ModelData;
use crate::model::{PRIMARY_KEY, Shape};
use crate::types::{Dialect, SqlValue};

pub use select::{Filter, coalesced_columns, select_sql};

/// The operation kinds the compiler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Find,
    Where,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Find => "find",
            Operation::Where => "where",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" | "insert" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "find" => Ok(Operation::Find),
            "where" => Ok(Operation::Where),
            other => Err(OrmError::InvalidOperation(format!(
                "no query builder matches operation {other:?}"
            ))),
        }
    }
}

/// SQL text, its bound arguments and the metadata the executor needs afterwards.
///
/// Built fresh for every call and consumed by one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Empty for reads, and for a delete with nothing to match on
    pub sql: String,
    pub args: Vec<SqlValue>,
    pub table: String,
    pub attributes: Vec<String>,
    pub primary_key: Option<SqlValue>,
    /// Set when `Create` had to mint the primary key
    pub generated_id: Option<Uuid>,
}

impl CompiledQuery {
    /// True when there is no statement to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Compile `operation` over `data` for `dialect`.
///
/// # Errors
/// Returns `OrmError::PreconditionFailed` for an update without a primary key or without any
/// column to set, and `OrmError::InvalidArgument` when a write is handed a collection.
pub fn compile(
    operation: Operation,
    data: ModelData,
    dialect: Dialect,
) -> Result<CompiledQuery, OrmError> {
    let is_write = matches!(
        operation,
        Operation::Create | Operation::Update | Operation::Delete
    );
    if is_write && data.shape == Shape::Collection {
        return Err(OrmError::InvalidArgument(format!(
            "{operation} expects a single {} record, not a collection",
            data.schema.type_name
        )));
    }

    match operation {
        Operation::Create => Ok(compile_create(data, dialect)),
        Operation::Update => compile_update(data, dialect),
        Operation::Delete => Ok(compile_delete(data, dialect)),
        Operation::Find | Operation::Where => Ok(metadata_only(data)),
    }
}

/// Unconditional delete of every row in `table`.
#[must_use]
pub fn compile_bulk_delete(table: &str) -> CompiledQuery {
    CompiledQuery {
        sql: format!("DELETE FROM {table}"),
        args: Vec::new(),
        table: table.to_string(),
        attributes: Vec::new(),
        primary_key: None,
        generated_id: None,
    }
}

fn placeholders(dialect: Dialect, count: usize) -> String {
    (1..=count)
        .map(|n| dialect.placeholder(n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn compile_create(mut data: ModelData, dialect: Dialect) -> CompiledQuery {
    let mut generated_id = None;
    if data.primary_key.is_none() {
        let id = Uuid::new_v4();
        data.attributes.push(PRIMARY_KEY.to_string());
        data.args.push(SqlValue::Uuid(id));
        data.primary_key = Some(SqlValue::Uuid(id));
        generated_id = Some(id);
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        data.schema.table,
        data.attributes.join(", "),
        placeholders(dialect, data.attributes.len())
    );

    CompiledQuery {
        sql,
        args: data.args,
        table: data.schema.table,
        attributes: data.attributes,
        primary_key: data.primary_key,
        generated_id,
    }
}

fn compile_update(data: ModelData, dialect: Dialect) -> Result<CompiledQuery, OrmError> {
    let Some(primary_key) = data.primary_key else {
        return Err(OrmError::PreconditionFailed(format!(
            "no id was passed; an id must be present to update {}",
            data.schema.table
        )));
    };

    let mut assignments = Vec::with_capacity(data.attributes.len());
    let mut args = Vec::with_capacity(data.args.len());
    for (column, value) in data.attributes.iter().zip(data.args) {
        if column == PRIMARY_KEY {
            continue;
        }
        args.push(value);
        assignments.push(format!("{column} = {}", dialect.placeholder(args.len())));
    }

    if assignments.is_empty() {
        return Err(OrmError::PreconditionFailed(format!(
            "nothing to update on {}: only the id is set",
            data.schema.table
        )));
    }

    args.push(primary_key.clone());
    let sql = format!(
        "UPDATE {} SET {} WHERE {PRIMARY_KEY} = {}",
        data.schema.table,
        assignments.join(", "),
        dialect.placeholder(args.len())
    );

    Ok(CompiledQuery {
        sql,
        args,
        table: data.schema.table,
        attributes: data.attributes,
        primary_key: Some(primary_key),
        generated_id: None,
    })
}

fn compile_delete(data: ModelData, dialect: Dialect) -> CompiledQuery {
    let (sql, args) = if let Some(primary_key) = &data.primary_key {
        (
            format!(
                "DELETE FROM {} WHERE {PRIMARY_KEY} = {}",
                data.schema.table,
                dialect.placeholder(1)
            ),
            vec![primary_key.clone()],
        )
    } else if data.attributes.is_empty() {
        (String::new(), Vec::new())
    } else {
        let predicate = data
            .attributes
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = {}", dialect.placeholder(i + 1)))
            .collect::<Vec<_>>()
            .join(" AND ");
        (
            format!("DELETE FROM {} WHERE {predicate}", data.schema.table),
            data.args,
        )
    };

    CompiledQuery {
        sql,
        args,
        table: data.schema.table,
        attributes: data.attributes,
        primary_key: data.primary_key,
        generated_id: None,
    }
}

fn metadata_only(data: ModelData) -> CompiledQuery {
    CompiledQuery {
        sql: String::new(),
        args: data.args,
        table: data.schema.table,
        attributes: data.attributes,
        primary_key: data.primary_key,
        generated_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::model! {
        #[derive(Debug, Default)]
        struct Person {
            id: Uuid,
            name: String,
            #[column = "years"]
            age: i64,
        }
    }

    fn data(person: &Person) -> ModelData {
        ModelData::from_record(person).unwrap()
    }

    #[test]
    fn operation_names_parse() {
        assert_eq!("create".parse::<Operation>().unwrap(), Operation::Create);
        assert_eq!("WHERE".parse::<Operation>().unwrap(), Operation::Where);
        let err = "upsert".parse::<Operation>().unwrap_err();
        assert!(matches!(err, OrmError::InvalidOperation(_)));
    }

    #[test]
    fn create_generates_missing_id() {
        let person = Person {
            name: "ann".into(),
            age: 30,
            ..Person::default()
        };
        let q = compile(Operation::Create, data(&person), Dialect::Postgres).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO persons (name, years, id) VALUES ($1, $2, $3)"
        );
        let id = q.generated_id.unwrap();
        assert!(!id.is_nil());
        assert_eq!(q.args[2], SqlValue::Uuid(id));
        assert_eq!(q.primary_key, Some(SqlValue::Uuid(id)));
    }

    #[test]
    fn create_keeps_supplied_id() {
        let id = Uuid::new_v4();
        let person = Person {
            id,
            name: "bo".into(),
            ..Person::default()
        };
        let q = compile(Operation::Create, data(&person), Dialect::Sqlite).unwrap();
        assert_eq!(q.sql, "INSERT INTO persons (id, name) VALUES (?, ?)");
        assert_eq!(q.args[0], SqlValue::Uuid(id));
        assert!(q.generated_id.is_none());
    }

    #[test]
    fn update_binds_values_and_key_last() {
        let id = Uuid::new_v4();
        let person = Person {
            id,
            name: "cy".into(),
            age: 41,
        };
        let q = compile(Operation::Update, data(&person), Dialect::Postgres).unwrap();
        assert_eq!(q.sql, "UPDATE persons SET name = $1, years = $2 WHERE id = $3");
        assert_eq!(
            q.args,
            vec![
                SqlValue::Text("cy".into()),
                SqlValue::Int(41),
                SqlValue::Uuid(id)
            ]
        );

        let q = compile(Operation::Update, data(&person), Dialect::Mysql).unwrap();
        assert_eq!(q.sql, "UPDATE persons SET name = ?, years = ? WHERE id = ?");
    }

    #[test]
    fn update_requires_a_key() {
        let person = Person {
            name: "dee".into(),
            ..Person::default()
        };
        let err = compile(Operation::Update, data(&person), Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, OrmError::PreconditionFailed(_)));

        let only_id = Person {
            id: Uuid::new_v4(),
            ..Person::default()
        };
        let err = compile(Operation::Update, data(&only_id), Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, OrmError::PreconditionFailed(_)));
    }

    #[test]
    fn delete_by_key_ignores_other_fields() {
        let id = Uuid::new_v4();
        let person = Person {
            id,
            name: "eve".into(),
            age: 3,
        };
        let q = compile(Operation::Delete, data(&person), Dialect::Mysql).unwrap();
        assert_eq!(q.sql, "DELETE FROM persons WHERE id = ?");
        assert_eq!(q.args, vec![SqlValue::Uuid(id)]);
    }

    #[test]
    fn delete_by_example_ands_attributes() {
        let person = Person {
            name: "fay".into(),
            age: 9,
            ..Person::default()
        };
        let q = compile(Operation::Delete, data(&person), Dialect::Postgres).unwrap();
        assert_eq!(q.sql, "DELETE FROM persons WHERE name = $1 AND years = $2");
        assert_eq!(q.args.len(), 2);
    }

    #[test]
    fn delete_with_nothing_set_is_empty() {
        let q = compile(Operation::Delete, data(&Person::default()), Dialect::Sqlite).unwrap();
        assert!(q.is_empty());
        assert!(q.args.is_empty());
    }

    #[test]
    fn reads_return_metadata_only() {
        let q = compile(Operation::Find, data(&Person::default()), Dialect::Postgres).unwrap();
        assert!(q.is_empty());
        assert_eq!(q.table, "persons");
    }

    #[test]
    fn writes_reject_collections() {
        let people: Vec<Person> = Vec::new();
        let data = ModelData::from_target(&people).unwrap();
        let err = compile(Operation::Create, data, Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, OrmError::InvalidArgument(_)));
    }

    #[test]
    fn bulk_delete_is_unconditional() {
        assert_eq!(compile_bulk_delete("persons").sql, "DELETE FROM persons");
    }
}
