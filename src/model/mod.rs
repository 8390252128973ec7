//! Record descriptions.
//!
//! A record type describes itself through [`Model::fields`]: an ordered list of columns, each
//! with a type tag, an accessor and a setter. The compiler and the row materializer work only
//! against that description. The [`model!`](crate::model!) macro writes it for an ordinary
//! struct:
//! ```rust
//! use tiny_orm::prelude::*;
//!
//! tiny_orm::model! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct User {
//!         pub id: Uuid,
//!         pub name: String,
//!         #[column = "years"]
//!         pub age: i64,
//!     }
//! }
//!
//! let schema = Schema::of::<User>().unwrap();
//! assert_eq!(schema.table, "users");
//! assert_eq!(schema.column_names(), vec!["id", "name", "years"]);
//! ```

mod field_value;
mod json;

use std::borrow::Cow;

pub use field_value::FieldValue;
pub use json::{JsonList, JsonMap};

use crate::error::OrmError;
use crate::naming;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::{SqlValue, ValueKind};

/// Column name that identifies the primary key.
pub const PRIMARY_KEY: &str = "id";

/// One field of a record type.
pub struct Field<M> {
    /// Rust field name
    pub name: &'static str,
    /// Explicit column name; the snake-cased field name when absent
    pub column: Option<&'static str>,
    pub kind: ValueKind,
    /// Nullable fields are read without coalescing
    pub nullable: bool,
    pub get: fn(&M) -> SqlValue,
    pub is_zero: fn(&M) -> bool,
    pub set: fn(&mut M, SqlValue) -> Result<(), OrmError>,
}

impl<M> Field<M> {
    /// Resolved SQL column name.
    ///
    /// # Errors
    /// Returns `OrmError::InvalidArgument` if the field name cannot be snake-cased.
    pub fn column_name(&self) -> Result<Cow<'static, str>, OrmError> {
        match self.column {
            Some(column) => Ok(Cow::Borrowed(column)),
            None => naming::lower_snake_case(self.name).map(Cow::Owned),
        }
    }
}

/// A record type that maps to one table.
pub trait Model: Default + Send + Sync + 'static {
    /// Type identifier the table name is derived from.
    const NAME: &'static str;

    fn fields() -> &'static [Field<Self>];

    /// # Errors
    /// Returns `OrmError::InvalidArgument` if `NAME` cannot be converted.
    fn table_name() -> Result<String, OrmError> {
        naming::table_name(Self::NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ColumnDef {
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.name == PRIMARY_KEY
    }
}

/// Type-erased description of a record type: its table and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub type_name: &'static str,
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    /// # Errors
    /// Returns `OrmError::InvalidArgument` if a type or field name cannot be converted.
    pub fn of<M: Model>() -> Result<Self, OrmError> {
        let columns = M::fields()
            .iter()
            .map(|field| {
                Ok(ColumnDef {
                    name: field.column_name()?.into_owned(),
                    kind: field.kind,
                    nullable: field.nullable,
                })
            })
            .collect::<Result<Vec<_>, OrmError>>()?;

        Ok(Schema {
            type_name: M::NAME,
            table: M::table_name()?,
            columns,
        })
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(ColumnDef::is_primary_key)
    }
}

/// Object-safe view of a single record.
pub trait Record: Send + Sync {
    /// # Errors
    /// Returns `OrmError::InvalidArgument` if the type cannot be described.
    fn schema(&self) -> Result<Schema, OrmError>;

    /// Current value of every column that is set (non-zero), `None` for the rest, in column order.
    fn attribute_values(&self) -> Vec<Option<SqlValue>>;

    /// Write `value` into the field backing `column`.
    ///
    /// # Errors
    /// Returns `OrmError::InvalidArgument` for an unknown column, or the conversion error.
    fn assign(&mut self, column: &str, value: SqlValue) -> Result<(), OrmError>;
}

impl<M: Model> Record for M {
    fn schema(&self) -> Result<Schema, OrmError> {
        Schema::of::<M>()
    }

    fn attribute_values(&self) -> Vec<Option<SqlValue>> {
        M::fields()
            .iter()
            .map(|field| (!(field.is_zero)(self)).then(|| (field.get)(self)))
            .collect()
    }

    fn assign(&mut self, column: &str, value: SqlValue) -> Result<(), OrmError> {
        for field in M::fields() {
            if field.column_name()? == column {
                return (field.set)(self, value);
            }
        }
        Err(OrmError::InvalidArgument(format!(
            "{} has no column named {column}",
            M::NAME
        )))
    }
}

/// Whether a read target holds one record or a collection of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    Collection,
}

/// Something a read can write results into: a single record or a `Vec` of records.
///
/// `Vec<M>` implements this for every [`Model`]; the [`model!`](crate::model!) macro (or
/// [`impl_target!`](crate::impl_target!)) implements it for the record type itself.
pub trait Target: Send + Sync {
    /// # Errors
    /// Returns `OrmError::InvalidArgument` if the element type cannot be described.
    fn schema(&self) -> Result<Schema, OrmError>;

    fn shape(&self) -> Shape;

    /// The record itself when the target is singular.
    fn as_record(&self) -> Option<&dyn Record>;

    /// Replace the target's contents with the materialized rows.
    ///
    /// # Errors
    /// Returns `OrmError::NotFound` when a singular target gets no rows, or a conversion error.
    /// The target is left untouched on error.
    fn fill(&mut self, rows: &ResultSet) -> Result<(), OrmError>;
}

impl<M: Model> Target for Vec<M> {
    fn schema(&self) -> Result<Schema, OrmError> {
        Schema::of::<M>()
    }

    fn shape(&self) -> Shape {
        Shape::Collection
    }

    fn as_record(&self) -> Option<&dyn Record> {
        None
    }

    fn fill(&mut self, rows: &ResultSet) -> Result<(), OrmError> {
        let schema = Schema::of::<M>()?;
        let mut fresh = Vec::with_capacity(rows.results.len());
        for row in &rows.results {
            fresh.push(materialize::<M>(&schema, row)?);
        }
        *self = fresh;
        Ok(())
    }
}

/// Fill a singular record from the first row of `rows`.
///
/// # Errors
/// Returns `OrmError::NotFound` when `rows` is empty, or the conversion error.
pub fn fill_single<M: Model>(record: &mut M, rows: &ResultSet) -> Result<(), OrmError> {
    let schema = Schema::of::<M>()?;
    let row = rows
        .results
        .first()
        .ok_or_else(|| OrmError::NotFound(format!("no rows found for {}", schema.table)))?;
    *record = materialize::<M>(&schema, row)?;
    Ok(())
}

/// Build a record from one row.
///
/// Columns are matched by name. Only when no column name matches at all and the row carries
/// exactly one value per field are values taken by position. Unmatched fields keep their default.
///
/// # Errors
/// Returns the setter's conversion error.
pub fn materialize<M: Model>(schema: &Schema, row: &CustomDbRow) -> Result<M, OrmError> {
    let mut record = M::default();
    let positional = row.values.len() == schema.columns.len()
        && schema.columns.iter().all(|column| row.get(&column.name).is_none());

    for (idx, (field, column)) in M::fields().iter().zip(&schema.columns).enumerate() {
        let value = row
            .get(&column.name)
            .or_else(|| positional.then(|| row.get_by_index(idx)).flatten());
        if let Some(value) = value {
            (field.set)(&mut record, value.clone()).map_err(|e| {
                OrmError::ExecutionError(format!(
                    "scanning column {} of {}: {e}",
                    column.name, schema.table
                ))
            })?;
        }
    }

    Ok(record)
}

/// Declare a struct together with its [`Model`] and singular [`Target`] impls.
///
/// Fields may carry `#[column = "name"]` to override the derived column name. The struct must
/// implement `Default`.
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[column = $column:literal])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $field : $ty, )*
        }

        impl $crate::Model for $name {
            const NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::Field<Self>] {
                const FIELDS: &[$crate::Field<$name>] = &[
                    $(
                        $crate::Field {
                            name: stringify!($field),
                            column: $crate::__column_override!($($column)?),
                            kind: <$ty as $crate::FieldValue>::KIND,
                            nullable: <$ty as $crate::FieldValue>::NULLABLE,
                            get: |m: &$name| $crate::FieldValue::to_sql_value(&m.$field),
                            is_zero: |m: &$name| $crate::FieldValue::is_zero(&m.$field),
                            set: |m: &mut $name, v: $crate::SqlValue| {
                                m.$field = <$ty as $crate::FieldValue>::from_sql_value(v)?;
                                ::core::result::Result::Ok(())
                            },
                        },
                    )*
                ];
                FIELDS
            }
        }

        $crate::impl_target!($name);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __column_override {
    () => {
        ::core::option::Option::None
    };
    ($column:literal) => {
        ::core::option::Option::Some($column)
    };
}

/// Implement the singular [`Target`] for a [`Model`] written by hand.
#[macro_export]
macro_rules! impl_target {
    ($ty:ty) => {
        impl $crate::Target for $ty {
            fn schema(&self) -> ::core::result::Result<$crate::Schema, $crate::OrmError> {
                $crate::Schema::of::<$ty>()
            }

            fn shape(&self) -> $crate::Shape {
                $crate::Shape::Single
            }

            fn as_record(&self) -> ::core::option::Option<&dyn $crate::Record> {
                ::core::option::Option::Some(self)
            }

            fn fill(
                &mut self,
                rows: &$crate::ResultSet,
            ) -> ::core::result::Result<(), $crate::OrmError> {
                $crate::model::fill_single(self, rows)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::types::JsonShape;

    crate::model! {
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct BlogPost {
            pub id: Uuid,
            pub title: String,
            #[column = "view_count"]
            pub views: i64,
            pub tags: JsonList,
            pub subtitle: Option<String>,
        }
    }

    fn result_set(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> ResultSet {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(columns.iter().map(ToString::to_string).collect()));
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    #[test]
    fn schema_describes_columns_in_order() {
        let schema = Schema::of::<BlogPost>().unwrap();
        assert_eq!(schema.type_name, "BlogPost");
        assert_eq!(schema.table, "blog_posts");
        assert_eq!(
            schema.column_names(),
            vec!["id", "title", "view_count", "tags", "subtitle"]
        );
        assert_eq!(schema.primary_key_index(), Some(0));
        assert_eq!(schema.columns[3].kind, ValueKind::Json(JsonShape::Array));
        assert!(schema.columns[4].nullable);
        assert!(!schema.columns[1].nullable);
    }

    #[test]
    fn attribute_values_skip_zero_fields() {
        let post = BlogPost {
            title: "hello".into(),
            ..BlogPost::default()
        };
        let values = post.attribute_values();
        assert_eq!(values[0], None);
        assert_eq!(values[1], Some(SqlValue::Text("hello".into())));
        assert_eq!(values[2], None);
        assert_eq!(values[4], None);
    }

    #[test]
    fn assign_by_column_name() {
        let mut post = BlogPost::default();
        post.assign("view_count", SqlValue::Int(12)).unwrap();
        assert_eq!(post.views, 12);
        let err = post.assign("views", SqlValue::Int(1)).unwrap_err();
        assert!(matches!(err, OrmError::InvalidArgument(_)));
    }

    #[test]
    fn collection_fill_replaces_contents() {
        let id = Uuid::new_v4();
        let rs = result_set(
            &["id", "title", "view_count", "tags", "subtitle"],
            vec![vec![
                SqlValue::Text(id.to_string()),
                SqlValue::Text("first".into()),
                SqlValue::Int(3),
                SqlValue::Text("[\"a\"]".into()),
                SqlValue::Null,
            ]],
        );
        let mut posts = vec![BlogPost::default(), BlogPost::default()];
        posts.fill(&rs).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, id);
        assert_eq!(posts[0].views, 3);
        assert_eq!(posts[0].tags.len(), 1);
        assert_eq!(posts[0].subtitle, None);
    }

    #[test]
    fn single_fill_reports_not_found() {
        let rs = result_set(&["id"], vec![]);
        let mut post = BlogPost {
            title: "kept".into(),
            ..BlogPost::default()
        };
        let err = post.fill(&rs).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(post.title, "kept");
    }

    #[test]
    fn named_rows_never_borrow_a_neighbouring_column() {
        let columns = Arc::new(
            ["subtitle", "id", "title", "views", "tags"]
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        );
        let row = CustomDbRow::new(
            columns,
            vec![
                SqlValue::Text("sub".into()),
                SqlValue::Null,
                SqlValue::Int(1),
                SqlValue::Int(9),
                SqlValue::Text("[]".into()),
            ],
        );
        let schema = Schema::of::<BlogPost>().unwrap();
        let post: BlogPost = materialize(&schema, &row).unwrap();
        assert_eq!(post.title, "1");
        assert_eq!(post.views, 0);
        assert_eq!(post.subtitle.as_deref(), Some("sub"));
    }

    #[test]
    fn unnamed_rows_fill_by_position() {
        let columns = Arc::new((1..=5).map(|i| format!("col{i}")).collect::<Vec<_>>());
        let row = CustomDbRow::new(
            columns,
            vec![
                SqlValue::Null,
                SqlValue::Text("positional".into()),
                SqlValue::Int(4),
                SqlValue::Text("[1,2]".into()),
                SqlValue::Null,
            ],
        );
        let schema = Schema::of::<BlogPost>().unwrap();
        let post: BlogPost = materialize(&schema, &row).unwrap();
        assert_eq!(post.title, "positional");
        assert_eq!(post.views, 4);
        assert_eq!(post.tags.len(), 2);
    }

    #[test]
    fn partial_rows_keep_defaults() {
        let rs = result_set(&["title"], vec![vec![SqlValue::Text("only".into())]]);
        let mut post = BlogPost::default();
        post.fill(&rs).unwrap();
        assert_eq!(post.title, "only");
        assert_eq!(post.views, 0);
    }

    #[test]
    fn failed_scan_leaves_collection_untouched() {
        let rs = result_set(
            &["id", "title", "view_count", "tags", "subtitle"],
            vec![vec![
                SqlValue::Text("not-a-uuid".into()),
                SqlValue::Text("x".into()),
                SqlValue::Int(1),
                SqlValue::Text("[]".into()),
                SqlValue::Null,
            ]],
        );
        let mut posts = vec![BlogPost::default()];
        assert!(posts.fill(&rs).is_err());
        assert_eq!(posts.len(), 1);
    }
}
