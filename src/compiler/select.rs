//! SELECT text for find/where reads.

use crate::model::{PRIMARY_KEY, Schema};
use crate::translation::translate_placeholders;
use crate::types::{Dialect, JsonShape, ValueKind};

/// Nil UUID sentinel substituted for a NULL key.
pub const NIL_UUID: &str = "'00000000-0000-0000-0000-000000000000'";

/// Row selection for a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<'a> {
    /// Every row of the table
    All,
    /// `WHERE id = <placeholder>`
    PrimaryKey,
    /// Caller-supplied fragment with `?` placeholders
    Predicate(&'a str),
}

/// Zero value substituted for NULL in a column of `kind`.
#[must_use]
pub fn coalesce_default(kind: ValueKind, dialect: Dialect) -> &'static str {
    match kind {
        ValueKind::Text => "''",
        ValueKind::Int | ValueKind::Float => "0",
        ValueKind::Bool if dialect == Dialect::Sqlite => "0",
        ValueKind::Bool => "false",
        ValueKind::Bytes if dialect == Dialect::Sqlite => "X''",
        ValueKind::Bytes => "''",
        ValueKind::Json(JsonShape::Object) => "'{}'",
        ValueKind::Json(JsonShape::Array) => "'[]'",
        ValueKind::Timestamp => "'1970-01-01 00:00:00'",
        ValueKind::Uuid => NIL_UUID,
    }
}

/// Select list for `schema`: every non-nullable column wrapped as `COALESCE(col, zero) AS col`.
#[must_use]
pub fn coalesced_columns(schema: &Schema, dialect: Dialect) -> String {
    schema
        .columns
        .iter()
        .map(|column| {
            if column.nullable {
                column.name.clone()
            } else {
                format!(
                    "COALESCE({name}, {default}) AS {name}",
                    name = column.name,
                    default = coalesce_default(column.kind, dialect)
                )
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full SELECT for `schema` with the given filter and optional row limit.
///
/// Predicate placeholders are renumbered for `dialect`; the key filter binds one argument.
#[must_use]
pub fn select_sql(
    schema: &Schema,
    dialect: Dialect,
    filter: Filter<'_>,
    limit: Option<u64>,
) -> String {
    let mut sql = format!(
        "SELECT {} FROM {}",
        coalesced_columns(schema, dialect),
        schema.table
    );

    match filter {
        Filter::All => {}
        Filter::PrimaryKey => {
            sql.push_str(&format!(" WHERE {PRIMARY_KEY} = {}", dialect.placeholder(1)));
        }
        Filter::Predicate(predicate) => {
            sql.push_str(" WHERE ");
            sql.push_str(&translate_placeholders(predicate, dialect, 1));
        }
    }

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnDef;

    fn schema() -> Schema {
        let column = |name: &str, kind, nullable| ColumnDef {
            name: name.to_string(),
            kind,
            nullable,
        };
        Schema {
            type_name: "Widget",
            table: "widgets".to_string(),
            columns: vec![
                column("id", ValueKind::Uuid, false),
                column("label", ValueKind::Text, false),
                column("enabled", ValueKind::Bool, false),
                column("settings", ValueKind::Json(JsonShape::Object), false),
                column("parts", ValueKind::Json(JsonShape::Array), false),
                column("retired_at", ValueKind::Timestamp, true),
            ],
        }
    }

    #[test]
    fn coalesces_every_non_nullable_column() {
        let cols = coalesced_columns(&schema(), Dialect::Postgres);
        assert_eq!(
            cols,
            "COALESCE(id, '00000000-0000-0000-0000-000000000000') AS id, \
             COALESCE(label, '') AS label, \
             COALESCE(enabled, false) AS enabled, \
             COALESCE(settings, '{}') AS settings, \
             COALESCE(parts, '[]') AS parts, \
             retired_at"
        );
    }

    #[test]
    fn sqlite_defaults_use_native_literals() {
        assert_eq!(coalesce_default(ValueKind::Bool, Dialect::Sqlite), "0");
        assert_eq!(coalesce_default(ValueKind::Bytes, Dialect::Sqlite), "X''");
        assert_eq!(coalesce_default(ValueKind::Bytes, Dialect::Mysql), "''");
    }

    #[test]
    fn key_filter_uses_dialect_placeholder() {
        let sql = select_sql(&schema(), Dialect::Postgres, Filter::PrimaryKey, None);
        assert!(sql.ends_with("FROM widgets WHERE id = $1"), "{sql}");
        let sql = select_sql(&schema(), Dialect::Sqlite, Filter::PrimaryKey, None);
        assert!(sql.ends_with("FROM widgets WHERE id = ?"), "{sql}");
    }

    #[test]
    fn predicate_and_limit() {
        let sql = select_sql(
            &schema(),
            Dialect::Postgres,
            Filter::Predicate("label = ? AND enabled = ?"),
            Some(5),
        );
        assert!(
            sql.ends_with("FROM widgets WHERE label = $1 AND enabled = $2 LIMIT 5"),
            "{sql}"
        );

        let sql = select_sql(&schema(), Dialect::Mysql, Filter::All, Some(1));
        assert!(sql.ends_with("FROM widgets LIMIT 1"), "{sql}");
    }
}
