use std::fmt;

use async_trait::async_trait;

use crate::compiler::{Filter, Operation, compile, compile_bulk_delete, select_sql};
use crate::error::OrmError;
use crate::introspect::ModelData;
use crate::model::{PRIMARY_KEY, Record, Shape, Target};
use crate::raw::RawQuery;
use crate::results::ResultSet;
use crate::translation::count_placeholders;
use crate::types::{Dialect, SqlValue};

/// One backend connection and the operations every dialect supports.
///
/// Backends implement the five primitives; the record operations are provided on top of them
/// and only differ per dialect through [`Dialect`]'s placeholder style and coalescing literals.
#[async_trait]
pub trait DialectHandler: Send + Sync + fmt::Debug {
    fn dialect(&self) -> Dialect;

    /// Connection string the handler was opened with.
    fn connection_string(&self) -> &str;

    /// Round-trip a trivial statement to prove the connection is usable.
    async fn ping(&self) -> Result<(), OrmError>;

    /// Run a statement for effect and return the rows affected.
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<usize, OrmError>;

    /// Run a query and collect every row.
    async fn fetch(&self, sql: &str, args: &[SqlValue]) -> Result<ResultSet, OrmError>;

    /// Insert `record`, minting an id when it has none. The id is written back into the
    /// record and returned.
    ///
    /// # Errors
    /// Returns the compile or execution error; nothing is written back on failure.
    async fn create(&self, record: &mut dyn Record) -> Result<SqlValue, OrmError> {
        let data = ModelData::from_record(&*record)?;
        let has_key_column = data.schema.primary_key_index().is_some();
        let query = compile(Operation::Create, data, self.dialect())?;
        tracing::debug!(sql = %query.sql, table = %query.table, args = query.args.len(), "create");

        self.execute(&query.sql, &query.args).await?;

        let id = query.primary_key.unwrap_or(SqlValue::Null);
        if let Some(generated) = query.generated_id
            && has_key_column
        {
            record.assign(PRIMARY_KEY, SqlValue::Uuid(generated))?;
        }
        Ok(id)
    }

    /// Update every set field of `record`, matching on its id.
    ///
    /// # Errors
    /// Returns `OrmError::PreconditionFailed` when the record has no id or nothing besides it.
    async fn update(&self, record: &dyn Record) -> Result<usize, OrmError> {
        let query = compile(
            Operation::Update,
            ModelData::from_record(record)?,
            self.dialect(),
        )?;
        tracing::debug!(sql = %query.sql, table = %query.table, args = query.args.len(), "update");
        self.execute(&query.sql, &query.args).await
    }

    /// Delete by id, or by every set field when there is no id.
    ///
    /// A record with nothing set deletes nothing and returns 0; use
    /// [`bulk_delete`](DialectHandler::bulk_delete) to empty a table.
    ///
    /// # Errors
    /// Returns the execution error.
    async fn delete(&self, record: &dyn Record) -> Result<usize, OrmError> {
        let query = compile(
            Operation::Delete,
            ModelData::from_record(record)?,
            self.dialect(),
        )?;
        if query.is_empty() {
            tracing::warn!(
                table = %query.table,
                "delete called without an id or any set field; nothing deleted"
            );
            return Ok(0);
        }
        tracing::debug!(sql = %query.sql, table = %query.table, args = query.args.len(), "delete");
        self.execute(&query.sql, &query.args).await
    }

    /// Delete every row of the collection's table.
    ///
    /// # Errors
    /// Returns `OrmError::InvalidArgument` for a singular target.
    async fn bulk_delete(&self, target: &dyn Target) -> Result<usize, OrmError> {
        if target.shape() != Shape::Collection {
            return Err(OrmError::InvalidArgument(
                "bulk delete requires a collection target".to_string(),
            ));
        }
        let schema = target.schema()?;
        let query = compile_bulk_delete(&schema.table);
        let deleted = self.execute(&query.sql, &query.args).await?;
        tracing::info!(table = %query.table, rows = deleted, "bulk delete");
        Ok(deleted)
    }

    /// Read by id, or every row into a collection, or the first row into a record.
    ///
    /// # Errors
    /// Returns `OrmError::NotFound` when an id matches nothing or a singular target gets no row.
    async fn find(&self, target: &mut dyn Target, id: Option<SqlValue>) -> Result<(), OrmError> {
        let data = ModelData::from_target(&*target)?;
        let dialect = self.dialect();
        let limit = (data.shape == Shape::Single).then_some(1);

        let rows = match id {
            Some(id) => {
                let sql = select_sql(&data.schema, dialect, Filter::PrimaryKey, limit);
                tracing::debug!(sql = %sql, table = %data.table(), "find by id");
                let rows = self.fetch(&sql, std::slice::from_ref(&id)).await?;
                if rows.is_empty() {
                    return Err(OrmError::NotFound(format!("no rows found for id: {id}")));
                }
                rows
            }
            None => {
                let sql = select_sql(&data.schema, dialect, Filter::All, limit);
                tracing::debug!(sql = %sql, table = %data.table(), "find");
                self.fetch(&sql, &[]).await?
            }
        };

        target.fill(&rows)
    }

    /// Read the rows matching `predicate`, a fragment with `?` placeholders.
    ///
    /// A `limit` of zero or less means no limit; singular targets always read one row.
    ///
    /// # Errors
    /// Returns `OrmError::InvalidArgument` for an empty predicate or a placeholder count that
    /// differs from `args.len()`, and `OrmError::NotFound` when a singular target gets no row.
    async fn find_where(
        &self,
        target: &mut dyn Target,
        predicate: &str,
        limit: i64,
        args: &[SqlValue],
    ) -> Result<(), OrmError> {
        if predicate.trim().is_empty() {
            return Err(OrmError::InvalidArgument(
                "you cannot pass an empty statement".to_string(),
            ));
        }
        let expected = count_placeholders(predicate);
        if expected != args.len() {
            return Err(OrmError::InvalidArgument(format!(
                "statement has {expected} placeholders but {} arguments were given",
                args.len()
            )));
        }

        let data = ModelData::from_target(&*target)?;
        let limit = match data.shape {
            Shape::Single => Some(1),
            Shape::Collection => u64::try_from(limit).ok().filter(|l| *l > 0),
        };
        let sql = select_sql(
            &data.schema,
            self.dialect(),
            Filter::Predicate(predicate),
            limit,
        );
        tracing::debug!(sql = %sql, table = %data.table(), args = args.len(), "where");

        let rows = self.fetch(&sql, args).await?;
        target.fill(&rows)
    }

    /// Run caller-written SQL for effect.
    ///
    /// # Errors
    /// Returns the execution error.
    async fn raw_exec(&self, sql: &str, args: &[SqlValue]) -> Result<usize, OrmError> {
        let affected = self.execute(sql, args).await?;
        tracing::debug!(sql = %sql, rows = affected, "executed raw query");
        Ok(affected)
    }

    /// Run caller-written SQL and materialize its rows into `target`.
    ///
    /// # Errors
    /// Returns `OrmError::NotFound` when a singular target gets no row.
    async fn raw_all(
        &self,
        sql: &str,
        args: &[SqlValue],
        target: &mut dyn Target,
    ) -> Result<(), OrmError> {
        tracing::debug!(sql = %sql, args = args.len(), "raw query");
        let rows = self.fetch(sql, args).await?;
        target.fill(&rows)
    }
}

impl<'a> dyn DialectHandler + 'a {
    /// Prepare a raw statement for [`RawQuery::exec`] or [`RawQuery::all`].
    pub fn raw(&self, sql: impl Into<String>, args: Vec<SqlValue>) -> RawQuery<'_> {
        RawQuery::new(self, sql.into(), args)
    }
}
