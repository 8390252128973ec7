//! Caller-written SQL that bypasses the compiler.

use crate::error::OrmError;
use crate::handler::DialectHandler;
use crate::model::Target;
use crate::types::SqlValue;

/// A raw statement bound to the handler that will run it.
///
/// ```rust,no_run
/// use tiny_orm::prelude::*;
///
/// # async fn demo(handler: &dyn DialectHandler) -> Result<(), OrmError> {
/// let affected = handler
///     .raw("UPDATE users SET name = ? WHERE name = ?", vec!["bo".into(), "al".into()])
///     .exec()
///     .await?;
/// # let _ = affected;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RawQuery<'h> {
    handler: &'h dyn DialectHandler,
    sql: String,
    args: Vec<SqlValue>,
}

impl<'h> RawQuery<'h> {
    #[must_use]
    pub fn new(handler: &'h dyn DialectHandler, sql: String, args: Vec<SqlValue>) -> Self {
        Self { handler, sql, args }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    /// Execute for effect and return the rows affected.
    ///
    /// # Errors
    /// Returns the backend's execution error.
    pub async fn exec(&self) -> Result<usize, OrmError> {
        self.handler.raw_exec(&self.sql, &self.args).await
    }

    /// Run the query and fill `target` with its rows.
    ///
    /// # Errors
    /// Returns `OrmError::NotFound` when a singular target gets no row, or the execution error.
    pub async fn all(&self, target: &mut dyn Target) -> Result<(), OrmError> {
        self.handler.raw_all(&self.sql, &self.args, target).await
    }
}
