use std::fmt;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Pool, Row};
use tokio::sync::Mutex;

use super::config::build_pool;
use super::params::Params;
use super::query::build_result_set;
use crate::config::DialectConfig;
use crate::error::OrmError;
use crate::handler::DialectHandler;
use crate::results::ResultSet;
use crate::types::{Dialect, SqlValue};

/// The `mysql` dialect: a mysql_async pool behind one mutex.
pub struct MysqlHandler {
    pool: Pool,
    connection_string: String,
    lock: Mutex<()>,
}

impl MysqlHandler {
    /// Create the pool for `cfg` and ping the server once.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` for incomplete settings and
    /// `OrmError::ConnectionError` when the server cannot be reached.
    pub async fn connect(cfg: &DialectConfig) -> Result<Self, OrmError> {
        let (pool, connection_string) = build_pool(cfg)?;
        let handler = Self {
            pool,
            connection_string,
            lock: Mutex::new(()),
        };
        handler
            .ping()
            .await
            .map_err(|e| OrmError::ConnectionError(format!("mysql ping failed: {e}")))?;
        Ok(handler)
    }
}

impl fmt::Debug for MysqlHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl DialectHandler for MysqlHandler {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn ping(&self) -> Result<(), OrmError> {
        let _guard = self.lock.lock().await;
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop("SELECT 1").await?;
        Ok(())
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<usize, OrmError> {
        let _guard = self.lock.lock().await;
        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(sql, Params::convert(args).into_params())
            .await?;
        usize::try_from(conn.affected_rows()).map_err(|e| {
            OrmError::ExecutionError(format!("mysql affected rows conversion error: {e}"))
        })
    }

    async fn fetch(&self, sql: &str, args: &[SqlValue]) -> Result<ResultSet, OrmError> {
        let _guard = self.lock.lock().await;
        let mut conn = self.pool.get_conn().await?;
        let mut result = conn
            .exec_iter(sql, Params::convert(args).into_params())
            .await?;
        let column_names = result
            .columns()
            .map(|columns| {
                columns
                    .iter()
                    .map(|column| column.name_str().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        let rows: Vec<Row> = result.collect().await?;
        Ok(build_result_set(column_names, &rows))
    }
}
