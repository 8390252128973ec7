use std::fmt;

use async_trait::async_trait;
use bb8::Pool;
use tokio::sync::Mutex;

use super::config::{PgManager, connection_string};
use super::params::Params;
use super::query::build_result_set;
use crate::config::DialectConfig;
use crate::error::OrmError;
use crate::handler::DialectHandler;
use crate::results::ResultSet;
use crate::types::{Dialect, SqlValue};

/// The `postgres` dialect: a bb8 pool of tokio-postgres clients.
///
/// Every primitive holds one mutex for its whole prepare/bind/execute/scan cycle, so calls on
/// one handler never interleave.
pub struct PostgresHandler {
    pool: Pool<PgManager>,
    connection_string: String,
    lock: Mutex<()>,
}

impl PostgresHandler {
    /// Open a pool for `cfg` and ping the server once.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigurationError` for incomplete settings and
    /// `OrmError::ConnectionError` when the server cannot be reached.
    pub async fn connect(cfg: &DialectConfig) -> Result<Self, OrmError> {
        let connection_string = connection_string(cfg)?;
        let pg_config: tokio_postgres::Config = connection_string.parse().map_err(|e| {
            OrmError::ConfigurationError(format!("invalid postgres connection string: {e}"))
        })?;
        let pool = PgManager::new(pg_config).build_pool(cfg).await?;

        let handler = Self {
            pool,
            connection_string,
            lock: Mutex::new(()),
        };
        handler
            .ping()
            .await
            .map_err(|e| OrmError::ConnectionError(format!("postgres ping failed: {e}")))?;
        Ok(handler)
    }
}

impl fmt::Debug for PostgresHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresHandler")
            .field("state", &self.pool.state())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DialectHandler for PostgresHandler {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn connection_string(&self) -> &str {
        &self.connection_string
    }

    async fn ping(&self) -> Result<(), OrmError> {
        let _guard = self.lock.lock().await;
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<usize, OrmError> {
        let _guard = self.lock.lock().await;
        let client = self.pool.get().await?;
        let stmt = client.prepare(sql).await?;
        let params = Params::convert(args);
        let rows = client.execute(&stmt, params.as_refs()).await?;
        usize::try_from(rows).map_err(|e| {
            OrmError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
        })
    }

    async fn fetch(&self, sql: &str, args: &[SqlValue]) -> Result<ResultSet, OrmError> {
        let _guard = self.lock.lock().await;
        let client = self.pool.get().await?;
        let stmt = client.prepare(sql).await?;
        let params = Params::convert(args);
        let rows = client.query(&stmt, params.as_refs()).await?;
        build_result_set(&stmt, &rows)
    }
}
